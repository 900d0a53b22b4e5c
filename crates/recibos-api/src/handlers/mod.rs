pub mod imports;
pub mod signing;
