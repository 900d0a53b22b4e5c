pub mod legajo;
pub mod payroll;
pub mod signature;
pub mod user;

pub use legajo::LegajoRepository;
pub use payroll::PayrollRepository;
pub use signature::SignatureRepository;
pub use user::UserRepository;
