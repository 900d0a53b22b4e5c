//! HTTP surface of the recibos payroll portal: import submission and
//! progress polling, period signing, and the employee period listing.

pub mod api_doc;
pub mod constants;
pub mod error;
pub mod handlers;
pub mod normalizer;
pub mod setup;
pub mod state;
pub mod telemetry;
