//! Postgres repositories backing the recibos services: payroll lines,
//! signatures, legajos and portal users.

pub mod db;

pub use db::{LegajoRepository, PayrollRepository, SignatureRepository, UserRepository};
