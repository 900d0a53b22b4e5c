//! Signing services for the recibos payroll portal: the period release gate,
//! the signature ledger, and the accessible-period listing, plus the
//! credential and storage seams they depend on.

pub mod access;
pub mod credential;
pub mod gate;
pub mod ledger;
pub mod stores;
pub mod testing;

pub use access::PeriodAccessService;
pub use credential::{BcryptCredentialChecker, CredentialChecker, PasswordHashSource};
pub use gate::{evaluate, GroupSigningState};
pub use ledger::SignatureLedger;
pub use stores::{LegajoDirectory, SignatureStore};
