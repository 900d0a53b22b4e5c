//! Row normalizer seam.
//!
//! Column-name heuristics and locale-specific date/number parsing live behind
//! this trait, outside the import engine. The engine only cares whether a raw
//! row became a payroll line or was rejected with reasons.

use recibos_core::models::{PayrollLineRecord, PeriodMeta, RawRow};

/// A successfully normalized row. Warnings are non-fatal observations the
/// normalizer wants surfaced to the user (e.g. a defaulted payment date).
#[derive(Debug, Clone)]
pub struct Normalized {
    pub record: PayrollLineRecord,
    pub warnings: Vec<String>,
}

/// A rejected row with every reason collected, not just the first.
#[derive(Debug, Clone)]
pub struct RowRejection {
    pub reasons: Vec<String>,
}

impl RowRejection {
    pub fn new(reasons: Vec<String>) -> Self {
        Self { reasons }
    }

    pub fn single(reason: impl Into<String>) -> Self {
        Self {
            reasons: vec![reason.into()],
        }
    }
}

/// Turns one raw spreadsheet row into a payroll line or rejects it.
/// Implementations must treat each row independently.
pub trait RowNormalizer: Send + Sync {
    fn normalize(&self, meta: &PeriodMeta, row: &RawRow) -> Result<Normalized, RowRejection>;
}
