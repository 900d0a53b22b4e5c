use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::period::{LiquidationType, Period};

/// One raw spreadsheet row, as decoded from the uploaded file. `index` is the
/// 1-based position in the file, used in user-facing error reporting.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RawRow {
    pub index: usize,
    pub cells: Vec<String>,
}

impl RawRow {
    pub fn new(index: usize, cells: Vec<String>) -> Self {
        Self { index, cells }
    }

    /// Short preview of the row content for error entries.
    pub fn descriptor(&self) -> String {
        const MAX_LEN: usize = 80;
        let joined = self.cells.join(";");
        if joined.len() > MAX_LEN {
            let mut end = MAX_LEN;
            while !joined.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}…", &joined[..end])
        } else {
            joined
        }
    }
}

/// A normalized payroll line, immutable once produced by the row normalizer.
/// Persisted as-is, tagged with the import job that produced it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct PayrollLineRecord {
    pub legajo_id: Uuid,
    pub period: Period,
    pub liquidation_type: LiquidationType,
    pub payment_date: NaiveDate,
    pub concept: String,
    pub gross: Decimal,
    pub deductions: Decimal,
    pub net: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_joins_cells() {
        let row = RawRow::new(3, vec!["1234".into(), "Pérez".into(), "120000".into()]);
        assert_eq!(row.descriptor(), "1234;Pérez;120000");
    }

    #[test]
    fn test_descriptor_truncates_long_rows() {
        let row = RawRow::new(1, vec!["x".repeat(200)]);
        let d = row.descriptor();
        assert!(d.chars().count() <= 81);
        assert!(d.ends_with('…'));
    }

    #[test]
    fn test_descriptor_truncation_respects_char_boundaries() {
        let row = RawRow::new(1, vec!["á".repeat(100)]);
        let d = row.descriptor();
        assert!(d.ends_with('…'));
    }
}
