//! Row normalization for the fixed upload template.
//!
//! The portal accepts one spreadsheet layout:
//! `legajo_id; concept; gross; deductions; net` (header row skipped at decode
//! time). Every problem with a row is collected, so the user sees all of them
//! at once instead of fixing one per upload attempt.

use rust_decimal::Decimal;
use std::str::FromStr;
use uuid::Uuid;

use recibos_core::models::{PayrollLineRecord, PeriodMeta, RawRow};
use recibos_import::{Normalized, RowNormalizer, RowRejection};

const EXPECTED_COLUMNS: usize = 5;

/// Normalizer for the fixed five-column template. Period, payment date and
/// liquidation type come from the submission metadata, not the rows.
#[derive(Debug, Default, Clone)]
pub struct TemplateRowNormalizer;

impl TemplateRowNormalizer {
    pub fn new() -> Self {
        Self
    }
}

/// Parses an amount in either plain decimal form (`1234.56`) or the local
/// convention with thousands dots and a decimal comma (`1.234,56`).
fn parse_amount(raw: &str, field: &str) -> Result<Decimal, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(format!("missing {}", field));
    }
    let normalized = if trimmed.contains(',') {
        trimmed.replace('.', "").replace(',', ".")
    } else {
        trimmed.to_string()
    };
    Decimal::from_str(&normalized).map_err(|_| format!("unparseable {}: '{}'", field, trimmed))
}

impl RowNormalizer for TemplateRowNormalizer {
    fn normalize(&self, meta: &PeriodMeta, row: &RawRow) -> Result<Normalized, RowRejection> {
        if row.cells.len() != EXPECTED_COLUMNS {
            return Err(RowRejection::single(format!(
                "expected {} columns, found {}",
                EXPECTED_COLUMNS,
                row.cells.len()
            )));
        }

        let mut reasons = Vec::new();
        let mut warnings = Vec::new();

        let legajo_raw = row.cells[0].trim();
        let legajo_id = if legajo_raw.is_empty() {
            reasons.push("missing legajo identifier".to_string());
            None
        } else {
            match Uuid::from_str(legajo_raw) {
                Ok(id) => Some(id),
                Err(_) => {
                    reasons.push(format!("invalid legajo identifier: '{}'", legajo_raw));
                    None
                }
            }
        };

        let mut concept = row.cells[1].trim().to_string();
        if concept.is_empty() {
            concept = meta.liquidation_type.to_string();
            warnings.push("concept missing, defaulted to the liquidation type".to_string());
        }

        let mut amount = |cell: &str, field: &str| match parse_amount(cell, field) {
            Ok(value) => Some(value),
            Err(reason) => {
                reasons.push(reason);
                None
            }
        };
        let gross = amount(&row.cells[2], "gross amount");
        let deductions = amount(&row.cells[3], "deductions amount");
        let net = amount(&row.cells[4], "net amount");

        let (legajo_id, gross, deductions, net) =
            match (legajo_id, gross, deductions, net) {
                (Some(l), Some(g), Some(d), Some(n)) if reasons.is_empty() => (l, g, d, n),
                _ => return Err(RowRejection::new(reasons)),
            };

        if gross - deductions != net {
            warnings.push(format!(
                "net {} does not equal gross {} minus deductions {}",
                net, gross, deductions
            ));
        }

        Ok(Normalized {
            record: PayrollLineRecord {
                legajo_id,
                period: meta.period,
                liquidation_type: meta.liquidation_type,
                payment_date: meta.payment_date,
                concept,
                gross,
                deductions,
                net,
            },
            warnings,
        })
    }
}
