use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use utoipa::ToSchema;

/// A payroll period: one calendar month. Ordered by `(year, month)` ascending,
/// which is the order the release gate walks.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord, ToSchema,
)]
pub struct Period {
    pub year: i32,
    pub month: u32,
}

impl Period {
    pub fn new(month: u32, year: i32) -> Result<Self, String> {
        if !(1..=12).contains(&month) {
            return Err(format!("invalid month: {}", month));
        }
        Ok(Self { year, month })
    }
}

impl Display for Period {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{:02}/{:04}", self.month, self.year)
    }
}

impl FromStr for Period {
    type Err = anyhow::Error;

    /// Parses the user-facing `MM/YYYY` form.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (month, year) = s
            .split_once('/')
            .ok_or_else(|| anyhow::anyhow!("Invalid period format: {}", s))?;
        let month: u32 = month
            .parse()
            .map_err(|_| anyhow::anyhow!("Invalid period month: {}", s))?;
        let year: i32 = year
            .parse()
            .map_err(|_| anyhow::anyhow!("Invalid period year: {}", s))?;
        Period::new(month, year).map_err(|e| anyhow::anyhow!("Invalid period: {}", e))
    }
}

/// The kind of liquidation a payroll document settles. Small closed set;
/// ties at the same `(year, month)` are gated together by the release gate.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum LiquidationType {
    /// Ordinary monthly salary.
    Monthly,
    /// Supplementary annual bonus (SAC).
    Aguinaldo,
    Severance,
    ProbationEnd,
    Resignation,
}

impl Display for LiquidationType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            LiquidationType::Monthly => write!(f, "monthly"),
            LiquidationType::Aguinaldo => write!(f, "aguinaldo"),
            LiquidationType::Severance => write!(f, "severance"),
            LiquidationType::ProbationEnd => write!(f, "probation_end"),
            LiquidationType::Resignation => write!(f, "resignation"),
        }
    }
}

impl FromStr for LiquidationType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "monthly" => Ok(LiquidationType::Monthly),
            "aguinaldo" => Ok(LiquidationType::Aguinaldo),
            "severance" => Ok(LiquidationType::Severance),
            "probation_end" => Ok(LiquidationType::ProbationEnd),
            "resignation" => Ok(LiquidationType::Resignation),
            _ => Err(anyhow::anyhow!("Invalid liquidation type: {}", s)),
        }
    }
}

/// The unit a user signs: one period plus liquidation type.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
pub struct PeriodGroupKey {
    pub period: Period,
    pub liquidation_type: LiquidationType,
}

impl PeriodGroupKey {
    pub fn new(period: Period, liquidation_type: LiquidationType) -> Self {
        Self {
            period,
            liquidation_type,
        }
    }

    /// Gating rank. Keys sharing `(year, month)` share a rank regardless of
    /// liquidation type.
    pub fn rank(&self) -> (i32, u32) {
        (self.period.year, self.period.month)
    }
}

impl Display for PeriodGroupKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{} ({})", self.period, self.liquidation_type)
    }
}
