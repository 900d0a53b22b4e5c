pub mod import_job;
pub mod legajo;
pub mod payroll_line;
pub mod period;
pub mod signature;

pub use import_job::{
    ImportJob, ImportJobStatus, PeriodMeta, ProgressSnapshot, RowError, RowWarning,
};
pub use legajo::Legajo;
pub use payroll_line::{PayrollLineRecord, RawRow};
pub use period::{LiquidationType, Period, PeriodGroupKey};
pub use signature::{PeriodGroupAccess, Signature};
