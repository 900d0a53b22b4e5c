use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

use super::period::{LiquidationType, Period};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ImportJobStatus {
    Pending,
    Running,
    Cancelled,
    Completed,
}

impl Display for ImportJobStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            ImportJobStatus::Pending => write!(f, "pending"),
            ImportJobStatus::Running => write!(f, "running"),
            ImportJobStatus::Cancelled => write!(f, "cancelled"),
            ImportJobStatus::Completed => write!(f, "completed"),
        }
    }
}

impl FromStr for ImportJobStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ImportJobStatus::Pending),
            "running" => Ok(ImportJobStatus::Running),
            "cancelled" => Ok(ImportJobStatus::Cancelled),
            "completed" => Ok(ImportJobStatus::Completed),
            _ => Err(anyhow::anyhow!("Invalid import job status: {}", s)),
        }
    }
}

/// One rejected spreadsheet row: 1-based position, a short preview of the raw
/// content, and every reason the row was rejected.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct RowError {
    pub row_index: usize,
    pub raw_descriptor: String,
    pub reasons: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct RowWarning {
    pub row_index: usize,
    pub message: String,
}

/// Period metadata attached to an import submission.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
pub struct PeriodMeta {
    pub period: Period,
    pub payment_date: NaiveDate,
    pub liquidation_type: LiquidationType,
}

/// One bulk-import execution. Mutated only by the owning processor loop and
/// the cancel operation; read by progress pollers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportJob {
    pub id: Uuid,
    pub status: ImportJobStatus,
    pub meta: PeriodMeta,
    pub total: usize,
    pub processed: usize,
    pub errors: Vec<RowError>,
    pub warnings: Vec<RowWarning>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub cancel_requested: bool,
    pub fatal_error: Option<String>,
}

impl ImportJob {
    pub fn new(meta: PeriodMeta, total: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            status: ImportJobStatus::Pending,
            meta,
            total,
            processed: 0,
            errors: Vec::new(),
            warnings: Vec::new(),
            started_at: Utc::now(),
            finished_at: None,
            cancel_requested: false,
            fatal_error: None,
        }
    }

    pub fn start(&mut self) {
        if self.status == ImportJobStatus::Pending {
            self.status = ImportJobStatus::Running;
        }
    }

    /// Record that `count` rows finished processing (success or failure).
    /// `processed` never exceeds `total` and never decreases.
    pub fn record_processed(&mut self, count: usize) {
        self.processed = (self.processed + count).min(self.total);
    }

    pub fn push_error(&mut self, error: RowError) {
        self.errors.push(error);
    }

    pub fn push_warning(&mut self, warning: RowWarning) {
        self.warnings.push(warning);
    }

    /// Request cooperative cancellation. Only effective while running; returns
    /// whether the flag was set.
    pub fn request_cancel(&mut self) -> bool {
        if self.status == ImportJobStatus::Running {
            self.cancel_requested = true;
            true
        } else {
            false
        }
    }

    /// The processor observed the cancel flag at a chunk boundary.
    pub fn mark_cancelled(&mut self) {
        self.status = ImportJobStatus::Cancelled;
    }

    /// Terminal transition. `finished_at` is set exactly once.
    pub fn finish(&mut self) {
        if self.finished_at.is_none() {
            self.finished_at = Some(Utc::now());
        }
        self.status = ImportJobStatus::Completed;
    }

    /// Stop the job immediately with a single fatal error and no further work.
    pub fn fail_fatal(&mut self, message: impl Into<String>) {
        self.fatal_error = Some(message.into());
        self.finish();
    }

    pub fn is_finished(&self) -> bool {
        self.status == ImportJobStatus::Completed
    }

    pub fn was_cancelled(&self) -> bool {
        self.cancel_requested
            && matches!(
                self.status,
                ImportJobStatus::Cancelled | ImportJobStatus::Completed
            )
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            job_id: self.id,
            processed: self.processed,
            total: self.total,
            errors: self.errors.clone(),
            warnings: self.warnings.clone(),
            finished: self.is_finished(),
            cancelled: self.was_cancelled(),
            fatal_error: self.fatal_error.clone(),
        }
    }
}

/// Side-effect-free progress view, polled by clients until `finished`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProgressSnapshot {
    pub job_id: Uuid,
    pub processed: usize,
    pub total: usize,
    pub errors: Vec<RowError>,
    pub warnings: Vec<RowWarning>,
    pub finished: bool,
    pub cancelled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fatal_error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta() -> PeriodMeta {
        PeriodMeta {
            period: Period::new(4, 2024).unwrap(),
            payment_date: NaiveDate::from_ymd_opt(2024, 5, 3).unwrap(),
            liquidation_type: LiquidationType::Monthly,
        }
    }

    #[test]
    fn test_status_display_round_trip() {
        for s in ["pending", "running", "cancelled", "completed"] {
            assert_eq!(s.parse::<ImportJobStatus>().unwrap().to_string(), s);
        }
        assert!("queued".parse::<ImportJobStatus>().is_err());
    }

    #[test]
    fn test_new_job_is_pending() {
        let job = ImportJob::new(meta(), 30);
        assert_eq!(job.status, ImportJobStatus::Pending);
        assert_eq!(job.total, 30);
        assert_eq!(job.processed, 0);
        assert!(!job.cancel_requested);
        assert!(job.finished_at.is_none());
    }

    #[test]
    fn test_processed_is_clamped_to_total() {
        let mut job = ImportJob::new(meta(), 12);
        job.start();
        job.record_processed(10);
        assert_eq!(job.processed, 10);
        job.record_processed(10);
        assert_eq!(job.processed, 12);
    }

    #[test]
    fn test_cancel_only_while_running() {
        let mut job = ImportJob::new(meta(), 5);
        assert!(!job.request_cancel());
        job.start();
        assert!(job.request_cancel());
        assert!(job.cancel_requested);

        let mut done = ImportJob::new(meta(), 5);
        done.start();
        done.finish();
        assert!(!done.request_cancel());
    }

    #[test]
    fn test_finished_at_set_exactly_once() {
        let mut job = ImportJob::new(meta(), 1);
        job.start();
        job.finish();
        let first = job.finished_at;
        assert!(first.is_some());
        job.finish();
        assert_eq!(job.finished_at, first);
    }

    #[test]
    fn test_cancelled_snapshot_reports_cancelled_and_finished() {
        let mut job = ImportJob::new(meta(), 30);
        job.start();
        job.request_cancel();
        job.record_processed(10);
        job.mark_cancelled();
        job.finish();

        let snap = job.snapshot();
        assert!(snap.finished);
        assert!(snap.cancelled);
        assert_eq!(snap.processed, 10);
    }

    #[test]
    fn test_clean_completion_is_not_cancelled() {
        let mut job = ImportJob::new(meta(), 2);
        job.start();
        job.record_processed(2);
        job.finish();

        let snap = job.snapshot();
        assert!(snap.finished);
        assert!(!snap.cancelled);
        assert!(snap.fatal_error.is_none());
    }

    #[test]
    fn test_fatal_failure_finishes_with_error() {
        let mut job = ImportJob::new(meta(), 0);
        job.start();
        job.fail_fatal("file unreadable");
        let snap = job.snapshot();
        assert!(snap.finished);
        assert_eq!(snap.total, 0);
        assert_eq!(snap.fatal_error.as_deref(), Some("file unreadable"));
    }

    #[test]
    fn test_errors_preserve_insertion_order() {
        let mut job = ImportJob::new(meta(), 3);
        job.start();
        job.push_error(RowError {
            row_index: 1,
            raw_descriptor: "a".into(),
            reasons: vec!["missing identifier".into()],
        });
        job.push_error(RowError {
            row_index: 3,
            raw_descriptor: "c".into(),
            reasons: vec!["unparseable date".into()],
        });
        assert_eq!(job.errors[0].row_index, 1);
        assert_eq!(job.errors[1].row_index, 3);
    }
}
