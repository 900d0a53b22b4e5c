//! In-memory fakes for the import engine's seams.
//!
//! Used by this crate's unit tests and by downstream integration tests that
//! drive the engine without a database. Failure injection is deliberate:
//! chunk rejection, storage outage, and a pause gate for cancellation tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use tokio::sync::{Notify, RwLock};
use uuid::Uuid;

use recibos_core::models::{
    ImportJob, LiquidationType, PayrollLineRecord, Period, PeriodMeta, RawRow,
};

use crate::normalizer::{Normalized, RowNormalizer, RowRejection};
use crate::store::{PayrollStore, StoreError};

/// Pause coordination handle returned by [`InMemoryPayrollStore::pause_after`].
pub struct PauseGate {
    /// Notified once the configured commit has landed.
    pub committed: Notify,
    /// The store waits on this before returning from the paused commit.
    pub resume: Notify,
}

#[derive(Default)]
struct StoreFailures {
    /// Zero-based save attempt that returns `Rejected`.
    reject_attempt: Option<(usize, String)>,
    /// All save attempts at or after this index return `Unavailable`.
    unavailable_from: Option<usize>,
}

/// In-memory [`PayrollStore`] keyed by job id.
pub struct InMemoryPayrollStore {
    rows: Mutex<HashMap<Uuid, Vec<PayrollLineRecord>>>,
    attempts: AtomicUsize,
    failures: Mutex<StoreFailures>,
    pause: Mutex<Option<(usize, Arc<PauseGate>)>>,
    progress_probe: Mutex<Option<(Arc<RwLock<ImportJob>>, Arc<Mutex<Vec<usize>>>)>>,
}

impl InMemoryPayrollStore {
    pub fn new() -> Self {
        Self {
            rows: Mutex::new(HashMap::new()),
            attempts: AtomicUsize::new(0),
            failures: Mutex::new(StoreFailures::default()),
            pause: Mutex::new(None),
            progress_probe: Mutex::new(None),
        }
    }

    pub fn count_for_job(&self, job_id: Uuid) -> usize {
        self.rows
            .lock()
            .unwrap()
            .get(&job_id)
            .map(|v| v.len())
            .unwrap_or(0)
    }

    pub fn records_for_job(&self, job_id: Uuid) -> Vec<PayrollLineRecord> {
        self.rows
            .lock()
            .unwrap()
            .get(&job_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn save_attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    /// The `nth` (zero-based) save attempt fails with `Rejected`.
    pub fn reject_chunk(&self, nth: usize, message: &str) {
        self.failures.lock().unwrap().reject_attempt = Some((nth, message.to_string()));
    }

    /// Save attempts at index >= `from` fail with `Unavailable`.
    pub fn unavailable_after(&self, from: usize) {
        self.failures.lock().unwrap().unavailable_from = Some(from);
    }

    /// After `after` commits, notify `committed` and block until `resume`.
    pub fn pause_after(&self, after: usize) -> Arc<PauseGate> {
        let gate = Arc::new(PauseGate {
            committed: Notify::new(),
            resume: Notify::new(),
        });
        *self.pause.lock().unwrap() = Some((after, gate.clone()));
        gate
    }

    /// Record the job's `processed` counter at every save attempt, to assert
    /// monotonic progress from a concurrent observer's point of view.
    pub fn record_progress_of(&self, job: Arc<RwLock<ImportJob>>) -> Arc<Mutex<Vec<usize>>> {
        let observed = Arc::new(Mutex::new(Vec::new()));
        *self.progress_probe.lock().unwrap() = Some((job, observed.clone()));
        observed
    }
}

impl Default for InMemoryPayrollStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PayrollStore for InMemoryPayrollStore {
    async fn save_chunk(
        &self,
        job_id: Uuid,
        records: &[PayrollLineRecord],
    ) -> Result<(), StoreError> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);

        let probe = self.progress_probe.lock().unwrap().clone();
        if let Some((job, observed)) = probe {
            let processed = job.read().await.processed;
            observed.lock().unwrap().push(processed);
        }

        {
            let failures = self.failures.lock().unwrap();
            if let Some(from) = failures.unavailable_from {
                if attempt >= from {
                    return Err(StoreError::Unavailable("connection refused".to_string()));
                }
            }
            if let Some((nth, ref msg)) = failures.reject_attempt {
                if attempt == nth {
                    return Err(StoreError::Rejected(msg.clone()));
                }
            }
        }

        self.rows
            .lock()
            .unwrap()
            .entry(job_id)
            .or_default()
            .extend_from_slice(records);

        let gate = {
            let pause = self.pause.lock().unwrap();
            match pause.as_ref() {
                Some((after, gate)) if attempt + 1 == *after => Some(gate.clone()),
                _ => None,
            }
        };
        if let Some(gate) = gate {
            gate.committed.notify_one();
            gate.resume.notified().await;
        }

        Ok(())
    }

    async fn delete_all_for_job(&self, job_id: Uuid) -> Result<(), StoreError> {
        self.rows.lock().unwrap().remove(&job_id);
        Ok(())
    }
}

/// Deterministic normalizer: row `i` maps to legajo `Uuid::from_u128(i)`,
/// with per-row rejection, aliasing, and warning knobs.
#[derive(Default)]
pub struct FakeNormalizer {
    rejections: HashMap<usize, Vec<String>>,
    aliases: HashMap<usize, usize>,
    warnings: HashMap<usize, String>,
}

impl FakeNormalizer {
    pub fn rejecting(mut self, row_index: usize, reason: &str) -> Self {
        self.rejections
            .insert(row_index, vec![reason.to_string()]);
        self
    }

    pub fn rejecting_with(mut self, row_index: usize, reasons: Vec<String>) -> Self {
        self.rejections.insert(row_index, reasons);
        self
    }

    /// Row `row_index` normalizes to the same legajo as row `target`.
    pub fn aliasing(mut self, row_index: usize, target: usize) -> Self {
        self.aliases.insert(row_index, target);
        self
    }

    pub fn warning_on(mut self, row_index: usize, message: &str) -> Self {
        self.warnings.insert(row_index, message.to_string());
        self
    }
}

impl RowNormalizer for FakeNormalizer {
    fn normalize(&self, meta: &PeriodMeta, row: &RawRow) -> Result<Normalized, RowRejection> {
        if let Some(reasons) = self.rejections.get(&row.index) {
            return Err(RowRejection::new(reasons.clone()));
        }
        let identity = self.aliases.get(&row.index).copied().unwrap_or(row.index);
        let record = PayrollLineRecord {
            legajo_id: Uuid::from_u128(identity as u128),
            period: meta.period,
            liquidation_type: meta.liquidation_type,
            payment_date: meta.payment_date,
            concept: "sueldo".to_string(),
            gross: Decimal::from(100),
            deductions: Decimal::from(20),
            net: Decimal::from(80),
        };
        let warnings = self
            .warnings
            .get(&row.index)
            .map(|w| vec![w.clone()])
            .unwrap_or_default();
        Ok(Normalized { record, warnings })
    }
}

/// Period metadata used across engine tests.
pub fn test_meta() -> PeriodMeta {
    PeriodMeta {
        period: Period::new(4, 2024).expect("valid period"),
        payment_date: NaiveDate::from_ymd_opt(2024, 5, 3).expect("valid date"),
        liquidation_type: LiquidationType::Monthly,
    }
}

/// `count` raw rows numbered 1..=count.
pub fn rows_of(count: usize) -> Vec<RawRow> {
    (1..=count)
        .map(|i| RawRow::new(i, vec![format!("legajo-{}", i), "120000".to_string()]))
        .collect()
}
