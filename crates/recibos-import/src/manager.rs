//! Single-slot import job manager.
//!
//! The portal keeps exactly one "current" import job visible to all pollers.
//! Submitting while a job runs is rejected with a conflict, never queued; a
//! finished job is superseded by the next submit. The manager owns job
//! creation and the spawned processor task; progress reads and cancellation
//! go through the same slot.

use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use recibos_core::models::{ImportJob, PeriodMeta, ProgressSnapshot, RawRow};
use recibos_core::AppError;

use crate::batch::{BatchProcessor, DEFAULT_CHUNK_SIZE};
use crate::normalizer::RowNormalizer;
use crate::store::PayrollStore;

#[derive(Clone)]
pub struct ImportJobManagerConfig {
    pub chunk_size: usize,
}

impl Default for ImportJobManagerConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

pub struct ImportJobManager {
    store: Arc<dyn PayrollStore>,
    normalizer: Arc<dyn RowNormalizer>,
    config: ImportJobManagerConfig,
    current: Mutex<Option<Arc<RwLock<ImportJob>>>>,
}

impl ImportJobManager {
    pub fn new(
        store: Arc<dyn PayrollStore>,
        normalizer: Arc<dyn RowNormalizer>,
        config: ImportJobManagerConfig,
    ) -> Self {
        Self {
            store,
            normalizer,
            config,
            current: Mutex::new(None),
        }
    }

    /// Submit a new import. The row count is known up front (the file has
    /// already been decoded); processing continues on a spawned task and is
    /// observed through [`progress`](Self::progress).
    #[tracing::instrument(skip(self, rows), fields(rows = rows.len()))]
    pub async fn submit(&self, meta: PeriodMeta, rows: Vec<RawRow>) -> Result<Uuid, AppError> {
        let mut slot = self.current.lock().await;
        self.ensure_slot_free(&slot).await?;

        let mut job = ImportJob::new(meta, rows.len());
        // Running before the slot is released so a concurrent submit sees the
        // conflict and cancel has something to flag.
        job.start();
        let job_id = job.id;
        let handle = Arc::new(RwLock::new(job));
        *slot = Some(handle.clone());
        drop(slot);

        tracing::info!(job_id = %job_id, total = rows.len(), "Import job accepted");

        let processor = BatchProcessor::new(
            self.store.clone(),
            self.normalizer.clone(),
            self.config.chunk_size,
        );
        tokio::spawn(async move {
            processor.run(handle, meta, rows).await;
        });

        Ok(job_id)
    }

    /// Record an unreadable or undecodable upload as a fast-finished job:
    /// `total = 0`, one fatal error, nothing persisted. The slot rules are
    /// the same as for a normal submit.
    #[tracing::instrument(skip(self))]
    pub async fn submit_unreadable(
        &self,
        meta: PeriodMeta,
        message: String,
    ) -> Result<Uuid, AppError> {
        let mut slot = self.current.lock().await;
        self.ensure_slot_free(&slot).await?;

        let mut job = ImportJob::new(meta, 0);
        job.start();
        job.fail_fatal(message);
        let job_id = job.id;
        *slot = Some(Arc::new(RwLock::new(job)));

        tracing::warn!(job_id = %job_id, "Import rejected as unreadable; job finished immediately");
        Ok(job_id)
    }

    /// Progress of the single current job. `None` until the first submit.
    pub async fn progress(&self) -> Option<ProgressSnapshot> {
        let slot = self.current.lock().await;
        match slot.as_ref() {
            Some(job) => Some(job.read().await.snapshot()),
            None => None,
        }
    }

    /// Progress of a specific job id. A superseded id is gone: only one
    /// job's state is retained at a time.
    pub async fn progress_for(&self, job_id: Uuid) -> Result<ProgressSnapshot, AppError> {
        match self.progress().await {
            Some(snapshot) if snapshot.job_id == job_id => Ok(snapshot),
            _ => Err(AppError::NotFound(format!(
                "import job {} is not the current job",
                job_id
            ))),
        }
    }

    /// Request cancellation of the current job. Returns whether a running job
    /// accepted the flag; calling with no active job is a no-op.
    #[tracing::instrument(skip(self))]
    pub async fn cancel(&self) -> bool {
        let slot = self.current.lock().await;
        match slot.as_ref() {
            Some(job) => {
                let accepted = job.write().await.request_cancel();
                if accepted {
                    let job_id = job.read().await.id;
                    tracing::info!(job_id = %job_id, "Cancellation requested");
                }
                accepted
            }
            None => false,
        }
    }

    async fn ensure_slot_free(
        &self,
        slot: &Option<Arc<RwLock<ImportJob>>>,
    ) -> Result<(), AppError> {
        if let Some(job) = slot.as_ref() {
            if !job.read().await.is_finished() {
                return Err(AppError::Conflict(
                    "an import job is already running".to_string(),
                ));
            }
        }
        Ok(())
    }
}
