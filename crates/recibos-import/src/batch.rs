//! Chunked batch processor.
//!
//! Consumes raw rows in file order, fixed-size chunks. Each chunk is
//! normalized row by row (one bad row never blocks its chunk-mates), the
//! valid records are persisted as one unit, and the job's counters are
//! updated before the next chunk starts. Cancellation is cooperative and
//! observed only at chunk boundaries.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::RwLock;
use uuid::Uuid;

use recibos_core::models::{ImportJob, PeriodMeta, RawRow, RowError, RowWarning};

use crate::normalizer::RowNormalizer;
use crate::store::{PayrollStore, StoreError};

pub const DEFAULT_CHUNK_SIZE: usize = 10;

/// A normalized row waiting for its chunk's persistence attempt, keeping the
/// original position and descriptor for error reporting.
struct PendingRow {
    index: usize,
    descriptor: String,
    record: recibos_core::models::PayrollLineRecord,
}

pub struct BatchProcessor {
    store: Arc<dyn PayrollStore>,
    normalizer: Arc<dyn RowNormalizer>,
    chunk_size: usize,
}

impl BatchProcessor {
    pub fn new(
        store: Arc<dyn PayrollStore>,
        normalizer: Arc<dyn RowNormalizer>,
        chunk_size: usize,
    ) -> Self {
        Self {
            store,
            normalizer,
            chunk_size: chunk_size.max(1),
        }
    }

    /// Drive the job to its terminal state. Chunk n+1 never starts before
    /// chunk n's outcome is recorded in the job's counters.
    #[tracing::instrument(skip(self, job, rows), fields(total = rows.len()))]
    pub async fn run(&self, job: Arc<RwLock<ImportJob>>, meta: PeriodMeta, rows: Vec<RawRow>) {
        let job_id = {
            let mut j = job.write().await;
            j.start();
            j.id
        };

        tracing::info!(job_id = %job_id, rows = rows.len(), chunk_size = self.chunk_size, "Import job started");

        // Identifiers already committed within this job; a repeat is a
        // row-level error, not an abort.
        let mut seen_legajos: HashSet<Uuid> = HashSet::new();

        for chunk in rows.chunks(self.chunk_size) {
            if job.read().await.cancel_requested {
                self.rollback(&job, job_id).await;
                return;
            }

            let (pending, mut errors, warnings) = self.normalize_chunk(&meta, chunk, &mut seen_legajos);

            if !pending.is_empty() {
                let records: Vec<_> = pending.iter().map(|p| p.record.clone()).collect();
                match self.store.save_chunk(job_id, &records).await {
                    Ok(()) => {}
                    Err(StoreError::Rejected(msg)) => {
                        tracing::warn!(job_id = %job_id, error = %msg, "Chunk persistence rejected, degrading to row errors");
                        for p in &pending {
                            errors.push(RowError {
                                row_index: p.index,
                                raw_descriptor: p.descriptor.clone(),
                                reasons: vec![format!("persistence failed: {}", msg)],
                            });
                        }
                    }
                    Err(StoreError::Unavailable(msg)) => {
                        tracing::error!(job_id = %job_id, error = %msg, "Storage unavailable, aborting import job");
                        let mut j = job.write().await;
                        errors.sort_by_key(|e| e.row_index);
                        for e in errors {
                            j.push_error(e);
                        }
                        for w in warnings {
                            j.push_warning(w);
                        }
                        j.record_processed(chunk.len());
                        j.fail_fatal(format!("storage unavailable: {}", msg));
                        return;
                    }
                }
            }

            {
                let mut j = job.write().await;
                errors.sort_by_key(|e| e.row_index);
                for e in errors {
                    j.push_error(e);
                }
                for w in warnings {
                    j.push_warning(w);
                }
                j.record_processed(chunk.len());
            }

            // Suspension point so progress reads and cancel requests are
            // never starved.
            tokio::task::yield_now().await;
        }

        if job.read().await.cancel_requested {
            self.rollback(&job, job_id).await;
            return;
        }

        let mut j = job.write().await;
        j.finish();
        tracing::info!(
            job_id = %job_id,
            processed = j.processed,
            errors = j.errors.len(),
            warnings = j.warnings.len(),
            "Import job completed"
        );
    }

    /// Normalize every row of a chunk independently, splitting the chunk into
    /// persistable records and row-level errors/warnings in file order.
    fn normalize_chunk(
        &self,
        meta: &PeriodMeta,
        chunk: &[RawRow],
        seen_legajos: &mut HashSet<Uuid>,
    ) -> (Vec<PendingRow>, Vec<RowError>, Vec<RowWarning>) {
        let mut pending = Vec::new();
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        for row in chunk {
            match self.normalizer.normalize(meta, row) {
                Ok(normalized) => {
                    if !seen_legajos.insert(normalized.record.legajo_id) {
                        errors.push(RowError {
                            row_index: row.index,
                            raw_descriptor: row.descriptor(),
                            reasons: vec![format!(
                                "duplicate legajo {} already imported in this job",
                                normalized.record.legajo_id
                            )],
                        });
                        continue;
                    }
                    for message in normalized.warnings {
                        warnings.push(RowWarning {
                            row_index: row.index,
                            message,
                        });
                    }
                    pending.push(PendingRow {
                        index: row.index,
                        descriptor: row.descriptor(),
                        record: normalized.record,
                    });
                }
                Err(rejection) => {
                    errors.push(RowError {
                        row_index: row.index,
                        raw_descriptor: row.descriptor(),
                        reasons: rejection.reasons,
                    });
                }
            }
        }

        (pending, errors, warnings)
    }

    /// Cancellation observed: retroactively remove every row committed under
    /// this job id, then finish. Cancel is all-or-nothing, never
    /// "keep what's done".
    async fn rollback(&self, job: &Arc<RwLock<ImportJob>>, job_id: Uuid) {
        {
            job.write().await.mark_cancelled();
        }
        tracing::info!(job_id = %job_id, "Cancellation observed, rolling back committed rows");

        match self.store.delete_all_for_job(job_id).await {
            Ok(()) => {
                job.write().await.finish();
            }
            Err(e) => {
                tracing::error!(job_id = %job_id, error = %e, "Rollback failed");
                job.write()
                    .await
                    .fail_fatal(format!("cancellation rollback failed: {}", e));
            }
        }
    }
}
