//! Payroll persistence seam consumed by the batch processor.

use async_trait::async_trait;
use recibos_core::models::PayrollLineRecord;
use uuid::Uuid;

/// Persistence failure classes. The batch processor degrades `Rejected` into
/// row-level errors for the chunk; `Unavailable` is fatal for the whole job.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Connectivity-class failure: the storage layer itself is unreachable.
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// The chunk was refused (constraint violation, bad data at the storage
    /// boundary). Recoverable at the job level.
    #[error("chunk rejected: {0}")]
    Rejected(String),
}

/// Storage operations the import engine depends on. A chunk is persisted as
/// one unit; cancellation rollback is a single delete by job id.
#[async_trait]
pub trait PayrollStore: Send + Sync {
    async fn save_chunk(&self, job_id: Uuid, records: &[PayrollLineRecord])
        -> Result<(), StoreError>;

    async fn delete_all_for_job(&self, job_id: Uuid) -> Result<(), StoreError>;
}
