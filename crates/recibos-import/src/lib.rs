//! Import job engine for the recibos payroll portal.
//!
//! One asynchronous bulk-import execution at a time: the
//! [`ImportJobManager`] owns the single job slot, the [`BatchProcessor`]
//! drives chunked row processing, and the [`RowNormalizer`] /
//! [`PayrollStore`] traits are the seams to the column-mapping and storage
//! collaborators.

pub mod batch;
pub mod manager;
pub mod normalizer;
pub mod store;
pub mod testing;

pub use batch::{BatchProcessor, DEFAULT_CHUNK_SIZE};
pub use manager::{ImportJobManager, ImportJobManagerConfig};
pub use normalizer::{Normalized, RowNormalizer, RowRejection};
pub use store::{PayrollStore, StoreError};
