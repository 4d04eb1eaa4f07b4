use thiserror::Error;

use crate::constants::MAX_INGEST_BATCH_SIZE;

/// Errors specific to allocation records and the ingestion path.
#[derive(Error, Debug)]
pub enum AllocationError {
    /// An allocation with the same external execution id already exists.
    /// Ingestion downgrades this to a skipped record.
    #[error("allocation for external execution {0} already exists")]
    AlreadyExists(i64),

    #[error("allocation not found: {0}")]
    NotFound(String),

    /// Optimistic update matched no row: the id is unknown or the version is
    /// stale.
    #[error("allocation {0} not found or version conflict")]
    VersionConflict(i64),

    #[error(
        "batch size must be between 1 and {MAX_INGEST_BATCH_SIZE}, got {0}"
    )]
    BatchSizeOutOfRange(usize),

    #[error("invalid allocation data: {0}")]
    InvalidData(String),
}
