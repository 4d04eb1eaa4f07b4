//! Shared constants for the allocation pipeline.

/// Maximum number of candidate records accepted by a single ingest call.
pub const MAX_INGEST_BATCH_SIZE: usize = 100;

/// Default page size for paged allocation listings.
pub const DEFAULT_PAGE_SIZE: i64 = 50;

/// Maximum page size for paged allocation listings.
pub const MAX_PAGE_SIZE: i64 = 1000;

/// Prefix for generated transaction files.
pub const TRANSACTION_FILE_PREFIX: &str = "transactions_";

/// UTC timestamp format embedded in transaction file names.
pub const TRANSACTION_FILE_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Header line of the portfolio accounting transaction file.
pub const TRANSACTION_FILE_HEADER: &str =
    "portfolio_id,security_id,source_id,transaction_type,quantity,price,transaction_date";
