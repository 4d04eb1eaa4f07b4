//! PostgreSQL storage for the allocation pipeline.
//!
//! Implements the repository traits defined in `allocation-core` on top of
//! Diesel with an r2d2 connection pool. The two load-bearing unique indexes
//! (`allocations.external_execution_id`, `batch_history.start_time` /
//! `batch_history.previous_start_time`) live in this crate's migrations.

pub mod allocations;
pub mod batches;
pub mod db;
pub mod errors;
pub mod schema;

pub use db::{create_pool, get_connection, run_migrations, DbConnection, DbPool, StoreStatus};
