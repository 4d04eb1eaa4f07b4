//! Allocation Core - domain entities, engines, and traits.
//!
//! This crate contains the core business logic for the allocation pipeline.
//! It is database-agnostic and defines repository traits that are implemented
//! by the `storage-postgres` crate.

pub mod allocations;
pub mod batches;
pub mod constants;
pub mod errors;
pub mod export;
pub mod health;
pub mod trade_lookup;
pub mod utils;

// Re-export error types
pub use errors::Error;
pub use errors::Result;
