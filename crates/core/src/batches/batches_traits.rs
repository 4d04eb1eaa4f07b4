use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::batches_model::{BatchWindow, SendResult};
use crate::Result;

/// Trait defining the contract for batch-history store operations.
#[async_trait]
pub trait BatchHistoryRepositoryTrait: Send + Sync {
    /// Atomically claims the next batch window: computes the previous start
    /// time (`max(start_time)`, or the epoch on first call) and inserts a new
    /// row whose `start_time` is assigned by the store, in one transaction.
    ///
    /// Fails with `BatchError::WindowContended` when a concurrent claim
    /// committed first.
    async fn try_claim_window(&self) -> Result<BatchWindow>;

    /// Current `max(start_time)`, or `None` when no batch has run. Diagnostic
    /// read only; the claim path recomputes it transactionally.
    fn get_max_start_time(&self) -> Result<Option<DateTime<Utc>>>;
}

/// Trait defining the contract for the send engine.
#[async_trait]
pub trait SendServiceTrait: Send + Sync {
    /// Claims the next window, exports the covered allocations, and hands the
    /// file to the external CLI. Fails fast on window contention.
    async fn send_batch(&self) -> Result<SendResult>;
}
