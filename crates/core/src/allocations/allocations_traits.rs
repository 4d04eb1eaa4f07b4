use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::allocations_model::*;
use crate::Result;

/// Trait defining the contract for allocation store operations.
///
/// Implementations own the durability and concurrency invariants: the insert
/// must be atomic w.r.t. the uniqueness of `external_execution_id`, and
/// `ready_to_send_timestamp` is assigned by the store, never by the caller.
#[async_trait]
pub trait AllocationRepositoryTrait: Send + Sync {
    /// Inserts a new allocation. Fails with `AllocationError::AlreadyExists`
    /// when a row with the same external execution id is present.
    async fn try_insert(&self, new_allocation: NewAllocation) -> Result<Allocation>;

    fn find_by_id(&self, allocation_id: i64) -> Result<Allocation>;

    fn find_by_external_execution_id(&self, external_execution_id: i64) -> Result<Allocation>;

    /// Returns one page plus the total row count.
    fn list_paged(&self, limit: i64, offset: i64) -> Result<(Vec<Allocation>, i64)>;

    /// Returns allocations with `window_start <= ready_to_send_timestamp <
    /// window_end`, ordered ascending by `ready_to_send_timestamp`, then id.
    fn select_for_window(
        &self,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Result<Vec<Allocation>>;

    /// Optimistic update: matches on id and current version, increments the
    /// version on success. Not used by the pipeline itself.
    async fn update(&self, update: AllocationUpdate) -> Result<Allocation>;

    async fn delete(&self, allocation_id: i64) -> Result<()>;
}

/// Trait defining the contract for the ingestion engine.
#[async_trait]
pub trait AllocationServiceTrait: Send + Sync {
    /// Processes a batch of up to 100 candidate records. Each record is
    /// persisted, skipped, or errored independently; results mirror the
    /// input order.
    async fn ingest(&self, batch: Vec<NewAllocationRequest>) -> Result<IngestBatchResult>;

    fn get_allocation(&self, allocation_id: i64) -> Result<Allocation>;

    fn list_allocations(
        &self,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Allocation>, PaginationInfo)>;
}
