use log::{debug, info};
use std::sync::Arc;

use crate::allocations::allocations_errors::AllocationError;
use crate::allocations::allocations_model::*;
use crate::allocations::{AllocationRepositoryTrait, AllocationServiceTrait};
use crate::constants::MAX_INGEST_BATCH_SIZE;
use crate::trade_lookup::TradeLookupTrait;
use crate::{Error, Result};
use async_trait::async_trait;

/// Ingestion engine: validates candidate records, filters open trades,
/// resolves portfolio ids, and persists allocations idempotently.
pub struct AllocationService {
    allocation_repository: Arc<dyn AllocationRepositoryTrait>,
    trade_lookup: Arc<dyn TradeLookupTrait>,
}

impl AllocationService {
    pub fn new(
        allocation_repository: Arc<dyn AllocationRepositoryTrait>,
        trade_lookup: Arc<dyn TradeLookupTrait>,
    ) -> Self {
        Self {
            allocation_repository,
            trade_lookup,
        }
    }

    /// Processes a single candidate record. Never fails the batch: every
    /// outcome is folded into the per-record result.
    async fn process_record(&self, request: &NewAllocationRequest) -> AllocationIngestResult {
        let external_execution_id = request.external_execution_id.unwrap_or_default();

        if let Err(err) = request.validate() {
            return AllocationIngestResult::error(
                external_execution_id,
                format!("validation failed: {}", err),
            );
        }

        if request.is_open {
            debug!(
                "skipping open execution {}",
                external_execution_id
            );
            return AllocationIngestResult::skipped(
                external_execution_id,
                None,
                "execution is still open",
            );
        }

        // Idempotency probe. The unique constraint at insert time remains the
        // final authority; this read only avoids a portfolio lookup on the
        // common duplicate case.
        match self
            .allocation_repository
            .find_by_external_execution_id(external_execution_id)
        {
            Ok(existing) => {
                debug!(
                    "allocation for external execution {} already exists as {}",
                    external_execution_id, existing.id
                );
                return AllocationIngestResult::skipped(
                    external_execution_id,
                    Some(existing.id),
                    "allocation already exists",
                );
            }
            Err(Error::Allocation(AllocationError::NotFound(_))) => {}
            Err(err) => {
                return AllocationIngestResult::error(
                    external_execution_id,
                    format!("duplicate probe failed: {}", err),
                );
            }
        }

        let portfolio_id = match self
            .trade_lookup
            .resolve_portfolio(external_execution_id)
            .await
        {
            Ok(portfolio_id) => portfolio_id,
            Err(err) => {
                return AllocationIngestResult::error(
                    external_execution_id,
                    format!("failed to resolve portfolio id: {}", err),
                );
            }
        };

        let new_allocation = match request.to_new_allocation(portfolio_id) {
            Ok(allocation) => allocation,
            Err(err) => {
                return AllocationIngestResult::error(
                    external_execution_id,
                    format!("validation failed: {}", err),
                );
            }
        };

        match self.allocation_repository.try_insert(new_allocation).await {
            Ok(created) => {
                info!(
                    "created allocation {} for external execution {}",
                    created.id, external_execution_id
                );
                AllocationIngestResult::created(external_execution_id, created.id)
            }
            // Another caller won the insert race; the constraint is ground
            // truth, so downgrade to a skip.
            Err(Error::Allocation(AllocationError::AlreadyExists(_))) => {
                AllocationIngestResult::skipped(
                    external_execution_id,
                    None,
                    "allocation already exists",
                )
            }
            Err(err) => AllocationIngestResult::error(
                external_execution_id,
                format!("failed to persist allocation: {}", err),
            ),
        }
    }
}

#[async_trait]
impl AllocationServiceTrait for AllocationService {
    async fn ingest(&self, batch: Vec<NewAllocationRequest>) -> Result<IngestBatchResult> {
        if batch.is_empty() || batch.len() > MAX_INGEST_BATCH_SIZE {
            return Err(AllocationError::BatchSizeOutOfRange(batch.len()).into());
        }

        info!("processing ingestion batch of {} records", batch.len());

        let mut outcome = IngestBatchResult::default();
        for request in &batch {
            outcome.push(self.process_record(request).await);
        }

        info!(
            "ingestion batch completed: processed={} skipped={} errored={}",
            outcome.processed, outcome.skipped, outcome.errored
        );

        Ok(outcome)
    }

    fn get_allocation(&self, allocation_id: i64) -> Result<Allocation> {
        self.allocation_repository.find_by_id(allocation_id)
    }

    fn list_allocations(
        &self,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Allocation>, PaginationInfo)> {
        let (allocations, total) = self.allocation_repository.list_paged(limit, offset)?;
        Ok((allocations, PaginationInfo::new(total, limit, offset)))
    }
}
