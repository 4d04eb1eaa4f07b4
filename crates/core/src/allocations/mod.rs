//! Allocations module - domain models, ingestion engine, and traits.

mod allocations_errors;
mod allocations_model;
mod allocations_service;
mod allocations_traits;


pub use allocations_errors::AllocationError;
pub use allocations_model::{
    Allocation, AllocationIngestResult, AllocationUpdate, IngestBatchResult, IngestStatus,
    NewAllocation, NewAllocationRequest, PaginationInfo, TradeSide,
};
pub use allocations_service::AllocationService;
pub use allocations_traits::{AllocationRepositoryTrait, AllocationServiceTrait};
