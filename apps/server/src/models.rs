//! Wire models specific to the HTTP surface.

use serde::{Deserialize, Serialize};

use allocation_core::allocations::{Allocation, PaginationInfo};

/// Paged listing response. The upstream records are called executions on the
/// wire even though the rows are portfolio-enriched allocations.
#[derive(Debug, Serialize, Deserialize)]
pub struct ExecutionListResponse {
    pub executions: Vec<Allocation>,
    pub pagination: PaginationInfo,
}
