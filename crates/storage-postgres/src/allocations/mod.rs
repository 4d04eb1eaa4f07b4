mod model;
mod repository;

pub use model::{AllocationChangesDB, AllocationDB, NewAllocationDB};
pub use repository::AllocationRepository;
