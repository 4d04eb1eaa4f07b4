mod model;
mod repository;

pub use model::{BatchHistoryDB, NewBatchHistoryDB};
pub use repository::BatchHistoryRepository;
