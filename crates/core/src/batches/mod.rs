//! Batches module - batch-window protocol models, send engine, and traits.

mod batches_errors;
mod batches_model;
mod batches_service;
mod batches_traits;


pub use batches_errors::BatchError;
pub use batches_model::{BatchHistory, BatchWindow, SendResult, SendStatus};
pub use batches_service::SendService;
pub use batches_traits::{BatchHistoryRepositoryTrait, SendServiceTrait};
