use thiserror::Error;

/// Errors specific to the batch-window send protocol.
#[derive(Error, Debug)]
pub enum BatchError {
    /// A concurrent send attempt committed the window first. The losing
    /// claim has no side effects and is safe to retry later.
    #[error("batch window already claimed by a concurrent send: {0}")]
    WindowContended(String),
}
