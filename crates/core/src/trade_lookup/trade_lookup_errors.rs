use thiserror::Error;

/// Failure modes of the trade lookup resolver.
#[derive(Error, Debug)]
pub enum TradeLookupError {
    /// Transport failure or server-side (5xx) failure; retried within policy.
    /// Surfaced once the retry budget is exhausted.
    #[error("trade service unavailable: {0}")]
    Transient(String),

    /// Client-side (4xx) failure. Never retried.
    #[error("trade service rejected the request (HTTP {status}): {message}")]
    PermanentRemote { status: u16, message: String },

    /// The lookup succeeded but the payload carried no usable portfolio id.
    #[error("portfolio not resolvable: {0}")]
    NotResolvable(String),

    /// The overall deadline elapsed, during a request or a backoff wait.
    #[error("trade lookup cancelled: deadline elapsed")]
    Cancelled,

    /// The response body could not be decoded. Never retried.
    #[error("failed to decode trade service response: {0}")]
    Decode(String),
}
