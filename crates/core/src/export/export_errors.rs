use thiserror::Error;

/// Errors raised while exporting a batch to the portfolio accounting CLI.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("no allocations to export")]
    NoAllocations,

    #[error("file I/O failed: {0}")]
    Io(String),

    #[error("CLI command is not configured")]
    CommandNotConfigured,

    #[error("CLI exited with status {status}: {output}")]
    CliFailed { status: i32, output: String },

    #[error("CLI timed out after {0} seconds")]
    CliTimeout(u64),
}
