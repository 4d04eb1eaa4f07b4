//! Export module - transaction file formatting and CLI handoff.

mod cli_invoker;
mod export_errors;
mod file_generator;

pub use cli_invoker::{CliInvoker, CliInvokerTrait};
pub use export_errors::ExportError;
pub use file_generator::{FileGenerator, FileGeneratorTrait};
