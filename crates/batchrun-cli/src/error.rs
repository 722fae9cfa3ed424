//! Setup errors for the CLI.
//!
//! Anything here stops the run before the first item is dispatched.

use batchrun_engine::DispatchError;
use thiserror::Error;

/// Errors that prevent a run from starting.
#[derive(Debug, Error)]
pub enum CliError {
    /// Target URL could not be parsed.
    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// Input file or directory could not be read.
    #[error("Failed to read '{path}': {source}")]
    Source {
        path: String,
        source: std::io::Error,
    },

    /// Rows file is not a JSON array of objects.
    #[error("Failed to parse rows from '{path}': {source}")]
    Rows {
        path: String,
        source: serde_json::Error,
    },

    /// Report could not be written.
    #[error("Failed to write report: {0}")]
    Output(#[from] std::io::Error),

    /// HTTP client could not be built.
    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    /// Dispatcher rejected the run.
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}
