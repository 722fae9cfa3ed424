//! Run-level errors.

use batchrun_core::ConfigError;
use thiserror::Error;

/// Errors that stop a run as a whole.
///
/// Item failures never show up here; they become failed outcomes.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The concurrency configuration is invalid.
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// Work items must be numbered 0..N-1 in order.
    #[error("Work item at position {position} has index {index}")]
    NonDenseIndex { position: usize, index: usize },

    /// The outcome channel closed before every item reported.
    #[error("Outcome channel closed after {received} of {expected} outcomes")]
    ChannelClosed { received: usize, expected: usize },

    /// An outcome arrived for an index that is out of range or already seen.
    #[error("Unexpected outcome for item {0}")]
    UnexpectedOutcome(usize),
}
