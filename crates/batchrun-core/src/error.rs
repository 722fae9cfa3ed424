//! Core domain errors.

use std::time::Duration;

use thiserror::Error;

/// Invalid run configuration, detected before any item is dispatched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The concurrency cap must admit at least one task.
    #[error("max_in_flight must be at least 1 (got {0})")]
    InvalidMaxInFlight(usize),

    /// The concurrency cap exceeds what the runtime semaphore can hold.
    #[error("max_in_flight must be at most {max} (got {got})")]
    MaxInFlightTooLarge { got: usize, max: usize },

    /// A zero deadline would expire every item before it is admitted.
    #[error("deadline must be greater than zero (got {0:?})")]
    InvalidDeadline(Duration),
}

/// Failure raised by a task function for a single item.
///
/// The dispatcher never propagates these; each one becomes a failed
/// [`TaskOutcome`](crate::TaskOutcome) carrying the item's index.
#[derive(Debug, Error)]
pub enum TaskError {
    /// The item could not be processed at all (unreadable file, bad payload).
    #[error("Invalid item: {0}")]
    InvalidItem(String),

    /// Transport-level failure talking to the remote system.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The remote system answered with an error.
    #[error("Remote error: {0}")]
    Remote(String),

    /// Local I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
