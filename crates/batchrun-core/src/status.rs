//! Failure classification for outcomes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Why an item ended up as a failed outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureKind {
    /// The task function reported an error.
    Task,
    /// The task function panicked.
    Panicked,
    /// The run deadline elapsed before the item finished.
    DeadlineExceeded,
    /// The run was cancelled before the item finished.
    Cancelled,
    /// No admission slot could be acquired for the item.
    AdmissionFailed,
}

impl FailureKind {
    /// Returns true if the item was cut short by the run rather than by
    /// its own task.
    pub fn is_interrupted(&self) -> bool {
        matches!(self, Self::DeadlineExceeded | Self::Cancelled)
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Task => "task failed",
            Self::Panicked => "task panicked",
            Self::DeadlineExceeded => "deadline exceeded",
            Self::Cancelled => "cancelled",
            Self::AdmissionFailed => "admission failed",
        };
        f.write_str(name)
    }
}
