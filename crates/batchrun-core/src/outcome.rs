//! Per-item outcomes.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{FailureKind, TaskError};

/// Cause attached to a failed outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeError {
    /// What kind of failure this was.
    pub kind: FailureKind,
    /// Human readable message.
    pub message: String,
}

impl OutcomeError {
    /// Create a new OutcomeError.
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for OutcomeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.message.is_empty() {
            write!(f, "{}", self.kind)
        } else {
            write!(f, "{}: {}", self.kind, self.message)
        }
    }
}

impl From<&TaskError> for OutcomeError {
    fn from(err: &TaskError) -> Self {
        Self::new(FailureKind::Task, err.to_string())
    }
}

/// Result of executing one work item.
///
/// `detail` is opaque to the engine: a status code, a response body, a
/// document count, whatever the task function wants the report to carry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskOutcome<D> {
    /// Index of the originating work item.
    pub index: usize,

    /// Whether the item counts as a success.
    pub succeeded: bool,

    /// Task specific detail.
    pub detail: D,

    /// Failure cause, if any.
    pub error: Option<OutcomeError>,

    /// Wall time spent in the task function.
    #[serde(with = "crate::report::duration_ms")]
    pub elapsed: Duration,
}

impl<D> TaskOutcome<D> {
    /// Create a successful outcome.
    pub fn success(index: usize, detail: D) -> Self {
        Self {
            index,
            succeeded: true,
            detail,
            error: None,
            elapsed: Duration::ZERO,
        }
    }

    /// Create a failed outcome that still carries its detail.
    pub fn failure(index: usize, detail: D, error: Option<OutcomeError>) -> Self {
        Self {
            index,
            succeeded: false,
            detail,
            error,
            elapsed: Duration::ZERO,
        }
    }

    /// Builder method to set the measured task time.
    pub fn with_elapsed(mut self, elapsed: Duration) -> Self {
        self.elapsed = elapsed;
        self
    }

    /// Failure kind, if the outcome carries an error.
    pub fn failure_kind(&self) -> Option<FailureKind> {
        self.error.as_ref().map(|e| e.kind)
    }
}

impl<D: Default> TaskOutcome<D> {
    /// Create a failed outcome with an empty detail.
    pub fn failed(index: usize, kind: FailureKind, message: impl Into<String>) -> Self {
        Self::failure(index, D::default(), Some(OutcomeError::new(kind, message)))
    }

    /// Convert a task function error into a failed outcome.
    pub fn from_task_error(index: usize, err: &TaskError) -> Self {
        Self::failure(index, D::default(), Some(OutcomeError::from(err)))
    }
}
