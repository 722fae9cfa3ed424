//! Newtype wrapper for the run identifier.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for one batch run.
///
/// Tags every log line and the final report so concurrent runs in the same
/// process can be told apart.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(String);

impl RunId {
    /// Create a new RunId from a string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a new random RunId.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Consume and return the inner string.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_id_generate() {
        let id1 = RunId::generate();
        let id2 = RunId::generate();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_id_display() {
        let id = RunId::new("run-123");
        assert_eq!(format!("{}", id), "run-123");
        assert_eq!(id.into_inner(), "run-123");
    }
}
