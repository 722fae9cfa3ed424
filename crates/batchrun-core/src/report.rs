//! Run reports.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{RunId, TaskOutcome};

/// Percentage of successful items, rounded down.
///
/// An empty run performed no work and reports 100.
pub fn success_rate(succeeded: usize, total: usize) -> u32 {
    if total == 0 {
        return 100;
    }
    // Integer floor of succeeded * 100 / total.
    ((succeeded.min(total) as u128 * 100) / total as u128) as u32
}

/// Summary of a finished batch run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport<D> {
    /// Run identifier.
    pub run_id: RunId,

    /// When dispatch started.
    pub started_at: DateTime<Utc>,

    /// Number of work items in the batch.
    pub total: usize,

    /// Number of items classified as successful.
    pub succeeded: usize,

    /// Failed outcomes, in completion order.
    pub failed: Vec<TaskOutcome<D>>,

    /// Successful outcomes in completion order, when the aggregator was
    /// asked to retain them.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub successes: Vec<TaskOutcome<D>>,

    /// Wall time from dispatch start to the last outcome.
    #[serde(with = "duration_ms")]
    pub elapsed: Duration,

    /// Sum of the per-item task times.
    #[serde(with = "duration_ms")]
    pub total_task_time: Duration,
}

impl<D> RunReport<D> {
    /// Create an empty report for a run that is about to start.
    pub fn new(run_id: RunId, started_at: DateTime<Utc>, total: usize) -> Self {
        Self {
            run_id,
            started_at,
            total,
            succeeded: 0,
            failed: Vec::new(),
            successes: Vec::new(),
            elapsed: Duration::ZERO,
            total_task_time: Duration::ZERO,
        }
    }

    /// Success rate as a whole percentage.
    pub fn success_rate(&self) -> u32 {
        success_rate(self.succeeded, self.total)
    }

    /// Number of failed items.
    pub fn failed_count(&self) -> usize {
        self.failed.len()
    }

    /// Returns true if every item succeeded.
    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }

    /// Returns true if the report accounts for every item of the batch.
    pub fn is_complete(&self) -> bool {
        self.succeeded + self.failed.len() == self.total
    }

    /// Mean time spent per item, or `None` for an empty run.
    pub fn mean_task_time(&self) -> Option<Duration> {
        if self.total == 0 {
            return None;
        }
        let nanos = self.total_task_time.as_nanos() / self.total as u128;
        Some(Duration::from_nanos(nanos.min(u64::MAX as u128) as u64))
    }

    /// Indices of the failed items, in completion order.
    pub fn failed_indices(&self) -> Vec<usize> {
        self.failed.iter().map(|o| o.index).collect()
    }
}

/// Serialize a `Duration` as whole milliseconds.
pub(crate) mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis().min(u64::MAX as u128) as u64)
    }

    pub fn deserialize<'de, De: Deserializer<'de>>(d: De) -> Result<Duration, De::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}
