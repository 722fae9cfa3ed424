//! Fan-in: folds outcomes into a run report.

use batchrun_core::{RunReport, TaskOutcome};
use tracing::{debug, info};

use crate::{Dispatch, DispatchError};

type Classifier<D> = Box<dyn Fn(&TaskOutcome<D>) -> bool + Send + Sync>;

/// Drains a dispatch and classifies each outcome.
///
/// The classifier decides what counts as success (a 2xx status, a non-empty
/// result, ...). An outcome that carries an error is a failure whatever the
/// classifier says.
pub struct Aggregator<D> {
    classifier: Classifier<D>,
    retain_successes: bool,
}

impl<D: 'static> Default for Aggregator<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: 'static> Aggregator<D> {
    /// Aggregator that trusts each outcome's own `succeeded` flag.
    pub fn new() -> Self {
        Self {
            classifier: Box::new(|outcome: &TaskOutcome<D>| outcome.succeeded),
            retain_successes: false,
        }
    }

    /// Builder method to set the success predicate.
    pub fn with_classifier<F>(mut self, classifier: F) -> Self
    where
        F: Fn(&TaskOutcome<D>) -> bool + Send + Sync + 'static,
    {
        self.classifier = Box::new(classifier);
        self
    }

    /// Builder method to keep successful outcomes in the report.
    pub fn retain_successes(mut self, retain: bool) -> Self {
        self.retain_successes = retain;
        self
    }

    /// Whether the outcome counts as a success.
    pub fn classify(&self, outcome: &TaskOutcome<D>) -> bool {
        outcome.error.is_none() && (self.classifier)(outcome)
    }

    /// Fold one outcome into the report.
    pub fn record(&self, report: &mut RunReport<D>, mut outcome: TaskOutcome<D>) {
        outcome.succeeded = self.classify(&outcome);
        report.total_task_time += outcome.elapsed;

        if outcome.succeeded {
            report.succeeded += 1;
            if self.retain_successes {
                report.successes.push(outcome);
            }
        } else {
            debug!(
                index = outcome.index,
                kind = ?outcome.failure_kind(),
                "Recorded failed outcome"
            );
            report.failed.push(outcome);
        }
    }

    /// Wait for exactly `dispatch.total()` outcomes and build the report.
    ///
    /// Has no timeout of its own; a run that can hang should carry a deadline.
    pub async fn drain(&self, dispatch: &mut Dispatch<D>) -> Result<RunReport<D>, DispatchError> {
        let total = dispatch.total();
        let mut report = RunReport::new(dispatch.run_id().clone(), dispatch.started_at(), total);
        let mut seen = vec![false; total];
        let mut received = 0;

        while received < total {
            let Some(outcome) = dispatch.next_outcome().await else {
                return Err(DispatchError::ChannelClosed {
                    received,
                    expected: total,
                });
            };

            match seen.get_mut(outcome.index) {
                Some(slot) if !*slot => *slot = true,
                _ => return Err(DispatchError::UnexpectedOutcome(outcome.index)),
            }
            received += 1;
            self.record(&mut report, outcome);
        }

        report.elapsed = dispatch.started().elapsed();

        info!(
            run_id = %report.run_id,
            total,
            succeeded = report.succeeded,
            failed = report.failed_count(),
            success_rate = report.success_rate(),
            elapsed_ms = report.elapsed.as_millis() as u64,
            "Batch run finished"
        );

        Ok(report)
    }
}
