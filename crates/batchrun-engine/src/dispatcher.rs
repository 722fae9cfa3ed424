//! Bounded fan-out dispatcher.
//!
//! Items are admitted in index order through a semaphore holding
//! `max_in_flight` permits. Each admitted item runs on its own tokio task and
//! keeps its permit until the task function returns, fails, panics or is
//! interrupted. Every item yields exactly one outcome on the result channel,
//! including items written off by a deadline or cancellation before they were
//! ever started.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use batchrun_core::{ConcurrencyConfig, FailureKind, RunId, RunReport, TaskOutcome, WorkItem};
use chrono::{DateTime, Utc};
use futures_util::FutureExt;
use tokio::sync::{mpsc, OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{Aggregator, DispatchError, NoopReporter, ProgressReporter, TaskFn};

/// Why the run token was cancelled. Unset means external cancellation.
type Interrupt = Arc<OnceLock<FailureKind>>;

/// Runs work items under a concurrency cap.
pub struct Dispatcher {
    config: ConcurrencyConfig,
    reporter: Arc<dyn ProgressReporter>,
    cancel: CancellationToken,
}

impl Dispatcher {
    /// Create a dispatcher. Fails if the configuration is invalid.
    pub fn new(config: ConcurrencyConfig) -> Result<Self, DispatchError> {
        config.validate()?;
        Ok(Self {
            config,
            reporter: Arc::new(NoopReporter),
            cancel: CancellationToken::new(),
        })
    }

    /// Builder method to attach a progress reporter.
    pub fn with_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Builder method to tie runs to an external cancellation token.
    ///
    /// Cancelling it interrupts every run started afterwards; outstanding
    /// items are reported as [`FailureKind::Cancelled`].
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// The configuration this dispatcher runs with.
    pub fn config(&self) -> &ConcurrencyConfig {
        &self.config
    }

    /// Dispatch all items and aggregate their outcomes into a report.
    pub async fn run<P, D>(
        &self,
        items: Vec<WorkItem<P>>,
        task: Arc<dyn TaskFn<P, D>>,
        aggregator: &Aggregator<D>,
    ) -> Result<RunReport<D>, DispatchError>
    where
        P: Send + Sync + 'static,
        D: Default + Send + 'static,
    {
        let mut dispatch = self.dispatch(items, task)?;
        let report = aggregator.drain(&mut dispatch).await;
        self.reporter.on_finish();
        report
    }

    /// Start dispatching items in the background.
    ///
    /// Returns the consumption point for the outcomes. Must be called from
    /// within a tokio runtime.
    pub fn dispatch<P, D>(
        &self,
        items: Vec<WorkItem<P>>,
        task: Arc<dyn TaskFn<P, D>>,
    ) -> Result<Dispatch<D>, DispatchError>
    where
        P: Send + Sync + 'static,
        D: Default + Send + 'static,
    {
        for (position, item) in items.iter().enumerate() {
            if item.index() != position {
                return Err(DispatchError::NonDenseIndex {
                    position,
                    index: item.index(),
                });
            }
        }

        let run_id = RunId::generate();
        let total = items.len();
        let token = self.cancel.child_token();
        let interrupt: Interrupt = Arc::new(OnceLock::new());
        let (tx, rx) = mpsc::channel(self.config.max_in_flight);

        info!(
            run_id = %run_id,
            total,
            max_in_flight = self.config.max_in_flight,
            delay_ms = self.config.inter_request_delay.as_millis() as u64,
            deadline = ?self.config.deadline,
            "Starting batch run"
        );

        let started = Instant::now();
        let started_at = Utc::now();
        self.reporter.on_start(total);

        let watchdog = self.config.deadline.map(|deadline| {
            spawn_watchdog(deadline, token.clone(), interrupt.clone(), run_id.clone())
        });

        let delivery = Delivery {
            tx,
            reporter: self.reporter.clone(),
            interrupt: interrupt.clone(),
        };
        let semaphore = Arc::new(Semaphore::new(self.config.max_in_flight));
        tokio::spawn(admit(
            items,
            task,
            semaphore,
            self.config.inter_request_delay,
            token.clone(),
            delivery,
        ));

        Ok(Dispatch {
            run_id,
            total,
            started,
            started_at,
            outcomes: rx,
            token,
            interrupt,
            watchdog,
        })
    }
}

/// A run in progress: the single consumption point for its outcomes.
///
/// Dropping it cancels whatever is still outstanding.
pub struct Dispatch<D> {
    run_id: RunId,
    total: usize,
    started: Instant,
    started_at: DateTime<Utc>,
    outcomes: mpsc::Receiver<TaskOutcome<D>>,
    token: CancellationToken,
    interrupt: Interrupt,
    watchdog: Option<JoinHandle<()>>,
}

impl<D> Dispatch<D> {
    /// Run identifier.
    pub fn run_id(&self) -> &RunId {
        &self.run_id
    }

    /// Number of items in the batch, i.e. the number of outcomes to expect.
    pub fn total(&self) -> usize {
        self.total
    }

    /// Monotonic start of the run.
    pub fn started(&self) -> Instant {
        self.started
    }

    /// Wall-clock start of the run.
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Token cancelled when the run is interrupted.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Cancel the run. Outstanding items are reported as cancelled.
    pub fn cancel(&self) {
        self.interrupt.set(FailureKind::Cancelled).ok();
        self.token.cancel();
    }

    /// Wait for the next outcome, in completion order.
    ///
    /// Returns `None` once every sender is gone.
    pub async fn next_outcome(&mut self) -> Option<TaskOutcome<D>> {
        self.outcomes.recv().await
    }
}

impl<D> Drop for Dispatch<D> {
    fn drop(&mut self) {
        if let Some(watchdog) = self.watchdog.take() {
            watchdog.abort();
        }
        self.token.cancel();
    }
}

/// Shared handles used to hand an outcome to the aggregator.
struct Delivery<D> {
    tx: mpsc::Sender<TaskOutcome<D>>,
    reporter: Arc<dyn ProgressReporter>,
    interrupt: Interrupt,
}

impl<D> Clone for Delivery<D> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            reporter: self.reporter.clone(),
            interrupt: self.interrupt.clone(),
        }
    }
}

impl<D: Default> Delivery<D> {
    async fn deliver(&self, outcome: TaskOutcome<D>) {
        let index = outcome.index;
        self.reporter.on_complete(index);
        if self.tx.send(outcome).await.is_err() {
            warn!(index, "Outcome receiver dropped, discarding outcome");
        }
    }

    fn interrupted(&self, index: usize) -> TaskOutcome<D> {
        let kind = self
            .interrupt
            .get()
            .copied()
            .unwrap_or(FailureKind::Cancelled);
        let message = match kind {
            FailureKind::DeadlineExceeded => "not completed before the run deadline",
            _ => "not completed before the run was cancelled",
        };
        TaskOutcome::failed(index, kind, message)
    }
}

/// Admission loop: one permit per item, in index order.
async fn admit<P, D>(
    items: Vec<WorkItem<P>>,
    task: Arc<dyn TaskFn<P, D>>,
    semaphore: Arc<Semaphore>,
    delay: Duration,
    token: CancellationToken,
    delivery: Delivery<D>,
) where
    P: Send + Sync + 'static,
    D: Default + Send + 'static,
{
    for (position, item) in items.into_iter().enumerate() {
        let index = item.index();

        if position > 0 && !delay.is_zero() {
            tokio::select! {
                biased;
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(delay) => {}
            }
        }

        let permit = tokio::select! {
            biased;
            _ = token.cancelled() => None,
            permit = semaphore.clone().acquire_owned() => Some(permit),
        };

        delivery.reporter.on_dispatch(index);

        let permit = match permit {
            Some(Ok(permit)) => permit,
            Some(Err(e)) => {
                warn!(index, error = %e, "Failed to acquire admission slot");
                delivery
                    .deliver(TaskOutcome::failed(
                        index,
                        FailureKind::AdmissionFailed,
                        e.to_string(),
                    ))
                    .await;
                continue;
            }
            None => {
                delivery.deliver(delivery.interrupted(index)).await;
                continue;
            }
        };

        debug!(index, available = semaphore.available_permits(), "Admitted work item");
        tokio::spawn(execute(
            item,
            task.clone(),
            permit,
            token.clone(),
            delivery.clone(),
        ));
    }
}

/// Run one item and deliver its outcome. The permit is released before the
/// outcome is sent.
async fn execute<P, D>(
    item: WorkItem<P>,
    task: Arc<dyn TaskFn<P, D>>,
    permit: OwnedSemaphorePermit,
    token: CancellationToken,
    delivery: Delivery<D>,
) where
    P: Send + Sync + 'static,
    D: Default + Send + 'static,
{
    let index = item.index();
    let started = Instant::now();

    let result = {
        let call = AssertUnwindSafe(task.call(&item, token.clone())).catch_unwind();
        tokio::select! {
            biased;
            _ = token.cancelled() => None,
            result = call => Some(result),
        }
    };
    drop(permit);
    let elapsed = started.elapsed();

    let outcome = match result {
        Some(Ok(Ok(mut outcome))) => {
            if outcome.index != index {
                warn!(index, reported = outcome.index, "Task reported wrong index, correcting");
                outcome.index = index;
            }
            outcome
        }
        Some(Ok(Err(err))) => {
            debug!(index, error = %err, "Task function failed");
            TaskOutcome::from_task_error(index, &err)
        }
        Some(Err(panic)) => {
            let message = panic_message(panic.as_ref());
            warn!(index, panic = %message, "Task function panicked");
            TaskOutcome::failed(index, FailureKind::Panicked, message)
        }
        None => {
            debug!(index, "Task interrupted");
            delivery.interrupted(index)
        }
    };

    delivery.deliver(outcome.with_elapsed(elapsed)).await;
}

fn spawn_watchdog(
    deadline: Duration,
    token: CancellationToken,
    interrupt: Interrupt,
    run_id: RunId,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::select! {
            biased;
            _ = token.cancelled() => {}
            _ = tokio::time::sleep(deadline) => {
                interrupt.set(FailureKind::DeadlineExceeded).ok();
                warn!(
                    run_id = %run_id,
                    deadline_ms = deadline.as_millis() as u64,
                    "Run deadline elapsed, interrupting outstanding items"
                );
                token.cancel();
            }
        }
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "task panicked".to_string()
    }
}
