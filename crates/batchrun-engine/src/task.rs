//! Task function abstraction.

use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use batchrun_core::{TaskError, TaskOutcome, WorkItem};
use tokio_util::sync::CancellationToken;

/// Performs the unit of work for one item.
///
/// Implementations are invoked concurrently from independent tasks and must
/// not share mutable state unless they synchronize it themselves. The
/// cancellation token fires when the run deadline elapses or the run is
/// cancelled; long I/O waits should select on it.
///
/// Returning `Err` is equivalent to returning a failed outcome with an empty
/// detail.
#[async_trait]
pub trait TaskFn<P, D>: Send + Sync {
    /// Execute one item.
    async fn call(
        &self,
        item: &WorkItem<P>,
        cancel: CancellationToken,
    ) -> Result<TaskOutcome<D>, TaskError>;
}

/// Adapter turning an async closure into a [`TaskFn`].
///
/// The closure receives its own clone of the work item.
pub struct FnTask<F, P, D> {
    f: F,
    _marker: PhantomData<fn(P) -> D>,
}

impl<F, P, D> FnTask<F, P, D> {
    /// Wrap a closure.
    pub fn new(f: F) -> Self {
        Self {
            f,
            _marker: PhantomData,
        }
    }
}

#[async_trait]
impl<F, Fut, P, D> TaskFn<P, D> for FnTask<F, P, D>
where
    F: Fn(WorkItem<P>, CancellationToken) -> Fut + Send + Sync,
    Fut: Future<Output = Result<TaskOutcome<D>, TaskError>> + Send,
    P: Clone + Send + Sync + 'static,
    D: Send + 'static,
{
    async fn call(
        &self,
        item: &WorkItem<P>,
        cancel: CancellationToken,
    ) -> Result<TaskOutcome<D>, TaskError> {
        (self.f)(item.clone(), cancel).await
    }
}

/// Wrap an async closure as a shareable task function.
pub fn task_fn<F, Fut, P, D>(f: F) -> Arc<dyn TaskFn<P, D>>
where
    F: Fn(WorkItem<P>, CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<TaskOutcome<D>, TaskError>> + Send + 'static,
    P: Clone + Send + Sync + 'static,
    D: Send + 'static,
{
    Arc::new(FnTask::new(f))
}
