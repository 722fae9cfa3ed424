//! batchrun dispatch engine
//!
//! Runs one task function per work item under a concurrency cap, reports
//! progress as items are admitted and completed, and folds every outcome into
//! a [`RunReport`](batchrun_core::RunReport).
//!
//! # Example
//!
//! ```rust,no_run
//! use batchrun_core::{ConcurrencyConfig, TaskError, TaskOutcome, WorkItem};
//! use batchrun_engine::{task_fn, Aggregator, Dispatcher};
//!
//! async fn run() -> Result<(), Box<dyn std::error::Error>> {
//!     let dispatcher = Dispatcher::new(ConcurrencyConfig::new(4))?;
//!     let items = WorkItem::enumerate(vec![1u64, 2, 3]);
//!     let task = task_fn(|item: WorkItem<u64>, _cancel| async move {
//!         Ok::<_, TaskError>(TaskOutcome::success(item.index(), item.into_payload() * 2))
//!     });
//!
//!     let report = dispatcher.run(items, task, &Aggregator::new()).await?;
//!     println!("{}% succeeded", report.success_rate());
//!     Ok(())
//! }
//! ```

mod aggregator;
mod dispatcher;
mod error;
mod progress;
mod task;

pub use aggregator::Aggregator;
pub use dispatcher::{Dispatch, Dispatcher};
pub use error::DispatchError;
pub use progress::{
    ChannelReporter, CountingReporter, NoopReporter, ProgressEvent, ProgressReporter,
};
pub use task::{task_fn, FnTask, TaskFn};

pub use tokio_util::sync::CancellationToken;
