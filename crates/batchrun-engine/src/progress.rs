//! Progress event hooks.
//!
//! The dispatcher ticks a reporter twice per item: once when the item is
//! admitted and once when its outcome is delivered. A run of N items therefore
//! produces 2N ticks. Rendering lives outside the engine; reporters here only
//! count or forward.

use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::mpsc;

/// Receives dispatch and completion events.
///
/// Called from many tasks at once, and inline on the dispatch path, so
/// implementations must be cheap and must not block on I/O.
pub trait ProgressReporter: Send + Sync {
    /// Called once before the first admission with the batch size.
    fn on_start(&self, _total: usize) {}

    /// Called when the item is admitted (or written off without running).
    fn on_dispatch(&self, index: usize);

    /// Called when the item's outcome is delivered.
    fn on_complete(&self, index: usize);

    /// Called once after the last outcome has been aggregated.
    fn on_finish(&self) {}
}

/// Reporter that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn on_dispatch(&self, _index: usize) {}

    fn on_complete(&self, _index: usize) {}
}

/// Reporter that counts events.
#[derive(Debug, Default)]
pub struct CountingReporter {
    total: AtomicUsize,
    dispatched: AtomicUsize,
    completed: AtomicUsize,
    finished: AtomicUsize,
}

impl CountingReporter {
    /// Create a new counter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Batch size announced by `on_start`.
    pub fn total(&self) -> usize {
        self.total.load(Ordering::SeqCst)
    }

    /// Number of dispatch events seen.
    pub fn dispatched(&self) -> usize {
        self.dispatched.load(Ordering::SeqCst)
    }

    /// Number of completion events seen.
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    /// Total ticks (dispatch + completion).
    pub fn ticks(&self) -> usize {
        self.dispatched() + self.completed()
    }

    /// Returns true once `on_finish` has been called.
    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::SeqCst) > 0
    }
}

impl ProgressReporter for CountingReporter {
    fn on_start(&self, total: usize) {
        self.total.store(total, Ordering::SeqCst);
    }

    fn on_dispatch(&self, _index: usize) {
        self.dispatched.fetch_add(1, Ordering::SeqCst);
    }

    fn on_complete(&self, _index: usize) {
        self.completed.fetch_add(1, Ordering::SeqCst);
    }

    fn on_finish(&self) {
        self.finished.fetch_add(1, Ordering::SeqCst);
    }
}

/// A progress event forwarded by [`ChannelReporter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressEvent {
    /// The run is starting with this many items.
    Started { total: usize },
    /// An item was admitted.
    Dispatched { index: usize },
    /// An item's outcome was delivered.
    Completed { index: usize },
    /// The run has been fully aggregated.
    Finished,
}

/// Reporter that forwards events over an unbounded channel.
///
/// Sending never blocks, so a slow renderer on the receiving end cannot stall
/// the dispatcher. Events sent after the receiver is dropped are discarded.
#[derive(Debug, Clone)]
pub struct ChannelReporter {
    tx: mpsc::UnboundedSender<ProgressEvent>,
}

impl ChannelReporter {
    /// Create a reporter and the receiver its events arrive on.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ProgressEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn send(&self, event: ProgressEvent) {
        self.tx.send(event).ok();
    }
}

impl ProgressReporter for ChannelReporter {
    fn on_start(&self, total: usize) {
        self.send(ProgressEvent::Started { total });
    }

    fn on_dispatch(&self, index: usize) {
        self.send(ProgressEvent::Dispatched { index });
    }

    fn on_complete(&self, index: usize) {
        self.send(ProgressEvent::Completed { index });
    }

    fn on_finish(&self) {
        self.send(ProgressEvent::Finished);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counting_reporter() {
        let reporter = CountingReporter::new();
        reporter.on_start(2);
        reporter.on_dispatch(0);
        reporter.on_dispatch(1);
        reporter.on_complete(1);

        assert_eq!(reporter.total(), 2);
        assert_eq!(reporter.dispatched(), 2);
        assert_eq!(reporter.completed(), 1);
        assert_eq!(reporter.ticks(), 3);
        assert!(!reporter.is_finished());
    }

    #[test]
    fn test_channel_reporter_forwards_in_order() {
        let (reporter, mut rx) = ChannelReporter::new();
        reporter.on_start(1);
        reporter.on_dispatch(0);
        reporter.on_complete(0);
        reporter.on_finish();

        assert_eq!(rx.try_recv().unwrap(), ProgressEvent::Started { total: 1 });
        assert_eq!(rx.try_recv().unwrap(), ProgressEvent::Dispatched { index: 0 });
        assert_eq!(rx.try_recv().unwrap(), ProgressEvent::Completed { index: 0 });
        assert_eq!(rx.try_recv().unwrap(), ProgressEvent::Finished);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_channel_reporter_survives_dropped_receiver() {
        let (reporter, rx) = ChannelReporter::new();
        drop(rx);
        reporter.on_dispatch(0);
        reporter.on_complete(0);
    }
}
