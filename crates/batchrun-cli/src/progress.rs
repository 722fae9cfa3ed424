//! Progress renderer: turns reporter events into periodic log lines.

use std::time::Duration;

use batchrun_engine::ProgressEvent;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::info;

/// Running tally of progress ticks.
///
/// Each item ticks twice (dispatch and completion), so a run of `total`
/// items is done at `2 * total` ticks.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ProgressState {
    pub started: bool,
    pub total: usize,
    pub dispatched: usize,
    pub completed: usize,
    pub finished: bool,
}

impl ProgressState {
    pub fn apply(&mut self, event: ProgressEvent) {
        match event {
            ProgressEvent::Started { total } => {
                self.started = true;
                self.total = total;
            }
            ProgressEvent::Dispatched { .. } => self.dispatched += 1,
            ProgressEvent::Completed { .. } => self.completed += 1,
            ProgressEvent::Finished => self.finished = true,
        }
    }

    pub fn ticks(&self) -> usize {
        self.dispatched + self.completed
    }

    /// Percentage of ticks seen, rounded down. An empty run is complete.
    pub fn percent(&self) -> u32 {
        let expected = self.total * 2;
        if expected == 0 {
            return 100;
        }
        (self.ticks().min(expected) * 100 / expected) as u32
    }
}

/// Spawn a task logging progress at most once per `interval`.
pub fn spawn_renderer(
    rx: UnboundedReceiver<ProgressEvent>,
    interval: Duration,
) -> JoinHandle<ProgressState> {
    tokio::spawn(render(rx, interval))
}

/// Consume events until the run finishes or the channel closes, then return
/// the final tally.
///
/// Logs once more at the end, unless the run never started (setup failed
/// before dispatch).
async fn render(mut rx: UnboundedReceiver<ProgressEvent>, interval: Duration) -> ProgressState {
    let mut state = ProgressState::default();
    let mut last_log: Option<Instant> = None;

    while let Some(event) = rx.recv().await {
        state.apply(event);
        if state.finished {
            break;
        }
        let due = last_log.map_or(true, |at| at.elapsed() >= interval);
        if due && state.ticks() > 0 {
            log(&state);
            last_log = Some(Instant::now());
        }
    }

    if state.started {
        log(&state);
    }
    state
}

fn log(state: &ProgressState) {
    info!(
        dispatched = state.dispatched,
        completed = state.completed,
        total = state.total,
        percent = state.percent(),
        "Progress"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::{Arc, Mutex};

    use batchrun_engine::{ChannelReporter, ProgressReporter};

    /// Log sink shared between the subscriber and the test.
    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Captured {
        fn output(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    fn capture_logs() -> (Captured, tracing::subscriber::DefaultGuard) {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();
        (captured, tracing::subscriber::set_default(subscriber))
    }

    #[test]
    fn test_percent_counts_both_ticks() {
        let mut state = ProgressState::default();
        state.apply(ProgressEvent::Started { total: 2 });
        assert_eq!(state.percent(), 0);

        state.apply(ProgressEvent::Dispatched { index: 0 });
        assert_eq!(state.percent(), 25);

        state.apply(ProgressEvent::Dispatched { index: 1 });
        state.apply(ProgressEvent::Completed { index: 1 });
        assert_eq!(state.percent(), 75);

        state.apply(ProgressEvent::Completed { index: 0 });
        assert_eq!(state.percent(), 100);
        assert!(!state.finished);
    }

    #[test]
    fn test_empty_run_is_complete() {
        let mut state = ProgressState::default();
        state.apply(ProgressEvent::Started { total: 0 });
        assert_eq!(state.percent(), 100);
    }

    #[tokio::test]
    async fn test_renderer_returns_final_tally() {
        let (reporter, rx) = ChannelReporter::new();
        let handle = spawn_renderer(rx, Duration::from_secs(60));

        reporter.on_start(3);
        for index in 0..3 {
            reporter.on_dispatch(index);
            reporter.on_complete(index);
        }
        reporter.on_finish();

        let state = handle.await.unwrap();
        assert_eq!(state.ticks(), 6);
        assert_eq!(state.percent(), 100);
        assert!(state.finished);
    }

    #[tokio::test]
    async fn test_renderer_stops_when_channel_closes() {
        let (reporter, rx) = ChannelReporter::new();
        let handle = spawn_renderer(rx, Duration::ZERO);

        reporter.on_start(1);
        reporter.on_dispatch(0);
        drop(reporter);

        let state = handle.await.unwrap();
        assert_eq!(state.dispatched, 1);
        assert!(!state.finished);
    }

    #[tokio::test]
    async fn test_no_final_line_when_run_never_started() {
        let (captured, _guard) = capture_logs();
        let (reporter, rx) = ChannelReporter::new();
        drop(reporter);

        let state = render(rx, Duration::ZERO).await;

        assert!(!state.started);
        assert!(!captured.output().contains("Progress"));
    }

    #[tokio::test]
    async fn test_final_line_after_started_run() {
        let (captured, _guard) = capture_logs();
        let (reporter, rx) = ChannelReporter::new();
        reporter.on_start(0);
        reporter.on_finish();

        let state = render(rx, Duration::from_secs(60)).await;

        assert!(state.started);
        let output = captured.output();
        assert_eq!(output.matches("Progress").count(), 1);
        assert!(output.contains("percent=100"));
    }
}
