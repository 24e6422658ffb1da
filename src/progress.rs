//! Periodic progress reporting over the shared zone counter

use std::io::Write;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Interval between progress reports
pub const PROGRESS_INTERVAL: Duration = Duration::from_secs(1);

/// Receives progress snapshots from the monitor
pub trait ProgressSink: Send {
    /// Called once per interval with the current count
    fn report(&mut self, processed: usize, total: usize);

    /// Called once when the monitor stops
    fn finish(&mut self) {}
}

/// Status line for a snapshot
pub fn status_line(processed: usize, total: usize) -> String {
    let percent = if total == 0 {
        100
    } else {
        processed * 100 / total
    };
    format!("Processed {} of {} zones ({}%)", processed, total, percent)
}

/// Overwrites a single status line on stderr
#[derive(Debug, Default)]
pub struct TerminalProgress;

impl ProgressSink for TerminalProgress {
    fn report(&mut self, processed: usize, total: usize) {
        let mut stderr = std::io::stderr().lock();
        let _ = write!(stderr, "\r{}", status_line(processed, total));
        let _ = stderr.flush();
    }

    fn finish(&mut self) {
        let _ = writeln!(std::io::stderr());
    }
}

/// Discards every report
#[derive(Debug, Default)]
pub struct SilentProgress;

impl ProgressSink for SilentProgress {
    fn report(&mut self, _processed: usize, _total: usize) {}
}

/// Spawn the monitor task
///
/// Reports every `interval` until the counter reaches `total` or `cancel` fires.
pub fn spawn_progress_monitor(
    processed: Arc<AtomicUsize>,
    total: usize,
    mut sink: Box<dyn ProgressSink>,
    cancel: CancellationToken,
    interval: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let current = processed.load(Ordering::Relaxed);
                    sink.report(current, total);
                    if current >= total {
                        break;
                    }
                }
                _ = cancel.cancelled() => {
                    tracing::debug!("Progress monitor stopped, run cancelled");
                    break;
                }
            }
        }
        sink.finish();
    })
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Clone, Default)]
    struct RecordingSink {
        reports: Arc<Mutex<Vec<(usize, usize)>>>,
        finished: Arc<Mutex<bool>>,
    }

    impl ProgressSink for RecordingSink {
        fn report(&mut self, processed: usize, total: usize) {
            self.reports.lock().unwrap().push((processed, total));
        }

        fn finish(&mut self) {
            *self.finished.lock().unwrap() = true;
        }
    }

    #[test]
    fn test_status_line() {
        assert_eq!(status_line(0, 1990), "Processed 0 of 1990 zones (0%)");
        assert_eq!(status_line(995, 1990), "Processed 995 of 1990 zones (50%)");
        assert_eq!(status_line(1990, 1990), "Processed 1990 of 1990 zones (100%)");
    }

    #[tokio::test]
    async fn test_monitor_stops_at_total() {
        let counter = Arc::new(AtomicUsize::new(0));
        let sink = RecordingSink::default();
        let handle = spawn_progress_monitor(
            counter.clone(),
            3,
            Box::new(sink.clone()),
            CancellationToken::new(),
            Duration::from_millis(5),
        );

        for _ in 0..3 {
            tokio::time::sleep(Duration::from_millis(10)).await;
            counter.fetch_add(1, Ordering::Relaxed);
        }

        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("monitor should stop once the counter reaches the total")
            .unwrap();

        let reports = sink.reports.lock().unwrap();
        assert_eq!(reports.last(), Some(&(3, 3)));
        assert!(reports.windows(2).all(|w| w[0].0 <= w[1].0));
        assert!(*sink.finished.lock().unwrap());
    }

    #[tokio::test]
    async fn test_monitor_stops_on_cancel() {
        let counter = Arc::new(AtomicUsize::new(0));
        let cancel = CancellationToken::new();
        let sink = RecordingSink::default();
        let handle = spawn_progress_monitor(
            counter,
            10,
            Box::new(sink.clone()),
            cancel.clone(),
            Duration::from_millis(5),
        );

        tokio::time::sleep(Duration::from_millis(20)).await;
        cancel.cancel();

        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("monitor should stop when cancelled")
            .unwrap();
        assert!(*sink.finished.lock().unwrap());
    }
}
