//! # Readiness latch: first report wins.
//!
//! A task declares itself ready (or explicitly not ready) by calling
//! [`ReadyReporter::report`]. Tasks may report defensively, from a retry loop
//! or from several clones of the reporter; only the very first report counts.
//!
//! ```text
//! report(true)  ──► decided: false → true ──► try_send(true) ──► [slot] ──► recv() == Some(true)
//! report(false) ──► decided already true  ──► dropped
//! report(true)  ──► decided already true  ──► dropped
//! ```
//!
//! ## Rules
//! - `report` never blocks and never fails, whether or not a reader is waiting.
//! - The slot holds exactly one value; nothing beyond the first is ever buffered.
//! - If every reporter is dropped without reporting, `recv` yields `None`.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::mpsc;

/// Creates a connected reporter/receiver pair.
pub fn readiness_latch() -> (ReadyReporter, ReadinessReceiver) {
    let (tx, rx) = mpsc::channel(1);
    let reporter = ReadyReporter {
        decided: Arc::new(AtomicBool::new(false)),
        tx,
    };
    (reporter, ReadinessReceiver { rx })
}

/// Task-side handle used to report readiness. Cheap to clone.
#[derive(Clone, Debug)]
pub struct ReadyReporter {
    decided: Arc<AtomicBool>,
    tx: mpsc::Sender<bool>,
}

impl ReadyReporter {
    /// Reports readiness. Only the first call across all clones has any effect.
    pub fn report(&self, ready: bool) {
        if self.decided.swap(true, Ordering::AcqRel) {
            return;
        }
        // The slot is empty by construction; a closed receiver just means nobody cares anymore.
        let _ = self.tx.try_send(ready);
    }

    /// True once some clone has reported.
    pub fn has_reported(&self) -> bool {
        self.decided.load(Ordering::Acquire)
    }
}

/// Runner-side handle that receives the accepted readiness value.
#[derive(Debug)]
pub struct ReadinessReceiver {
    rx: mpsc::Receiver<bool>,
}

impl ReadinessReceiver {
    /// Waits for the accepted value; `None` if no report can arrive anymore.
    pub async fn recv(&mut self) -> Option<bool> {
        self.rx.recv().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::timeout;

    #[tokio::test]
    async fn first_report_wins() {
        let (reporter, mut rx) = readiness_latch();
        reporter.report(true);
        reporter.report(false);
        reporter.report(true);

        assert!(reporter.has_reported());
        assert_eq!(rx.recv().await, Some(true));
        drop(reporter);
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn negative_first_report_is_kept() {
        let (reporter, mut rx) = readiness_latch();
        let clone = reporter.clone();
        clone.report(false);
        reporter.report(true);
        assert_eq!(rx.recv().await, Some(false));
    }

    #[tokio::test]
    async fn report_does_not_block_without_reader() {
        let (reporter, rx) = readiness_latch();
        drop(rx);
        for i in 0..100 {
            reporter.report(i % 2 == 0);
        }
        assert!(reporter.has_reported());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_reporters_deliver_single_value() {
        let (reporter, mut rx) = readiness_latch();
        let mut handles = Vec::new();
        for i in 0..32 {
            let r = reporter.clone();
            handles.push(tokio::spawn(async move { r.report(i % 2 == 0) }));
        }
        for h in handles {
            h.await.unwrap();
        }
        drop(reporter);

        assert!(rx.recv().await.is_some());
        let second = timeout(Duration::from_millis(50), rx.recv()).await.unwrap();
        assert_eq!(second, None);
    }

    #[tokio::test]
    async fn dropped_reporter_without_report_yields_none() {
        let (reporter, mut rx) = readiness_latch();
        drop(reporter);
        assert_eq!(rx.recv().await, None);
    }
}
