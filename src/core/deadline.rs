//! # Time-bounded readiness lifetime.
//!
//! A [`ReadinessDeadline`] is a child of the runner's root lifetime that bounds
//! how long a candidate generation may take to report readiness.
//!
//! ## Rules
//! - The deadline ends when its timer elapses, when it is [released](ReadinessDeadline::release)
//!   (the candidate's `listen` returned), or when the root lifetime ends.
//! - Ending the deadline never ends the root.
//! - [`cause`](ReadinessDeadline::cause) tells the three endings apart.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio_util::sync::CancellationToken;

/// Why a deadline ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum DeadlineCause {
    /// The configured readiness timeout elapsed.
    Elapsed,
    /// The deadline was released before the timer fired.
    Released,
    /// The root lifetime ended.
    Shutdown,
}

/// Child lifetime that ends after a fixed duration.
pub(crate) struct ReadinessDeadline {
    token: CancellationToken,
    root: CancellationToken,
    elapsed: Arc<AtomicBool>,
    after: Duration,
}

impl ReadinessDeadline {
    /// Derives the deadline from `root` and arms its timer.
    pub(crate) fn start(root: &CancellationToken, after: Duration) -> Self {
        let token = root.child_token();
        let elapsed = Arc::new(AtomicBool::new(false));

        let timer_token = token.clone();
        let timer_elapsed = Arc::clone(&elapsed);
        tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(after) => {
                    timer_elapsed.store(true, Ordering::Release);
                    timer_token.cancel();
                }
                _ = timer_token.cancelled() => {}
            }
        });

        Self {
            token,
            root: root.clone(),
            elapsed,
            after,
        }
    }

    /// Ends the deadline and stops its timer.
    pub(crate) fn release(&self) {
        self.token.cancel();
    }

    /// Completes once the deadline has ended for any reason.
    pub(crate) async fn ended(&self) {
        self.token.cancelled().await;
    }

    /// The configured duration.
    pub(crate) fn after(&self) -> Duration {
        self.after
    }

    /// Why the deadline ended; only meaningful after [`ended`](Self::ended) completed.
    pub(crate) fn cause(&self) -> DeadlineCause {
        if self.root.is_cancelled() {
            DeadlineCause::Shutdown
        } else if self.elapsed.load(Ordering::Acquire) {
            DeadlineCause::Elapsed
        } else {
            DeadlineCause::Released
        }
    }
}

/// Releases a deadline when dropped, so an unwinding `listen` still ends it.
pub(crate) struct ReleaseOnDrop(Arc<ReadinessDeadline>);

impl ReleaseOnDrop {
    pub(crate) fn new(deadline: Arc<ReadinessDeadline>) -> Self {
        Self(deadline)
    }
}

impl Drop for ReleaseOnDrop {
    fn drop(&mut self) {
        self.0.release();
    }
}
