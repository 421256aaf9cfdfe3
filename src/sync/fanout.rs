//! # Fan-out synchronizer.
//!
//! [`await_all`] starts a set of independent actions concurrently and returns
//! one [`WaitHandle`] that completes after all of them have finished.
//!
//! ## Rules
//! - Absent actions (`None`) are skipped and do not count.
//! - Actions are spawned immediately; dropping the handle does **not** abort them.
//! - A panic inside one action ends that action only; the others keep running
//!   and `wait` still completes.
//!
//! The runner uses this to run a generation's `listen`, shutdown watcher, and
//! readiness race side by side.

use futures::future::BoxFuture;
use tokio_util::task::TaskTracker;

/// Spawns every present action and returns a handle that waits for all of them.
pub fn await_all<I>(actions: I) -> WaitHandle
where
    I: IntoIterator<Item = Option<BoxFuture<'static, ()>>>,
{
    let tracker = TaskTracker::new();
    let mut started = 0;
    for action in actions.into_iter().flatten() {
        tracker.spawn(action);
        started += 1;
    }
    tracker.close();
    WaitHandle { tracker, started }
}

/// Completion handle for a group of actions started by [`await_all`].
#[derive(Clone, Debug)]
pub struct WaitHandle {
    tracker: TaskTracker,
    started: usize,
}

impl WaitHandle {
    /// Waits until every started action has finished.
    pub async fn wait(&self) {
        self.tracker.wait().await;
    }

    /// Number of actions that were started.
    pub fn len(&self) -> usize {
        self.started
    }

    /// True if no action was started.
    pub fn is_empty(&self) -> bool {
        self.started == 0
    }

    /// True once every started action has finished.
    pub fn is_finished(&self) -> bool {
        self.tracker.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::Notify;
    use tokio::time::timeout;

    #[tokio::test]
    async fn empty_set_completes_immediately() {
        let handle = await_all(Vec::new());
        assert!(handle.is_empty());
        timeout(Duration::from_millis(50), handle.wait()).await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn waits_for_every_action_and_skips_absent_ones() {
        let done = Arc::new(AtomicUsize::new(0));
        let gate = Arc::new(Notify::new());

        let slow = {
            let (done, gate) = (Arc::clone(&done), Arc::clone(&gate));
            async move {
                gate.notified().await;
                done.fetch_add(1, Ordering::SeqCst);
            }
            .boxed()
        };
        let fast = {
            let done = Arc::clone(&done);
            async move {
                done.fetch_add(1, Ordering::SeqCst);
            }
            .boxed()
        };

        let handle = await_all([Some(slow), None, Some(fast)]);
        assert_eq!(handle.len(), 2);

        assert!(timeout(Duration::from_millis(50), handle.wait()).await.is_err());
        assert!(!handle.is_finished());

        gate.notify_one();
        timeout(Duration::from_secs(1), handle.wait()).await.unwrap();
        assert_eq!(done.load(Ordering::SeqCst), 2);
        assert!(handle.is_finished());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn panicking_action_does_not_stop_siblings() {
        let done = Arc::new(AtomicUsize::new(0));
        #[allow(unreachable_code)]
        let boom: BoxFuture<'static, ()> = async { panic!("action failed") }.boxed();
        let ok = {
            let done = Arc::clone(&done);
            async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                done.fetch_add(1, Ordering::SeqCst);
            }
            .boxed()
        };

        let handle = await_all([Some(boom), Some(ok)]);
        timeout(Duration::from_secs(1), handle.wait()).await.unwrap();
        assert_eq!(done.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn dropping_handle_does_not_abort_actions() {
        let done = Arc::new(AtomicUsize::new(0));
        let action = {
            let done = Arc::clone(&done);
            async move {
                tokio::time::sleep(Duration::from_millis(10)).await;
                done.fetch_add(1, Ordering::SeqCst);
            }
            .boxed()
        };

        drop(await_all([Some(action)]));
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(done.load(Ordering::SeqCst), 1);
    }
}
