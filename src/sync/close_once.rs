//! # Idempotent close.
//!
//! [`CloseOnce`] wraps a closable resource so that any number of concurrent
//! close requests run the underlying [`Close::close`] exactly once.
//!
//! ## Rules
//! - The first caller wins an atomic test-and-set and runs the real close.
//! - Every later caller returns `Ok(())` immediately; it does **not** wait for
//!   the first caller's close to finish.
//! - Wrapping `None` yields a closer whose `close` is a no-op.
//! - [`closed`](CloseOnce::closed) completes once the winning close has returned.
//!
//! Within a runner, the same generation may be closed by the shutdown watcher,
//! by the readiness race (as the losing candidate or as the replaced previous
//! generation), and by the initialize-failure path; all of them go through here.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio_util::sync::CancellationToken;

use crate::error::TaskError;
use crate::tasks::Close;

/// Runs a wrapped resource's close at most once.
pub struct CloseOnce<C: Close + ?Sized> {
    resource: Option<Arc<C>>,
    closed: AtomicBool,
    done: CancellationToken,
}

impl<C: Close + ?Sized> CloseOnce<C> {
    /// Wraps `resource`.
    pub fn new(resource: Option<Arc<C>>) -> Self {
        Self {
            resource,
            closed: AtomicBool::new(false),
            done: CancellationToken::new(),
        }
    }

    /// Closes the resource if nobody has yet.
    ///
    /// Only the first caller observes the underlying result; everyone else gets `Ok(())`.
    pub async fn close(&self) -> Result<(), TaskError> {
        self.try_close().await.unwrap_or(Ok(()))
    }

    /// Like [`close`](Self::close), but tells the callers apart.
    ///
    /// Returns `Some(result)` to the caller that ran the underlying close and
    /// `None` to every other caller.
    pub async fn try_close(&self) -> Option<Result<(), TaskError>> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return None;
        }
        let result = match &self.resource {
            Some(resource) => resource.close().await,
            None => Ok(()),
        };
        self.done.cancel();
        Some(result)
    }

    /// Completes once the underlying close has returned, whatever its result.
    pub async fn closed(&self) {
        self.done.cancelled().await;
    }

    /// True once some caller has dispatched the underlying close.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// The wrapped resource, if any.
    pub fn resource(&self) -> Option<&Arc<C>> {
        self.resource.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    struct Counted {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl Close for Counted {
        async fn close(&self) -> Result<(), TaskError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(5)).await;
            if self.fail {
                Err(TaskError::fail("boom"))
            } else {
                Ok(())
            }
        }
    }

    fn counted(fail: bool) -> Arc<Counted> {
        Arc::new(Counted {
            calls: AtomicUsize::new(0),
            fail,
        })
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_closers_run_underlying_close_once() {
        let inner = counted(false);
        let closer = Arc::new(CloseOnce::new(Some(Arc::clone(&inner))));

        let mut handles = Vec::new();
        for _ in 0..64 {
            let closer = Arc::clone(&closer);
            handles.push(tokio::spawn(async move { closer.close().await }));
        }
        for h in handles {
            assert!(h.await.unwrap().is_ok());
        }

        assert_eq!(inner.calls.load(Ordering::SeqCst), 1);
        assert!(closer.is_closed());
    }

    #[tokio::test]
    async fn only_first_caller_sees_close_error() {
        let inner = counted(true);
        let closer = CloseOnce::new(Some(Arc::clone(&inner)));

        assert!(matches!(closer.close().await, Err(TaskError::Fail { .. })));
        assert!(closer.close().await.is_ok());
        assert_eq!(inner.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn try_close_reports_the_winning_caller() {
        let inner = counted(false);
        let closer = CloseOnce::new(Some(Arc::clone(&inner)));

        assert!(matches!(closer.try_close().await, Some(Ok(()))));
        assert!(closer.try_close().await.is_none());
        assert_eq!(inner.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn closed_completes_after_underlying_close_returns() {
        let inner = counted(true);
        let closer = Arc::new(CloseOnce::new(Some(Arc::clone(&inner))));

        let waiter = {
            let closer = Arc::clone(&closer);
            tokio::spawn(async move { closer.closed().await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        assert!(closer.close().await.is_err());
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
        tokio::time::timeout(Duration::from_millis(50), closer.closed())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn none_resource_is_noop() {
        let closer: CloseOnce<Counted> = CloseOnce::new(None);
        assert!(!closer.is_closed());
        assert!(closer.close().await.is_ok());
        assert!(closer.close().await.is_ok());
        assert!(closer.is_closed());
    }
}
