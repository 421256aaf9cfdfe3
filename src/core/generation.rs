//! # Generations: one incarnation of the managed task.
//!
//! ```text
//! Constructing ─► Initializing ─┬─► InitFailed ─────────────────────────────────► Closed
//!                               └─► Listening + AwaitingReadiness
//!                                        ├─► Ready         (previous closed, becomes current)
//!                                        ├─► NotReady      (candidate closed)
//!                                        ├─► TimedOut      (candidate closed)
//!                                        ├─► ListenEnded   (candidate closed)
//!                                        └─► Shutdown      (closed by the shutdown watcher)
//! ```
//!
//! At most two generations are alive at once: the current one and a single
//! candidate racing to replace it.

use std::sync::Arc;

use tokio::sync::oneshot;

use crate::sync::{CloseOnce, WaitHandle};
use crate::tasks::Task;

/// A constructed and initialized task instance.
#[derive(Clone)]
pub(crate) struct Generation {
    /// Strictly increasing identifier, never reused.
    pub(crate) id: u64,
    /// Idempotent closer shared by every path that may close this generation.
    pub(crate) closer: Arc<CloseOnce<dyn Task>>,
}

/// How a candidate's readiness race was resolved.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Handoff {
    /// Candidate reported `true`; the previous generation was closed.
    Ready,
    /// Candidate reported `false`; the candidate was closed.
    NotReady,
    /// Readiness timeout elapsed first; the candidate was closed.
    TimedOut,
    /// Candidate's `listen` returned before it reported; the candidate was closed.
    ListenEnded,
    /// The root lifetime ended first; closing is left to the shutdown watchers.
    Shutdown,
}

impl Handoff {
    /// True if the candidate replaced the previous generation.
    pub fn is_swap(self) -> bool {
        matches!(self, Handoff::Ready)
    }
}

/// A generation whose three actions have been started.
pub(crate) struct Launch {
    pub(crate) generation: Generation,
    /// Completes once `listen`, the shutdown watcher, and the race have all finished.
    pub(crate) handle: WaitHandle,
    /// Delivers the race outcome as soon as it is decided.
    pub(crate) resolution: oneshot::Receiver<Handoff>,
}

/// Point-in-time view of which generations are alive.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GenerationSnapshot {
    /// Generation currently serving, if any.
    pub current: Option<u64>,
    /// Candidate awaiting readiness, if a handoff is in progress.
    pub candidate: Option<u64>,
}
