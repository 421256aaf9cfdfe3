//! # Lifecycle events emitted by the runner.
//!
//! The [`EventKind`] enum classifies events in three groups:
//! - **Runner events**: start, stop, triggers (reload / terminate / shutdown)
//! - **Generation events**: creation, initialization, listening, closing
//! - **Handoff events**: how a candidate's readiness race was resolved
//!
//! The [`Event`] struct carries the metadata: sequence number, timestamp,
//! generation id, reason, and readiness timeout.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Use `seq` to restore the exact order when events are observed out of order.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use taskrelay::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::ReadinessTimeout)
//!     .with_generation(3)
//!     .with_timeout(Duration::from_millis(50));
//!
//! assert_eq!(ev.kind, EventKind::ReadinessTimeout);
//! assert_eq!(ev.generation, Some(3));
//! assert_eq!(ev.timeout_ms, Some(50));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Runner events ===
    /// `listen` was entered; the generation loop is about to start.
    RunnerStarting,

    /// The loop and every generation it spawned have drained.
    RunnerStopped,

    /// A reload trigger was accepted by the loop.
    ReloadRequested,

    /// A terminate trigger was accepted by the loop.
    TerminateRequested,

    /// The root lifetime ended (explicit close, terminate, or parent cancellation).
    ShutdownRequested,

    // === Generation events ===
    /// The factory produced a candidate.
    ///
    /// Sets: `generation`.
    GenerationCreated,

    /// The factory returned no candidate.
    ///
    /// Sets: `generation`.
    GenerationMissing,

    /// The candidate's `initialize` failed; it has been closed.
    ///
    /// Sets: `generation`, `reason`.
    InitFailed,

    /// The candidate's `listen` was started.
    ///
    /// Sets: `generation`.
    GenerationListening,

    /// The generation's `listen` returned.
    ///
    /// Sets: `generation`.
    ListenEnded,

    /// The generation's underlying close ran successfully.
    ///
    /// Sets: `generation`.
    GenerationClosed,

    /// The generation's underlying close returned an error.
    ///
    /// Sets: `generation`, `reason`.
    CloseFailed,

    // === Handoff events ===
    /// The candidate reported ready and became current.
    ///
    /// Sets: `generation`.
    GenerationReady,

    /// The candidate reported not-ready, or stopped listening before reporting.
    ///
    /// Sets: `generation`, `reason`.
    GenerationRejected,

    /// The candidate did not report before the readiness timeout.
    ///
    /// Sets: `generation`, `timeout_ms`.
    ReadinessTimeout,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,
    /// Generation the event refers to, if any.
    pub generation: Option<u64>,
    /// Human-readable reason (errors, rejection details).
    pub reason: Option<Arc<str>>,
    /// Readiness timeout in milliseconds (compact).
    pub timeout_ms: Option<u32>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            generation: None,
            reason: None,
            timeout_ms: None,
        }
    }

    /// Attaches a generation id.
    #[inline]
    pub fn with_generation(mut self, id: u64) -> Self {
        self.generation = Some(id);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches a timeout duration (stored as milliseconds).
    #[inline]
    pub fn with_timeout(mut self, d: Duration) -> Self {
        let ms = d.as_millis().min(u128::from(u32::MAX)) as u32;
        self.timeout_ms = Some(ms);
        self
    }

    /// True if this event refers to generation `id`.
    #[inline]
    pub fn is_for(&self, id: u64) -> bool {
        self.generation == Some(id)
    }
}
