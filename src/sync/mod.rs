//! Synchronization primitives the runner is built from.
//!
//! - [`CloseOnce`]: idempotent, race-free close of a shared resource
//! - [`readiness_latch`]: first-report-wins readiness handoff
//! - [`await_all`]: fan-out of independent actions with a single wait handle

mod close_once;
mod fanout;
mod latch;

pub use close_once::CloseOnce;
pub use fanout::{WaitHandle, await_all};
pub use latch::{ReadinessReceiver, ReadyReporter, readiness_latch};
