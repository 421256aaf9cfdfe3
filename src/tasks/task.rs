//! # Task contract.
//!
//! A [`Task`] is the caller's long-lived unit of work (an HTTP server, a
//! consumer loop, ...). The runner drives every instance through the same
//! lifecycle:
//!
//! ```text
//! factory(id, reporter) ──► initialize(ctx) ──► listen() ··· close()
//!                               │                  ▲           │
//!                               └─ Err ─► close()  └───────────┘
//!                                                (close may arrive at any time,
//!                                                 even before listen starts)
//! ```
//!
//! `listen` and `close` run concurrently on the same shared instance, so
//! implementors keep their mutable state behind atomics, tokens, or locks.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::TaskError;

/// # Something that can be shut down.
///
/// Closing must be safe while another caller is blocked in [`Task::listen`],
/// and must cause that `listen` to return.
#[async_trait]
pub trait Close: Send + Sync {
    /// Releases the resource.
    async fn close(&self) -> Result<(), TaskError>;
}

/// # Managed long-lived unit of work.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use tokio_util::sync::CancellationToken;
/// use taskrelay::{Close, Task, TaskError};
///
/// struct Ticker {
///     stop: CancellationToken,
/// }
///
/// #[async_trait]
/// impl Close for Ticker {
///     async fn close(&self) -> Result<(), TaskError> {
///         self.stop.cancel();
///         Ok(())
///     }
/// }
///
/// #[async_trait]
/// impl Task for Ticker {
///     async fn initialize(&self, _ctx: CancellationToken) -> Result<(), TaskError> {
///         Ok(())
///     }
///
///     async fn listen(&self) {
///         self.stop.cancelled().await;
///     }
/// }
/// ```
#[async_trait]
pub trait Task: Close + 'static {
    /// Loads whatever the task needs before it can serve.
    ///
    /// `ctx` is the runner's root lifetime; it is cancelled only when the whole
    /// runner shuts down, never when this generation loses a handoff.
    async fn initialize(&self, ctx: CancellationToken) -> Result<(), TaskError>;

    /// Runs the task's main loop until its work concludes or it is closed.
    async fn listen(&self);
}

/// Shared handle to a task instance.
pub type TaskRef = Arc<dyn Task>;
