//! # taskrelay
//!
//! **Taskrelay** supervises one long-lived task (an HTTP server, a consumer
//! loop, ...) and, on a reload trigger, replaces it with a freshly built
//! instance without a gap in service. A terminate trigger shuts everything
//! down gracefully.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   SIGHUP ──► SignalBridge(reload) ──┐        ┌── Runner::reload()
//!   SIGINT/SIGTERM ──► SignalBridge(terminate) ─┼── Runner::terminate() / close()
//!                                     ▼        ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Runner (generation loop)                                         │
//! │  - root CancellationToken (sole cancellation authority)           │
//! │  - trigger channels (capacity 1: bursts coalesce)                 │
//! │  - current generation (owned by the loop)                         │
//! │  - Bus (broadcast lifecycle events)                               │
//! └──────┬────────────────────────────────────────────────────────────┘
//!        ▼ factory(id, ReadyReporter) → initialize(root)
//!   ┌──────────────────────── await_all ────────────────────────┐
//!   │  listen()        shutdown watcher        readiness race    │
//!   │                  (root ended → close)    latch / deadline  │
//!   └────────────────────────────────────────────────────────────┘
//!        ▼
//!   ready == true  → close previous generation (swap)
//!   ready == false / timeout / listen ended → close candidate
//! ```
//!
//! ### Lifecycle
//! ```text
//! Runner::listen()
//!
//! loop {
//!   ├─► id += 1
//!   ├─► factory(id, reporter) ── None ─► wait for trigger
//!   ├─► initialize(root) ─────── Err ──► close candidate, wait for trigger
//!   ├─► spawn listen / shutdown watcher / readiness race
//!   ├─► wait for the race to resolve (at most two generations alive)
//!   └─► wait for trigger:
//!        - reload               ─► continue
//!        - terminate            ─► cancel root, exit
//!        - root cancelled       ─► exit
//! }
//!
//! On exit: drain every generation's wait handle, then return.
//! ```
//!
//! ## Features
//! | Area               | Description                                                     | Key types                                   |
//! |--------------------|-----------------------------------------------------------------|---------------------------------------------|
//! | **Supervision**    | Generation loop with readiness-gated handoff.                   | [`Runner`], [`RunnerBuilder`], [`Handoff`]  |
//! | **Tasks**          | The managed unit of work and its factory.                       | [`Task`], [`Close`], [`TaskFactory`]        |
//! | **Primitives**     | Idempotent close, readiness latch, fan-out wait.                | [`CloseOnce`], [`ReadyReporter`], [`await_all`] |
//! | **Signals**        | OS interrupts turned into debounced triggers.                   | [`Interrupt`], [`SignalBridge`]             |
//! | **Observability**  | Printf-style log sink and broadcast lifecycle events.           | [`Logger`], [`Event`], [`EventKind`]        |
//! | **Errors**         | Typed errors for the runner and for tasks.                      | [`RunnerError`], [`TaskError`]              |
//! | **Configuration**  | Plain-data settings with documented defaults.                   | [`Config`]                                  |
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use async_trait::async_trait;
//! use tokio_util::sync::CancellationToken;
//! use taskrelay::{Close, Config, ReadyReporter, RunnerBuilder, Task, TaskError, TaskRef};
//!
//! struct Server {
//!     ready: ReadyReporter,
//!     stop: CancellationToken,
//! }
//!
//! #[async_trait]
//! impl Close for Server {
//!     async fn close(&self) -> Result<(), TaskError> {
//!         self.stop.cancel();
//!         Ok(())
//!     }
//! }
//!
//! #[async_trait]
//! impl Task for Server {
//!     async fn initialize(&self, _ctx: CancellationToken) -> Result<(), TaskError> {
//!         Ok(())
//!     }
//!
//!     async fn listen(&self) {
//!         self.ready.report(true);
//!         self.stop.cancelled().await;
//!     }
//! }
//!
//! #[tokio::main(flavor = "multi_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let cfg = Config {
//!         task_name: "server".into(),
//!         reload_signals: vec![],
//!         terminate_signals: vec![],
//!         ..Config::default()
//!     };
//!
//!     let runner = RunnerBuilder::new(cfg)
//!         .with_task_factory(|_id, ready| {
//!             Some(Arc::new(Server { ready, stop: CancellationToken::new() }) as TaskRef)
//!         })
//!         .build()?;
//!
//!     let closer = Arc::clone(&runner);
//!     tokio::spawn(async move {
//!         tokio::time::sleep(Duration::from_millis(50)).await;
//!         closer.reload();
//!         tokio::time::sleep(Duration::from_millis(50)).await;
//!         let _ = closer.close();
//!     });
//!
//!     runner.listen().await;
//!     Ok(())
//! }
//! ```
mod core;
mod error;
mod events;
mod logger;
mod sync;
mod tasks;

// ---- Public re-exports ----

pub use crate::core::{
    Config, DEFAULT_READINESS_TIMEOUT, GenerationSnapshot, Handoff, Interrupt, InterruptSource,
    OsInterrupts, Runner, RunnerBuilder, SignalBridge,
};
pub use error::{RunnerError, TaskError};
pub use events::{Bus, Event, EventKind};
pub use logger::{Logger, LoggerRef, TracingLogger};
pub use sync::{
    CloseOnce, ReadinessReceiver, ReadyReporter, WaitHandle, await_all, readiness_latch,
};
pub use tasks::{Close, Task, TaskFactory, TaskRef};
