//! # Runner: generation loop and readiness-gated handoff.
//!
//! The [`Runner`] owns the root lifetime, the trigger channels, and the loop
//! that builds each new generation of the managed task.
//!
//! ## Architecture
//! ```text
//! listen()
//!   ├─► SignalBridge(reload)    ── burst ──► reload trigger    (capacity 1)
//!   ├─► SignalBridge(terminate) ── burst ──► terminate trigger (capacity 1)
//!   ├─► generation_loop() ─────────────────────────────────────────────┐
//!   │     loop {                                                       │
//!   │       start_next_generation(id, current)                         │
//!   │         ├─ factory(id, reporter) ── None ──► skip cycle          │
//!   │         ├─ initialize(root)      ── Err  ──► close, skip cycle   │
//!   │         └─ await_all[ listen | shutdown watcher | readiness race ] ──► WaitHandle
//!   │       await race outcome (the next generation waits for it)     │
//!   │       select { reload ─► continue, terminate ─► cancel root,     │
//!   │                root cancelled ─► break }                         │
//!   │     }                                                            │
//!   └─► drain every unfinished WaitHandle ◄────────────────────────────┘
//!
//! readiness race (per candidate):
//!   select {
//!     latch == true   ─► close previous   (swap)
//!     latch == false  ─► close candidate
//!     deadline ended  ─► timer elapsed / listen returned: close candidate
//!                        root ended: nothing (shutdown watcher closes)
//!     root ended      ─► nothing
//!   }
//! ```
//!
//! ## Rules
//! - Generation N+1 is never built before generation N's race has resolved,
//!   so at most two generations are alive at once.
//! - Exactly one of {previous, candidate} is closed by each resolved race.
//! - Every generation is closed exactly once, through its [`CloseOnce`].
//! - A generation's shutdown watcher stands down once it is closed, so only
//!   live generations are retained until shutdown.
//! - The current generation is owned by the loop alone; outside readers go
//!   through [`Runner::snapshot`].
//! - Nothing in here is fatal: every failure keeps whatever was already serving.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures::FutureExt;
use tokio::sync::{Mutex, broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::core::config::Config;
use crate::core::deadline::{DeadlineCause, ReadinessDeadline, ReleaseOnDrop};
use crate::core::generation::{Generation, GenerationSnapshot, Handoff, Launch};
use crate::core::signals::{OsInterrupts, SignalBridge};
use crate::error::RunnerError;
use crate::events::{Bus, Event, EventKind};
use crate::logger::{LoggerRef, logf};
use crate::sync::{CloseOnce, ReadinessReceiver, WaitHandle, await_all, readiness_latch};
use crate::tasks::{Task, TaskFactory};

/// Non-blocking, coalescing sender for one kind of trigger.
#[derive(Clone)]
struct Trigger {
    tx: mpsc::Sender<()>,
    root: CancellationToken,
}

impl Trigger {
    /// Enqueues the trigger unless the root has ended or one is already pending.
    fn fire(&self) -> bool {
        if self.root.is_cancelled() {
            return false;
        }
        self.tx.try_send(()).is_ok()
    }
}

/// Receiving halves of the trigger channels, owned by the loop.
struct Triggers {
    reload: mpsc::Receiver<()>,
    terminate: mpsc::Receiver<()>,
}

/// Supervises the lineage of a managed task across reloads.
pub struct Runner {
    cfg: Config,
    factory: TaskFactory,
    logger: LoggerRef,
    root: CancellationToken,
    bus: Bus,
    reload: Trigger,
    terminate: Trigger,
    triggers: Mutex<Option<Triggers>>,
    snapshot: watch::Sender<GenerationSnapshot>,
    closing: AtomicBool,
}

impl Runner {
    pub(crate) fn new_internal(
        cfg: Config,
        context: CancellationToken,
        factory: TaskFactory,
        logger: LoggerRef,
    ) -> Self {
        let root = context.child_token();
        let bus = Bus::new(cfg.bus_capacity_clamped());
        let (reload_tx, reload_rx) = mpsc::channel(1);
        let (terminate_tx, terminate_rx) = mpsc::channel(1);
        let (snapshot, _) = watch::channel(GenerationSnapshot::default());

        Self {
            cfg,
            factory,
            logger,
            reload: Trigger {
                tx: reload_tx,
                root: root.clone(),
            },
            terminate: Trigger {
                tx: terminate_tx,
                root: root.clone(),
            },
            root,
            bus,
            triggers: Mutex::new(Some(Triggers {
                reload: reload_rx,
                terminate: terminate_rx,
            })),
            snapshot,
            closing: AtomicBool::new(false),
        }
    }

    /// Runs the managed task until the runner is closed or terminated.
    ///
    /// Blocks until the generation loop has exited and every generation it
    /// started has finished listening and been closed.
    pub async fn listen(self: &Arc<Self>) {
        let Some(triggers) = self.triggers.lock().await.take() else {
            logf!(self.logger, "[WARN] {}", RunnerError::AlreadyListening);
            return;
        };

        logf!(
            self.logger,
            "[INFO] Running configured task [{}] at version [{}]...",
            self.cfg.task_name,
            self.cfg.task_version
        );
        self.bus.publish(Event::new(EventKind::RunnerStarting));

        let bridges = self.spawn_signal_bridges();
        let (waiters_tx, mut waiters_rx) = mpsc::unbounded_channel::<WaitHandle>();
        let generation_loop = tokio::spawn(Arc::clone(self).generation_loop(triggers, waiters_tx));

        let mut pending: Vec<WaitHandle> = Vec::new();
        while let Some(handle) = waiters_rx.recv().await {
            pending.retain(|h| !h.is_finished());
            pending.push(handle);
        }
        for handle in pending {
            handle.wait().await;
        }
        if let Err(err) = generation_loop.await {
            logf!(self.logger, "[WARN] Generation loop ended abnormally: {err}");
            self.root.cancel();
        }
        for bridge in bridges {
            let _ = bridge.await;
        }

        self.snapshot.send_replace(GenerationSnapshot::default());
        self.bus.publish(Event::new(EventKind::RunnerStopped));
        logf!(
            self.logger,
            "[INFO] The configured runner has completed execution of all specified tasks."
        );
    }

    /// Shuts the runner down: ends the root lifetime, which closes every generation.
    ///
    /// Idempotent and non-blocking; `listen` returns once everything has drained.
    pub fn close(&self) -> Result<(), RunnerError> {
        if !self.closing.swap(true, Ordering::AcqRel) {
            logf!(
                self.logger,
                "[INFO] Request to close runner received, shutting down runner along with any associated task(s)..."
            );
        }
        self.root.cancel();
        Ok(())
    }

    /// Requests a new generation. Bursts collapse into one pending reload.
    pub fn reload(&self) {
        self.reload.fire();
    }

    /// Requests termination, as a terminate-class interrupt would.
    pub fn terminate(&self) {
        self.terminate.fire();
    }

    /// Which generations are alive right now.
    pub fn snapshot(&self) -> GenerationSnapshot {
        *self.snapshot.borrow()
    }

    /// Watches [`snapshot`](Self::snapshot) for changes.
    pub fn watch_snapshot(&self) -> watch::Receiver<GenerationSnapshot> {
        self.snapshot.subscribe()
    }

    /// Subscribes to lifecycle events published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.bus.subscribe()
    }

    /// The runner's plain-data settings.
    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// True once the root lifetime has ended.
    pub fn is_closed(&self) -> bool {
        self.root.is_cancelled()
    }

    /// Starts the reload and terminate bridges; registration failures are logged and skipped.
    fn spawn_signal_bridges(&self) -> Vec<JoinHandle<usize>> {
        let wiring = [
            ("reload", &self.cfg.reload_signals, self.reload.clone()),
            ("terminate", &self.cfg.terminate_signals, self.terminate.clone()),
        ];

        let mut bridges = Vec::with_capacity(wiring.len());
        for (name, watching, trigger) in wiring {
            if watching.is_empty() {
                continue;
            }
            match OsInterrupts::register(watching) {
                Ok(source) => {
                    let bridge = SignalBridge::new(name, source, self.root.clone(), move || {
                        trigger.fire();
                    });
                    bridges.push(tokio::spawn(bridge.run()));
                }
                Err(source) => {
                    let err = RunnerError::SignalRegistration { name, source };
                    logf!(self.logger, "[WARN] {err}");
                }
            }
        }
        bridges
    }

    async fn generation_loop(
        self: Arc<Self>,
        mut triggers: Triggers,
        waiters: mpsc::UnboundedSender<WaitHandle>,
    ) {
        let mut current: Option<Generation> = None;
        let mut next_id: u64 = 0;

        loop {
            let id = next_id;
            next_id += 1;

            if let Some(launch) = self.start_next_generation(id, current.as_ref()).await {
                let _ = waiters.send(launch.handle.clone());
                self.publish_snapshot(current.as_ref(), Some(id));

                // A dropped sender means the race action died; keep the previous generation.
                let outcome = launch.resolution.await.unwrap_or(Handoff::Shutdown);
                if outcome.is_swap() {
                    current = Some(launch.generation);
                }
                self.publish_snapshot(current.as_ref(), None);
            }

            tokio::select! {
                biased;
                _ = self.root.cancelled() => {
                    self.bus.publish(Event::new(EventKind::ShutdownRequested));
                    break;
                }
                Some(()) = triggers.terminate.recv() => {
                    logf!(self.logger, "[INFO] Terminate requested; shutting down.");
                    self.bus.publish(Event::new(EventKind::TerminateRequested));
                    self.root.cancel();
                    self.bus.publish(Event::new(EventKind::ShutdownRequested));
                    break;
                }
                Some(()) = triggers.reload.recv() => {
                    self.bus.publish(Event::new(EventKind::ReloadRequested));
                }
            }
        }

        self.root.cancel();
    }

    /// Builds, initializes, and launches generation `id` alongside `previous`.
    ///
    /// Returns `None` when there is no candidate this cycle.
    async fn start_next_generation(
        self: &Arc<Self>,
        id: u64,
        previous: Option<&Generation>,
    ) -> Option<Launch> {
        let (reporter, readiness) = readiness_latch();
        let Some(task) = (self.factory)(id, reporter) else {
            logf!(self.logger, "[WARN] No task created for ID [{id}].");
            self.bus
                .publish(Event::new(EventKind::GenerationMissing).with_generation(id));
            return None;
        };
        self.bus
            .publish(Event::new(EventKind::GenerationCreated).with_generation(id));

        let closer: Arc<CloseOnce<dyn Task>> = Arc::new(CloseOnce::new(Some(Arc::clone(&task))));
        let deadline = Arc::new(ReadinessDeadline::start(
            &self.root,
            self.cfg.readiness_timeout(),
        ));

        if let Err(err) = task.initialize(self.root.clone()).await {
            logf!(self.logger, "[WARN] Unable to initialize task [{id}]: {err}");
            self.bus.publish(
                Event::new(EventKind::InitFailed)
                    .with_generation(id)
                    .with_reason(err.to_string()),
            );
            deadline.release();
            self.close_generation(id, &closer).await;
            return None;
        }

        let generation = Generation {
            id,
            closer: Arc::clone(&closer),
        };
        let (resolved_tx, resolved_rx) = oneshot::channel();

        let listen = {
            let runner = Arc::clone(self);
            let release = ReleaseOnDrop::new(Arc::clone(&deadline));
            async move {
                let _release = release;
                runner
                    .bus
                    .publish(Event::new(EventKind::GenerationListening).with_generation(id));
                task.listen().await;
                logf!(runner.logger, "[INFO] Task [{id}] finished listening.");
                runner
                    .bus
                    .publish(Event::new(EventKind::ListenEnded).with_generation(id));
            }
            .boxed()
        };

        let watch_shutdown = {
            let runner = Arc::clone(self);
            let closer = Arc::clone(&closer);
            async move {
                tokio::select! {
                    _ = runner.root.cancelled() => runner.close_generation(id, &closer).await,
                    _ = closer.closed() => {}
                }
            }
            .boxed()
        };

        let race = {
            let runner = Arc::clone(self);
            let previous = previous.cloned();
            async move {
                let outcome = runner
                    .race(id, readiness, &deadline, &closer, previous.as_ref())
                    .await;
                deadline.release();
                let _ = resolved_tx.send(outcome);
            }
            .boxed()
        };

        let handle = await_all([Some(listen), Some(watch_shutdown), Some(race)]);
        Some(Launch {
            generation,
            handle,
            resolution: resolved_rx,
        })
    }

    /// Resolves the candidate's readiness race and closes the loser.
    async fn race(
        &self,
        id: u64,
        mut readiness: ReadinessReceiver,
        deadline: &ReadinessDeadline,
        candidate: &CloseOnce<dyn Task>,
        previous: Option<&Generation>,
    ) -> Handoff {
        tokio::select! {
            biased;
            Some(ready) = readiness.recv() => {
                if ready {
                    logf!(self.logger, "[INFO] Pending task [{id}] has arrived at a ready state.");
                    self.bus
                        .publish(Event::new(EventKind::GenerationReady).with_generation(id));
                    if let Some(previous) = previous {
                        logf!(self.logger, "[INFO] Shutting down previous task.");
                        self.close_generation(previous.id, &previous.closer).await;
                    }
                    Handoff::Ready
                } else {
                    logf!(self.logger, "[WARN] Pending task [{id}] did not arrive at a ready state.");
                    self.bus.publish(
                        Event::new(EventKind::GenerationRejected)
                            .with_generation(id)
                            .with_reason("reported not ready"),
                    );
                    self.reject(id, candidate).await;
                    Handoff::NotReady
                }
            }
            _ = self.root.cancelled() => Handoff::Shutdown,
            _ = deadline.ended() => match deadline.cause() {
                DeadlineCause::Shutdown => Handoff::Shutdown,
                DeadlineCause::Elapsed => {
                    logf!(
                        self.logger,
                        "[WARN] Pending task [{id}] failed to report readiness before configured timeout of [{:?}].",
                        deadline.after()
                    );
                    self.bus.publish(
                        Event::new(EventKind::ReadinessTimeout)
                            .with_generation(id)
                            .with_timeout(deadline.after()),
                    );
                    self.reject(id, candidate).await;
                    Handoff::TimedOut
                }
                DeadlineCause::Released => {
                    logf!(
                        self.logger,
                        "[WARN] Pending task [{id}] stopped listening before reporting readiness."
                    );
                    self.bus.publish(
                        Event::new(EventKind::GenerationRejected)
                            .with_generation(id)
                            .with_reason("stopped listening before reporting readiness"),
                    );
                    self.reject(id, candidate).await;
                    Handoff::ListenEnded
                }
            },
        }
    }

    /// Closes a losing candidate; the previous generation keeps serving.
    async fn reject(&self, id: u64, candidate: &CloseOnce<dyn Task>) {
        self.close_generation(id, candidate).await;
        logf!(self.logger, "[INFO] Continuing with previous task.");
    }

    /// Closes a generation through its idempotent closer; errors are logged, never propagated.
    async fn close_generation(&self, id: u64, closer: &CloseOnce<dyn Task>) {
        match closer.try_close().await {
            Some(Ok(())) => {
                self.bus
                    .publish(Event::new(EventKind::GenerationClosed).with_generation(id));
            }
            Some(Err(err)) => {
                logf!(self.logger, "[WARN] Unable to close task [{id}]: {err}");
                self.bus.publish(
                    Event::new(EventKind::CloseFailed)
                        .with_generation(id)
                        .with_reason(err.to_string()),
                );
            }
            None => {}
        }
    }

    fn publish_snapshot(&self, current: Option<&Generation>, candidate: Option<u64>) {
        self.snapshot.send_replace(GenerationSnapshot {
            current: current.map(|g| g.id),
            candidate,
        });
    }
}
