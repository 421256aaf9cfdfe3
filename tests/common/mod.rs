#![allow(dead_code)]

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Notify, broadcast};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{EnvFilter, fmt as tracing_fmt};

use taskrelay::{
    Close, Config, Event, EventKind, Logger, ReadyReporter, Runner, RunnerBuilder, Task,
    TaskError, TaskRef,
};

static INIT: Once = Once::new();

/// Initialise tracing for tests.
///
/// Logs are captured per-test and only printed for failing tests
/// (unless run with `-- --nocapture`). Enable levels with `RUST_LOG=debug`.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        tracing_fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .init();
    });
}

/// Upper bound for any single wait in a test.
pub const PATIENCE: Duration = Duration::from_secs(5);

/// Logger that remembers every line it was given.
#[derive(Default)]
pub struct RecordingLogger {
    prefix: &'static str,
    history: Mutex<Vec<String>>,
}

impl RecordingLogger {
    pub fn new(prefix: &'static str) -> Arc<Self> {
        Arc::new(Self {
            prefix,
            history: Mutex::new(Vec::new()),
        })
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.count(needle) > 0
    }

    pub fn count(&self, needle: &str) -> usize {
        self.history
            .lock()
            .unwrap()
            .iter()
            .filter(|line| line.contains(needle))
            .count()
    }

    pub fn lines(&self) -> Vec<String> {
        self.history.lock().unwrap().clone()
    }
}

impl Logger for RecordingLogger {
    fn printf(&self, args: fmt::Arguments<'_>) {
        let line = args.to_string();
        tracing::debug!(prefix = self.prefix, "{line}");
        self.history.lock().unwrap().push(line);
    }
}

/// How a [`TestTask`] reports readiness once it starts listening.
#[derive(Clone)]
pub enum Readiness {
    /// Report the value, then the opposite, then the value again.
    Report(bool),
    /// Never report.
    Omit,
    /// Report `true` only after the gate is opened.
    Gated(Arc<Notify>),
    /// Return from `listen` immediately without reporting.
    ReturnEarly,
    /// Panic inside `listen` without reporting.
    Panic,
}

/// Task that counts its lifecycle calls.
pub struct TestTask {
    readiness: Readiness,
    init_err: Option<&'static str>,
    close_err: Option<&'static str>,
    reporter: Mutex<Option<ReadyReporter>>,
    init_ctx: Mutex<Option<CancellationToken>>,
    stop: CancellationToken,
    pub initialized: AtomicUsize,
    pub listened: AtomicUsize,
    pub closed: AtomicUsize,
}

impl TestTask {
    pub fn new(readiness: Readiness) -> Arc<Self> {
        Self::build(readiness, None, None)
    }

    pub fn failing_init(error: &'static str) -> Arc<Self> {
        Self::build(Readiness::Omit, Some(error), None)
    }

    pub fn failing_close(readiness: Readiness, error: &'static str) -> Arc<Self> {
        Self::build(readiness, None, Some(error))
    }

    fn build(
        readiness: Readiness,
        init_err: Option<&'static str>,
        close_err: Option<&'static str>,
    ) -> Arc<Self> {
        Arc::new(Self {
            readiness,
            init_err,
            close_err,
            reporter: Mutex::new(None),
            init_ctx: Mutex::new(None),
            stop: CancellationToken::new(),
            initialized: AtomicUsize::new(0),
            listened: AtomicUsize::new(0),
            closed: AtomicUsize::new(0),
        })
    }

    pub fn counts(&self) -> (usize, usize, usize) {
        (
            self.initialized.load(Ordering::SeqCst),
            self.listened.load(Ordering::SeqCst),
            self.closed.load(Ordering::SeqCst),
        )
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    /// The lifetime handed to `initialize`, if it was called.
    pub fn init_ctx(&self) -> Option<CancellationToken> {
        self.init_ctx.lock().unwrap().clone()
    }

    fn reporter(&self) -> Option<ReadyReporter> {
        self.reporter.lock().unwrap().clone()
    }
}

#[async_trait]
impl Close for TestTask {
    async fn close(&self) -> Result<(), TaskError> {
        self.closed.fetch_add(1, Ordering::SeqCst);
        self.stop.cancel();
        match self.close_err {
            Some(err) => Err(TaskError::fail(err)),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl Task for TestTask {
    async fn initialize(&self, ctx: CancellationToken) -> Result<(), TaskError> {
        self.initialized.fetch_add(1, Ordering::SeqCst);
        *self.init_ctx.lock().unwrap() = Some(ctx);
        match self.init_err {
            Some(err) => Err(TaskError::fail(err)),
            None => Ok(()),
        }
    }

    async fn listen(&self) {
        self.listened.fetch_add(1, Ordering::SeqCst);
        let reporter = self.reporter();
        match (&self.readiness, reporter) {
            (Readiness::Report(ready), Some(r)) => {
                r.report(*ready);
                r.report(!*ready);
                r.report(*ready);
            }
            (Readiness::Gated(gate), Some(r)) => {
                tokio::select! {
                    _ = gate.notified() => r.report(true),
                    _ = self.stop.cancelled() => return,
                }
            }
            (Readiness::ReturnEarly, _) => return,
            (Readiness::Panic, _) => panic!("listen blew up"),
            _ => {}
        }
        self.stop.cancelled().await;
    }
}

/// Serves `tasks[id]` for generation `id`, and nothing past the end.
pub struct Fixture {
    pub tasks: Vec<Arc<TestTask>>,
    pub built: Arc<AtomicUsize>,
    pub logger: Arc<RecordingLogger>,
}

impl Fixture {
    pub fn new(tasks: Vec<Arc<TestTask>>) -> Self {
        init_tracing();
        Self {
            tasks,
            built: Arc::new(AtomicUsize::new(0)),
            logger: RecordingLogger::new("RUNNER"),
        }
    }

    pub fn config() -> Config {
        Config {
            task_name: "fixture".to_string(),
            task_version: "0".to_string(),
            reload_signals: vec![],
            terminate_signals: vec![],
            ..Config::default()
        }
    }

    pub fn builder(&self, cfg: Config) -> RunnerBuilder {
        let tasks = self.tasks.clone();
        let built = Arc::clone(&self.built);
        RunnerBuilder::new(cfg)
            .with_logger(self.logger.clone())
            .with_task_factory(move |id, ready| {
                let task = tasks.get(id as usize)?;
                built.fetch_add(1, Ordering::SeqCst);
                *task.reporter.lock().unwrap() = Some(ready);
                Some(Arc::clone(task) as TaskRef)
            })
    }

    pub fn runner(&self) -> Arc<Runner> {
        self.builder(Self::config()).build().unwrap()
    }

    pub fn built(&self) -> usize {
        self.built.load(Ordering::SeqCst)
    }
}

/// Runs `listen` in the background.
pub fn spawn_listen(runner: &Arc<Runner>) -> JoinHandle<()> {
    let runner = Arc::clone(runner);
    tokio::spawn(async move { runner.listen().await })
}

/// Waits until `listen` returns.
pub async fn finish(handle: JoinHandle<()>) {
    timeout(PATIENCE, handle)
        .await
        .expect("listen did not return in time")
        .expect("listen panicked");
}

/// Polls `cond` until it holds.
pub async fn eventually<F>(what: &str, cond: F)
where
    F: Fn() -> bool,
{
    let reached = timeout(PATIENCE, async {
        while !cond() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await;
    assert!(reached.is_ok(), "timed out waiting for {what}");
}

/// Waits for the next event of `kind` concerning generation `id`.
pub async fn wait_for(rx: &mut broadcast::Receiver<Event>, kind: EventKind, id: u64) -> Event {
    wait_until(rx, |ev| ev.kind == kind && ev.is_for(id)).await
}

/// Waits for the next event matching `pred`.
pub async fn wait_until<P>(rx: &mut broadcast::Receiver<Event>, pred: P) -> Event
where
    P: Fn(&Event) -> bool,
{
    let found = timeout(PATIENCE, async {
        loop {
            match rx.recv().await {
                Ok(ev) if pred(&ev) => return ev,
                Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => panic!("event bus closed"),
            }
        }
    })
    .await;
    found.expect("timed out waiting for event")
}
