//! Reloadable task that prints a message read from a JSON file.
//!
//! ```text
//! echo '{"message":"hello"}' > config.json
//! cargo run --example json_task -- config.json
//! kill -HUP <pid>     # re-reads config.json into a new generation
//! kill -INT <pid>     # shuts down
//! ```

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use taskrelay::{
    Close, Config, Interrupt, ReadyReporter, RunnerBuilder, Task, TaskError, TaskRef,
};

#[derive(Debug, Deserialize)]
struct ConfigFile {
    message: String,
}

fn load_config(path: &PathBuf) -> anyhow::Result<ConfigFile> {
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

struct Application {
    id: u64,
    path: PathBuf,
    ready: ReadyReporter,
    config: Mutex<Option<ConfigFile>>,
    lifetime: Mutex<Option<CancellationToken>>,
    stop: CancellationToken,
}

impl Application {
    fn message(&self) -> String {
        self.config
            .lock()
            .unwrap()
            .as_ref()
            .map(|c| c.message.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Close for Application {
    async fn close(&self) -> Result<(), TaskError> {
        tracing::info!(id = self.id, "closing task");
        self.stop.cancel();
        Ok(())
    }
}

#[async_trait]
impl Task for Application {
    async fn initialize(&self, ctx: CancellationToken) -> Result<(), TaskError> {
        let config = load_config(&self.path).map_err(TaskError::fail)?;
        *self.config.lock().unwrap() = Some(config);
        *self.lifetime.lock().unwrap() = Some(ctx);
        Ok(())
    }

    async fn listen(&self) {
        self.ready.report(true);

        let lifetime = self.lifetime.lock().unwrap().clone().unwrap_or_default();
        let mut ticks = tokio::time::interval(Duration::from_secs(1));
        loop {
            tokio::select! {
                _ = self.stop.cancelled() => {
                    tracing::info!(id = self.id, "task closed, exiting listen");
                    break;
                }
                _ = lifetime.cancelled() => {
                    tracing::info!(id = self.id, "context cancelled, exiting listen");
                    break;
                }
                _ = ticks.tick() => {
                    tracing::info!(id = self.id, "{}", self.message());
                }
            }
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.json"));

    let cfg = Config {
        task_name: "json_task".into(),
        task_version: env!("CARGO_PKG_VERSION").into(),
        reload_signals: vec![Interrupt::Hangup],
        terminate_signals: vec![Interrupt::Interrupt, Interrupt::Terminate],
        ..Config::default()
    };

    let runner = RunnerBuilder::new(cfg)
        .with_task_factory(move |id, ready| {
            tracing::info!(id, "new task");
            Some(Arc::new(Application {
                id,
                path: path.clone(),
                ready,
                config: Mutex::new(None),
                lifetime: Mutex::new(None),
                stop: CancellationToken::new(),
            }) as TaskRef)
        })
        .build()?;

    runner.listen().await;
    Ok(())
}
