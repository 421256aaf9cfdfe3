use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use super::{config::Config, runner::Runner};
use crate::{
    error::RunnerError,
    logger::{Logger, LoggerRef, TracingLogger},
    sync::ReadyReporter,
    tasks::{TaskFactory, TaskRef},
};

/// Builder for constructing a [`Runner`].
///
/// # Example
/// ```
/// use taskrelay::{Config, RunnerBuilder, RunnerError};
///
/// // A factory is mandatory.
/// let err = RunnerBuilder::new(Config::default()).build().err();
/// assert!(matches!(err, Some(RunnerError::MissingTaskFactory)));
///
/// let runner = RunnerBuilder::new(Config::default())
///     .with_task_factory(|_id, _ready| None)
///     .build()
///     .unwrap();
/// assert!(!runner.is_closed());
/// ```
pub struct RunnerBuilder {
    cfg: Config,
    context: Option<CancellationToken>,
    factory: Option<TaskFactory>,
    logger: Option<LoggerRef>,
}

impl RunnerBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            context: None,
            factory: None,
            logger: None,
        }
    }

    /// Sets the parent lifetime. Cancelling it shuts the runner down;
    /// closing the runner never cancels it.
    ///
    /// Defaults to a fresh, never-cancelled token.
    pub fn with_context(mut self, context: CancellationToken) -> Self {
        self.context = Some(context);
        self
    }

    /// Sets the callback that builds each generation's task.
    pub fn with_task_factory<F>(mut self, factory: F) -> Self
    where
        F: Fn(u64, ReadyReporter) -> Option<TaskRef> + Send + Sync + 'static,
    {
        self.factory = Some(Arc::new(factory));
        self
    }

    /// Sets the log sink. Defaults to [`TracingLogger`].
    pub fn with_logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Builds the runner.
    ///
    /// Fails with [`RunnerError::MissingTaskFactory`] if no factory was set.
    pub fn build(self) -> Result<Arc<Runner>, RunnerError> {
        let factory = self.factory.ok_or(RunnerError::MissingTaskFactory)?;
        let context = self.context.unwrap_or_default();
        let logger = self
            .logger
            .unwrap_or_else(|| Arc::new(TracingLogger::new()));

        Ok(Arc::new(Runner::new_internal(
            self.cfg, context, factory, logger,
        )))
    }
}
