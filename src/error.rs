//! Error types used by the taskrelay runner and by managed tasks.
//!
//! This module defines two enums:
//!
//! - [`RunnerError`]: errors raised by the runner itself (construction, signal wiring).
//! - [`TaskError`]: errors raised by a managed task's `initialize` or `close`.
//!
//! Neither is fatal to a running runner: every task failure degrades to
//! "keep the generation that was already serving and wait for the next trigger".

use thiserror::Error;

/// # Errors produced by the runner.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RunnerError {
    /// The builder was asked to build a runner without a task factory.
    #[error("no task factory provided")]
    MissingTaskFactory,

    /// `listen` was called on a runner that is already (or was already) listening.
    #[error("runner is already listening")]
    AlreadyListening,

    /// Registering an OS signal handler failed.
    #[error("failed to register {name} signals: {source}")]
    SignalRegistration {
        /// Which bridge failed (`reload` or `terminate`).
        name: &'static str,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

impl RunnerError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use taskrelay::RunnerError;
    ///
    /// assert_eq!(RunnerError::MissingTaskFactory.as_label(), "runner_missing_task_factory");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RunnerError::MissingTaskFactory => "runner_missing_task_factory",
            RunnerError::AlreadyListening => "runner_already_listening",
            RunnerError::SignalRegistration { .. } => "runner_signal_registration",
        }
    }
}

/// # Errors produced by a managed task.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum TaskError {
    /// The task failed to initialize or to close.
    #[error("execution failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// The task observed its lifetime ending and gave up.
    #[error("context cancelled")]
    Canceled,
}

impl TaskError {
    /// Shorthand for [`TaskError::Fail`] from anything displayable.
    ///
    /// # Example
    /// ```
    /// use taskrelay::TaskError;
    ///
    /// let err = TaskError::fail("BOINK");
    /// assert_eq!(err.to_string(), "execution failed: BOINK");
    /// ```
    pub fn fail(error: impl std::fmt::Display) -> Self {
        TaskError::Fail {
            error: error.to_string(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskError::Fail { .. } => "task_failed",
            TaskError::Canceled => "task_canceled",
        }
    }
}
