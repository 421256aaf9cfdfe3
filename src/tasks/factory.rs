//! # Task factory.
//!
//! The runner calls the factory once per generation with a strictly
//! increasing identifier (`0, 1, 2, ...`) and a fresh [`ReadyReporter`].
//! Returning `None` means "no candidate this cycle": the runner logs it and
//! keeps whatever generation is already serving.

use std::sync::Arc;

use crate::sync::ReadyReporter;
use crate::tasks::TaskRef;

/// Builds the task instance for one generation.
///
/// Usually supplied as a closure through
/// [`RunnerBuilder::with_task_factory`](crate::RunnerBuilder::with_task_factory).
pub type TaskFactory = Arc<dyn Fn(u64, ReadyReporter) -> Option<TaskRef> + Send + Sync>;
