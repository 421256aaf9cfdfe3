//! # Printf-style log sink.
//!
//! The runner writes human-readable lines through a [`Logger`]. Lines carry
//! an `[INFO]` or `[WARN]` prefix; sinks are free to ignore or interpret it.
//!
//! [`TracingLogger`] is the default sink and forwards every line to
//! [`tracing`], mapping the prefix to a level.

use std::fmt;
use std::sync::Arc;

/// Destination for the runner's log lines.
pub trait Logger: Send + Sync {
    /// Writes one formatted line.
    fn printf(&self, args: fmt::Arguments<'_>);
}

/// Shared handle to a logger.
pub type LoggerRef = Arc<dyn Logger>;

/// Forwards runner log lines to `tracing` under the `taskrelay` target.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingLogger;

impl TracingLogger {
    /// Construct a new [`TracingLogger`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Logger for TracingLogger {
    fn printf(&self, args: fmt::Arguments<'_>) {
        let line = args.to_string();
        if let Some(msg) = line.strip_prefix("[WARN] ") {
            tracing::warn!(target: "taskrelay", "{msg}");
        } else if let Some(msg) = line.strip_prefix("[INFO] ") {
            tracing::info!(target: "taskrelay", "{msg}");
        } else {
            tracing::info!(target: "taskrelay", "{line}");
        }
    }
}

/// Writes a formatted line to a [`Logger`].
macro_rules! logf {
    ($logger:expr, $($arg:tt)*) => {
        $logger.printf(format_args!($($arg)*))
    };
}

pub(crate) use logf;
