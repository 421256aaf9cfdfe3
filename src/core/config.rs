//! # Runner configuration.
//!
//! Provides [`Config`], the plain-data settings of a [`Runner`](crate::Runner).
//! Collaborators that are not plain data (root lifetime, logger, task factory)
//! are supplied through [`RunnerBuilder`](crate::RunnerBuilder).
//!
//! ## Sentinel values
//! - `readiness_timeout = 0s` → falls back to [`DEFAULT_READINESS_TIMEOUT`]
//! - `bus_capacity = 0` → clamped to 1
//! - empty signal lists → no bridge is installed for that trigger

use std::time::Duration;

use crate::core::signals::Interrupt;

/// Readiness timeout used when none is configured: long enough to almost never fire.
pub const DEFAULT_READINESS_TIMEOUT: Duration = Duration::from_secs(60 * 60);

/// Plain-data settings for a runner.
///
/// ## Field semantics
/// - `task_name` / `task_version`: label used only in log lines
/// - `readiness_timeout`: how long a candidate may take to report readiness
/// - `reload_signals`: interrupts that trigger a reload
/// - `terminate_signals`: interrupts that shut the runner down
/// - `bus_capacity`: lifecycle event ring buffer size
#[derive(Clone, Debug)]
pub struct Config {
    /// Name of the managed task, for log lines.
    pub task_name: String,

    /// Version of the managed task, for log lines.
    pub task_version: String,

    /// Maximum time a candidate generation may take to report readiness.
    ///
    /// When it elapses the candidate is closed and the previous generation keeps serving.
    /// Callers that need fast failure must set this explicitly.
    pub readiness_timeout: Duration,

    /// Interrupts that mean "build and hand over to a new generation".
    pub reload_signals: Vec<Interrupt>,

    /// Interrupts that mean "shut everything down".
    pub terminate_signals: Vec<Interrupt>,

    /// Capacity of the lifecycle event broadcast channel.
    pub bus_capacity: usize,
}

impl Config {
    /// Returns the effective readiness timeout (`0s` → default).
    #[inline]
    pub fn readiness_timeout(&self) -> Duration {
        if self.readiness_timeout == Duration::ZERO {
            DEFAULT_READINESS_TIMEOUT
        } else {
            self.readiness_timeout
        }
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `task_name = "unknown"`, `task_version = "unknown"`
    /// - `readiness_timeout = 1h`
    /// - `reload_signals = [Hangup]`
    /// - `terminate_signals = [Interrupt, Terminate]`
    /// - `bus_capacity = 1024`
    fn default() -> Self {
        Self {
            task_name: "unknown".to_string(),
            task_version: "unknown".to_string(),
            readiness_timeout: DEFAULT_READINESS_TIMEOUT,
            reload_signals: vec![Interrupt::Hangup],
            terminate_signals: vec![Interrupt::Interrupt, Interrupt::Terminate],
            bus_capacity: 1024,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let cfg = Config::default();
        assert_eq!(cfg.task_name, "unknown");
        assert_eq!(cfg.task_version, "unknown");
        assert_eq!(cfg.readiness_timeout(), Duration::from_secs(3600));
        assert_eq!(cfg.reload_signals, vec![Interrupt::Hangup]);
        assert_eq!(
            cfg.terminate_signals,
            vec![Interrupt::Interrupt, Interrupt::Terminate]
        );
    }

    #[test]
    fn zero_sentinels_are_normalized() {
        let cfg = Config {
            readiness_timeout: Duration::ZERO,
            bus_capacity: 0,
            ..Config::default()
        };
        assert_eq!(cfg.readiness_timeout(), DEFAULT_READINESS_TIMEOUT);
        assert_eq!(cfg.bus_capacity_clamped(), 1);
    }
}
