//! Runtime core: configuration, the generation loop, and signal wiring.
//!
//! The public API from this module is [`Runner`] (built through
//! [`RunnerBuilder`] from a [`Config`]), plus the [`Interrupt`] kinds and
//! [`SignalBridge`] used to turn OS signals into triggers.
//!
//! Internal modules:
//! - [`runner`]: generation loop, readiness race, shutdown fan-in;
//! - [`generation`]: per-generation state and race outcomes;
//! - [`deadline`]: time-bounded readiness lifetime derived from the root;
//! - [`signals`]: OS interrupts → debounced trigger callbacks;
//! - [`builder`] / [`config`]: construction.

mod builder;
mod config;
mod deadline;
mod generation;
mod runner;
mod signals;

pub use builder::RunnerBuilder;
pub use config::{Config, DEFAULT_READINESS_TIMEOUT};
pub use generation::{GenerationSnapshot, Handoff};
pub use runner::Runner;
pub use signals::{Interrupt, InterruptSource, OsInterrupts, SignalBridge};
