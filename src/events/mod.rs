//! Lifecycle events: types and broadcast bus.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! The only publisher is the runner; consumers obtain a receiver through
//! [`Runner::subscribe`](crate::Runner::subscribe).

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
