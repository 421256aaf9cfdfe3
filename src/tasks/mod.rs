//! # Task abstractions.
//!
//! - [`Task`] - the managed unit of work (initialize → listen → close)
//! - [`Close`] - the closing half of the contract, shared with [`CloseOnce`](crate::CloseOnce)
//! - [`TaskRef`] - shared reference to a task (`Arc<dyn Task>`)
//! - [`TaskFactory`] - per-generation constructor callback

mod factory;
mod task;

pub use factory::TaskFactory;
pub use task::{Close, Task, TaskRef};
