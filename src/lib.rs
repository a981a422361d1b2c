//! Periodic runner library
//!
//! Runs one callback at a fixed, adjustable interval on a dedicated background
//! thread, with a shutdown that never misses its wakeup.

pub mod command_task;
pub mod config;
pub mod error;
pub mod logging;
pub mod scheduler;

pub use error::{MinicronError, Result};
pub use scheduler::{PeriodicRunner, RunnerOptions, RunnerStatus};
