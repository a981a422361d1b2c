//! Scheduler module for the periodic runner

pub mod periodic_runner;
pub mod status;
pub mod timing;

pub use periodic_runner::{PeriodicRunner, RunnerOptions};
pub use status::RunnerStatus;
pub use timing::{WaitStrategy, SHORT_PERIOD_MAX_MS};
