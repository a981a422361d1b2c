//! Error types for the periodic runner and its host

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MinicronError {
    #[error("Failed to start runner thread: {0}")]
    Init(#[source] std::io::Error),

    #[error("Shutdown was already requested for this runner")]
    AlreadyShutdown,

    #[error("Periodic callback failed: {0}")]
    CallbackFailed(String),

    #[error("Runner thread panicked: {0}")]
    RunnerPanicked(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, MinicronError>;
