use thiserror::Error;

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("node is already running")]
    AlreadyRunning,

    #[error("node is not running")]
    NotRunning,

    #[error("shutdown timed out waiting for background tasks to finish")]
    ShutdownTimedOut,
}
