//! Job error types.

use thiserror::Error;

/// Result type for job operations.
pub type JobResult<T> = Result<T, JobError>;

/// Job-related errors.
#[derive(Debug, Error)]
pub enum JobError {
    /// Job execution failed.
    #[error("Job execution failed: {0}")]
    ExecutionFailed(String),

    /// Counter store command failed.
    #[error("Store error: {0}")]
    Store(String),

    /// Redis error.
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// Redis pool error.
    #[error("Redis pool error: {0}")]
    Pool(#[from] deadpool_redis::PoolError),

    /// Re-enqueue through the queue transport failed.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// No handler registered for the job class.
    #[error("No handler registered for job class: {0}")]
    UnknownJobClass(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl JobError {
    /// Creates an execution failure from any displayable cause.
    pub fn failed(cause: impl std::fmt::Display) -> Self {
        JobError::ExecutionFailed(cause.to_string())
    }

    /// Returns true if the counter store could not be reached or failed a command.
    pub fn is_store(&self) -> bool {
        matches!(self, JobError::Store(_) | JobError::Redis(_) | JobError::Pool(_))
    }

    /// Returns true if this error is an infrastructure failure that must be
    /// surfaced to the caller rather than absorbed by the retry middleware.
    pub fn is_infrastructure(&self) -> bool {
        self.is_store() || matches!(self, JobError::Transport(_))
    }
}

impl From<requeue_core::CoreError> for JobError {
    fn from(err: requeue_core::CoreError) -> Self {
        match err {
            requeue_core::CoreError::Configuration(msg) => JobError::Configuration(msg),
            other => JobError::Internal(other.to_string()),
        }
    }
}
