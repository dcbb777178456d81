//! Job error types.

use catalog_core::CatalogError;
use thiserror::Error;

/// Result type for job operations.
pub type JobResult<T> = Result<T, JobError>;

/// Job-related errors.
#[derive(Debug, Error)]
pub enum JobError {
    /// Job execution failed.
    #[error("Job execution failed: {0}")]
    ExecutionFailed(String),

    /// Job timed out.
    #[error("Job timed out after {0} seconds")]
    Timeout(u64),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Redis error.
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// Redis pool error.
    #[error("Redis pool error: {0}")]
    Pool(#[from] deadpool_redis::PoolError),

    /// Job not found.
    #[error("Job not found: {0}")]
    NotFound(String),

    /// No handler is registered for the job's name.
    #[error("No handler registered for job type: {0}")]
    UnknownJob(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Worker error.
    #[error("Worker error: {0}")]
    Worker(String),
}

impl JobError {
    /// Returns true if this error is retryable.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ExecutionFailed(_)
                | Self::Timeout(_)
                | Self::Redis(_)
                | Self::Pool(_)
                | Self::Worker(_)
        )
    }

    /// Returns true if the job should go straight to the dead letter set.
    #[must_use]
    pub const fn should_dlq(&self) -> bool {
        matches!(
            self,
            Self::Serialization(_) | Self::UnknownJob(_) | Self::Configuration(_)
        )
    }
}

/// At the service boundary every broker-side failure is a broker outage,
/// except a lookup of an id the broker has never seen.
impl From<JobError> for CatalogError {
    fn from(err: JobError) -> Self {
        match err {
            JobError::NotFound(id) => Self::not_found("Task", id),
            other => Self::broker_unavailable(other.to_string()),
        }
    }
}
