//! Redis-backed job queue implementation.

mod queue;

pub use queue::RedisJobQueue;

use crate::error::{JobError, JobResult};
use catalog_config::BrokerConfig;
use deadpool_redis::{Config, Pool, Runtime};
use tracing::info;

/// Create a Redis connection pool for the broker.
///
/// Connections are opened on first use, so a broker that is down at
/// startup surfaces as per-request failures rather than a boot failure.
///
/// # Errors
///
/// Returns `JobError::Configuration` if the URL or pool settings are invalid.
pub fn create_pool(config: &BrokerConfig) -> JobResult<Pool> {
    info!(url = %config.url(), "Creating Redis connection pool for job queue...");

    Config::from_url(config.url())
        .builder()
        .map_err(|e| JobError::Configuration(format!("Invalid Redis config: {e}")))?
        .max_size(config.pool_size)
        .runtime(Runtime::Tokio1)
        .build()
        .map_err(|e| JobError::Configuration(format!("Failed to create pool: {e}")))
}

/// Redis key builder for the job queue.
#[derive(Debug, Clone)]
pub struct RedisKeys {
    prefix: String,
}

impl RedisKeys {
    /// Create a new key builder with the given prefix.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Pending jobs of a queue (sorted set of job ids by enqueue time).
    #[must_use]
    pub fn priority_queue(&self, queue_name: &str) -> String {
        format!("{}:pqueue:{}", self.prefix, queue_name)
    }

    /// Active jobs (hash: `job_id` -> `worker_id`).
    #[must_use]
    pub fn active(&self) -> String {
        format!("{}:active", self.prefix)
    }

    /// Job record (JSON string).
    #[must_use]
    pub fn job(&self, job_id: &str) -> String {
        format!("{}:job:{}", self.prefix, job_id)
    }

    /// Completion result (string with retention TTL).
    #[must_use]
    pub fn result(&self, job_id: &str) -> String {
        format!("{}:result:{}", self.prefix, job_id)
    }

    /// Dead letter set (sorted set of job ids by failure time).
    #[must_use]
    pub fn dlq(&self) -> String {
        format!("{}:dlq", self.prefix)
    }
}

impl Default for RedisKeys {
    fn default() -> Self {
        Self::new("catalog:jobs")
    }
}
