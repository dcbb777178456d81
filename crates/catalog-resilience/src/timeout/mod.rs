//! Timeout wrapper for async operations.

use catalog_core::CatalogError;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Wraps an async operation with a timeout.
///
/// An elapsed deadline becomes `CatalogError::Timeout`; callers map it to
/// the failure kind of the collaborator they were talking to.
///
/// # Errors
///
/// Returns the operation's own error, or `CatalogError::Timeout` if it did
/// not finish within `duration`.
pub async fn with_timeout<F, Fut, T>(duration: Duration, f: F) -> Result<T, CatalogError>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, CatalogError>>,
{
    tokio::time::timeout(duration, f()).await.map_err(|_| {
        warn!(timeout_ms = duration.as_millis(), "Operation timed out");
        CatalogError::Timeout(format!("Operation timed out after {duration:?}"))
    })?
}

/// Timeout configuration for the collaborators of the catalog service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutConfig {
    /// Bound on a single cache GET or SET.
    pub cache_timeout: Duration,
    /// Bound on the product listing query.
    pub database_timeout: Duration,
    /// Bound on publishing or looking up a task.
    pub broker_timeout: Duration,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            cache_timeout: Duration::from_millis(500),
            database_timeout: Duration::from_secs(5),
            broker_timeout: Duration::from_secs(2),
        }
    }
}
