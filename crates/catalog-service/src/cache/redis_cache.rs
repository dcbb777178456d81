//! Redis-based cache implementation.

use super::CacheInterface;
use async_trait::async_trait;
use catalog_config::CacheConfig;
use catalog_core::{CatalogError, CatalogResult, HealthCheck, HealthStatus};
use deadpool_redis::{redis::AsyncCommands, Config, Pool, Runtime};
use std::time::Duration;
use tracing::{debug, info};

/// Create a Redis connection pool for the cache.
///
/// No connection is opened here; an unreachable Redis shows up on the
/// first cache operation.
///
/// # Errors
///
/// Returns `CatalogError::Configuration` if the URL or pool settings are invalid.
pub fn create_pool(config: &CacheConfig) -> CatalogResult<Pool> {
    info!(url = %config.url(), "Creating Redis connection pool for cache...");

    Config::from_url(config.url())
        .builder()
        .map_err(|e| CatalogError::Configuration(format!("Invalid Redis cache config: {e}")))?
        .max_size(config.pool_size)
        .runtime(Runtime::Tokio1)
        .build()
        .map_err(|e| CatalogError::Configuration(format!("Failed to create cache pool: {e}")))
}

/// Redis-based cache service.
pub struct RedisCacheService {
    pool: Option<Pool>,
}

impl RedisCacheService {
    /// Create a new Redis cache service.
    #[must_use]
    pub const fn new(pool: Pool) -> Self {
        Self { pool: Some(pool) }
    }

    /// Create a no-op cache service (for when caching is disabled).
    #[must_use]
    pub const fn disabled() -> Self {
        Self { pool: None }
    }

    async fn get_conn(&self) -> CatalogResult<deadpool_redis::Connection> {
        match &self.pool {
            Some(pool) => pool.get().await.map_err(|e| {
                CatalogError::cache_unavailable(format!("Failed to get Redis connection: {e}"))
            }),
            None => Err(CatalogError::cache_unavailable("Cache is disabled")),
        }
    }
}

#[async_trait]
impl CacheInterface for RedisCacheService {
    fn is_enabled(&self) -> bool {
        self.pool.is_some()
    }

    async fn get_raw(&self, key: &str) -> CatalogResult<Option<String>> {
        if !self.is_enabled() {
            return Ok(None);
        }

        let mut conn = self.get_conn().await?;
        let value: Option<String> = conn.get(key).await.map_err(|e| {
            CatalogError::cache_unavailable(format!("Failed to get key '{key}': {e}"))
        })?;

        match &value {
            Some(_) => debug!(key, "Cache hit"),
            None => debug!(key, "Cache miss"),
        }

        Ok(value)
    }

    async fn set_raw(&self, key: &str, value: &str, ttl: Duration) -> CatalogResult<()> {
        if !self.is_enabled() {
            return Ok(());
        }

        let mut conn = self.get_conn().await?;
        let ttl_secs = ttl.as_secs().max(1);

        conn.set_ex::<_, _, ()>(key, value, ttl_secs).await.map_err(|e| {
            CatalogError::cache_unavailable(format!("Failed to set key '{key}': {e}"))
        })?;

        debug!(key, ttl_secs, "Cached value");
        Ok(())
    }
}

#[async_trait]
impl HealthCheck for RedisCacheService {
    fn name(&self) -> &str {
        "cache"
    }

    async fn check(&self) -> HealthStatus {
        if !self.is_enabled() {
            return HealthStatus::Degraded("cache disabled".to_string());
        }
        let mut conn = match self.get_conn().await {
            Ok(conn) => conn,
            Err(e) => return HealthStatus::Unhealthy(e.to_string()),
        };
        let pong: Result<String, _> = deadpool_redis::redis::cmd("PING")
            .query_async(&mut *conn)
            .await;
        match pong {
            Ok(_) => HealthStatus::Healthy,
            Err(e) => HealthStatus::Unhealthy(e.to_string()),
        }
    }
}
