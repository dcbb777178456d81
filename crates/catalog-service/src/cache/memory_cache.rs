//! In-process cache with per-entry expiry.

use super::CacheInterface;
use async_trait::async_trait;
use catalog_core::{CatalogError, CatalogResult, HealthCheck, HealthStatus};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

struct Entry {
    value: String,
    expires_at: Instant,
}

/// In-memory cache honoring the TTL given on each write.
///
/// Expiry is measured on the tokio clock, so a paused test runtime can
/// advance past it deterministically.
#[derive(Default)]
pub struct InMemoryCache {
    entries: Mutex<HashMap<String, Entry>>,
    offline: AtomicBool,
}

impl InMemoryCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every operation fail as if the cache store were unreachable.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Number of live entries.
    #[must_use]
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .lock()
            .values()
            .filter(|entry| entry.expires_at > now)
            .count()
    }

    /// Returns true if no live entry exists.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn ensure_online(&self) -> CatalogResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            Err(CatalogError::cache_unavailable("cache store is offline"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl CacheInterface for InMemoryCache {
    fn is_enabled(&self) -> bool {
        true
    }

    async fn get_raw(&self, key: &str) -> CatalogResult<Option<String>> {
        self.ensure_online()?;
        let mut entries = self.entries.lock();

        let expired = match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => {
                debug!(key, "Cache hit");
                return Ok(Some(entry.value.clone()));
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            entries.remove(key);
        }

        debug!(key, "Cache miss");
        Ok(None)
    }

    async fn set_raw(&self, key: &str, value: &str, ttl: Duration) -> CatalogResult<()> {
        self.ensure_online()?;
        self.entries.lock().insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }
}

#[async_trait]
impl HealthCheck for InMemoryCache {
    fn name(&self) -> &str {
        "cache"
    }

    async fn check(&self) -> HealthStatus {
        match self.ensure_online() {
            Ok(()) => HealthStatus::Healthy,
            Err(e) => HealthStatus::Unhealthy(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheExt;

    #[tokio::test]
    async fn test_get_missing_key() {
        let cache = InMemoryCache::new();
        assert!(cache.get_raw("products").await.unwrap().is_none());
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_expires_after_ttl() {
        let cache = InMemoryCache::new();
        cache
            .set_raw("products", "[]", Duration::from_secs(30))
            .await
            .unwrap();

        tokio::time::advance(Duration::from_secs(29)).await;
        assert_eq!(cache.get_raw("products").await.unwrap().as_deref(), Some("[]"));

        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(cache.get_raw("products").await.unwrap().is_none());
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_overwrite_replaces_value() {
        let cache = InMemoryCache::new();
        cache.set("k", &vec![1, 2], Duration::from_secs(5)).await.unwrap();
        cache.set("k", &vec![3], Duration::from_secs(5)).await.unwrap();

        let value: Option<Vec<i32>> = cache.get("k").await.unwrap();
        assert_eq!(value, Some(vec![3]));
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_undecodable_value_is_serialization_error() {
        let cache = InMemoryCache::new();
        cache
            .set_raw("k", "[(1, 'Widget', Decimal('9.99'))]", Duration::from_secs(5))
            .await
            .unwrap();

        let result = cache.get::<Vec<i32>>("k").await;
        assert!(matches!(result, Err(CatalogError::Serialization(_))));
    }

    #[tokio::test]
    async fn test_offline_cache() {
        let cache = InMemoryCache::new();
        cache.set_offline(true);

        assert!(matches!(
            cache.get_raw("k").await,
            Err(CatalogError::CacheUnavailable(_))
        ));
        assert!(cache.check().await.is_unhealthy());

        cache.set_offline(false);
        assert!(cache.check().await.is_healthy());
    }
}
