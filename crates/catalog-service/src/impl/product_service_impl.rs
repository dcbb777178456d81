//! Read-through cached product listing.

use crate::cache::{cache_keys, CacheExt, CacheInterface};
use crate::dto::ProductListResponse;
use crate::product_service::ProductService;
use async_trait::async_trait;
use catalog_core::{CatalogError, CatalogResult, Product, ProductListing};
use catalog_repository::ProductRepository;
use catalog_resilience::{with_timeout, TimeoutConfig};
use std::sync::Arc;
use tracing::{debug, warn};

/// Product service backed by a repository and a cache.
///
/// Cache trouble never fails a listing: an unreachable cache or an
/// undecodable entry is a miss, and a failed write is only logged.
pub struct ProductServiceImpl {
    repository: Arc<dyn ProductRepository>,
    cache: Arc<dyn CacheInterface>,
    timeouts: TimeoutConfig,
}

impl ProductServiceImpl {
    /// Creates a new product service.
    pub fn new(
        repository: Arc<dyn ProductRepository>,
        cache: Arc<dyn CacheInterface>,
        timeouts: TimeoutConfig,
    ) -> Self {
        Self {
            repository,
            cache,
            timeouts,
        }
    }

    async fn cached_listing(&self) -> Option<ProductListing> {
        if !self.cache.is_enabled() {
            return None;
        }

        let lookup = with_timeout(self.timeouts.cache_timeout, || {
            self.cache.get::<ProductListing>(cache_keys::PRODUCTS)
        })
        .await;

        match lookup {
            Ok(Some(products)) => {
                debug!(count = products.len(), "Product listing served from cache");
                Some(products)
            }
            Ok(None) => None,
            Err(CatalogError::Serialization(e)) => {
                warn!(error = %e, "Cached product listing is undecodable; treating as a miss");
                None
            }
            Err(e) => {
                warn!(error = %e, "Cache read failed; falling back to the database");
                None
            }
        }
    }

    async fn store_listing(&self, products: &[Product]) {
        if !self.cache.is_enabled() {
            return;
        }

        let write = with_timeout(self.timeouts.cache_timeout, || {
            self.cache
                .set(cache_keys::PRODUCTS, &products, cache_keys::PRODUCTS_TTL)
        })
        .await;

        if let Err(e) = write {
            warn!(error = %e, "Failed to cache product listing");
        }
    }
}

#[async_trait]
impl ProductService for ProductServiceImpl {
    async fn list_products(&self) -> CatalogResult<ProductListResponse> {
        if let Some(products) = self.cached_listing().await {
            return Ok(ProductListResponse::from_cache(products));
        }

        let products = with_timeout(self.timeouts.database_timeout, || self.repository.find_all())
            .await
            .map_err(|e| match e {
                CatalogError::Timeout(message) => CatalogError::DataSource(message),
                other => other,
            })?;
        debug!(count = products.len(), "Product listing read from database");

        self.store_listing(&products).await;
        Ok(ProductListResponse::from_database(products))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::InMemoryCache;
    use crate::dto::ProductSource;
    use mockall::mock;
    use std::time::Duration;

    mock! {
        pub Repo {}

        #[async_trait]
        impl ProductRepository for Repo {
            async fn find_all(&self) -> CatalogResult<ProductListing>;
        }
    }

    fn sample_products() -> Vec<Product> {
        vec![Product::new(1, "Widget", 9.99), Product::new(2, "Gadget", 19.99)]
    }

    fn repo_returning(products: Vec<Product>, times: usize) -> MockRepo {
        let mut repo = MockRepo::new();
        repo.expect_find_all()
            .times(times)
            .returning(move || Ok(products.clone()));
        repo
    }

    fn service(repo: MockRepo, cache: Arc<InMemoryCache>) -> ProductServiceImpl {
        ProductServiceImpl::new(Arc::new(repo), cache, TimeoutConfig::default())
    }

    #[tokio::test]
    async fn test_miss_then_hit() {
        let cache = Arc::new(InMemoryCache::new());
        let service = service(repo_returning(sample_products(), 1), cache.clone());

        let first = service.list_products().await.unwrap();
        assert_eq!(first.source, ProductSource::Database);
        assert_eq!(first.products, sample_products());
        assert_eq!(cache.len(), 1);

        let second = service.list_products().await.unwrap();
        assert_eq!(second.source, ProductSource::Cache);
        assert_eq!(second.products, first.products);
    }

    #[tokio::test]
    async fn test_cached_listing_round_trips_exactly() {
        let products = vec![
            Product::new(1, "Widget", 9.99),
            Product::new(2, "Gadget", 19.99),
            Product::new(3, "Thing", 0.1 + 0.2),
            Product::new(4, "Ünïcode \"quoted\"", 1e-7),
        ];
        let cache = Arc::new(InMemoryCache::new());
        let service = service(repo_returning(products.clone(), 1), cache);

        service.list_products().await.unwrap();
        let cached = service.list_products().await.unwrap();

        assert_eq!(cached.source, ProductSource::Cache);
        assert_eq!(cached.products, products);
        for (cached, original) in cached.products.iter().zip(&products) {
            assert_eq!(cached.price.to_bits(), original.price.to_bits());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_expires_after_thirty_seconds() {
        let cache = Arc::new(InMemoryCache::new());
        let service = service(repo_returning(sample_products(), 2), cache);

        assert_eq!(service.list_products().await.unwrap().source, ProductSource::Database);

        tokio::time::advance(Duration::from_secs(29)).await;
        assert_eq!(service.list_products().await.unwrap().source, ProductSource::Cache);

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(service.list_products().await.unwrap().source, ProductSource::Database);
    }

    #[tokio::test]
    async fn test_empty_source_is_cached() {
        let cache = Arc::new(InMemoryCache::new());
        let service = service(repo_returning(Vec::new(), 1), cache);

        assert_eq!(service.list_products().await.unwrap().source, ProductSource::Database);
        let second = service.list_products().await.unwrap();
        assert_eq!(second.source, ProductSource::Cache);
        assert!(second.products.is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_cache_degrades_to_database() {
        let cache = Arc::new(InMemoryCache::new());
        cache.set_offline(true);
        let service = service(repo_returning(sample_products(), 2), cache);

        for _ in 0..2 {
            let response = service.list_products().await.unwrap();
            assert_eq!(response.source, ProductSource::Database);
            assert_eq!(response.products, sample_products());
        }
    }

    #[tokio::test]
    async fn test_corrupt_entry_is_overwritten() {
        let cache = Arc::new(InMemoryCache::new());
        cache
            .set_raw(
                cache_keys::PRODUCTS,
                "[(1, 'Widget', Decimal('9.99'))]",
                Duration::from_secs(30),
            )
            .await
            .unwrap();
        let service = service(repo_returning(sample_products(), 1), cache.clone());

        assert_eq!(service.list_products().await.unwrap().source, ProductSource::Database);

        let stored: Option<Vec<Product>> = cache.get(cache_keys::PRODUCTS).await.unwrap();
        assert_eq!(stored, Some(sample_products()));
        assert_eq!(service.list_products().await.unwrap().source, ProductSource::Cache);
    }

    #[tokio::test]
    async fn test_unavailable_database_with_empty_cache_fails() {
        let mut repo = MockRepo::new();
        repo.expect_find_all()
            .times(1)
            .returning(|| Err(CatalogError::data_source("connection refused")));
        let cache = Arc::new(InMemoryCache::new());
        let service = service(repo, cache.clone());

        let result = service.list_products().await;
        assert!(matches!(result, Err(CatalogError::DataSource(_))));
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_fresh_entry_served_while_database_is_down() {
        let cache = Arc::new(InMemoryCache::new());
        cache
            .set(cache_keys::PRODUCTS, &sample_products(), cache_keys::PRODUCTS_TTL)
            .await
            .unwrap();
        let mut repo = MockRepo::new();
        repo.expect_find_all().never();
        let service = service(repo, cache);

        let response = service.list_products().await.unwrap();
        assert_eq!(response.source, ProductSource::Cache);
        assert_eq!(response.products, sample_products());
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_database_is_data_source_error() {
        struct SlowRepo;

        #[async_trait]
        impl ProductRepository for SlowRepo {
            async fn find_all(&self) -> CatalogResult<ProductListing> {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(Vec::new())
            }
        }

        let service = ProductServiceImpl::new(
            Arc::new(SlowRepo),
            Arc::new(InMemoryCache::new()),
            TimeoutConfig::default(),
        );

        let result = service.list_products().await;
        assert!(matches!(result, Err(CatalogError::DataSource(_))));
    }

    #[tokio::test]
    async fn test_concurrent_misses_leave_one_valid_entry() {
        let cache = Arc::new(InMemoryCache::new());
        let mut repo = MockRepo::new();
        repo.expect_find_all()
            .returning(|| Ok(sample_products()));
        let service = Arc::new(service(repo, cache.clone()));

        let requests = (0..8).map(|_| {
            let service = service.clone();
            tokio::spawn(async move { service.list_products().await })
        });
        for response in futures::future::join_all(requests).await {
            assert_eq!(response.unwrap().unwrap().products, sample_products());
        }

        assert_eq!(cache.len(), 1);
        let stored: Option<Vec<Product>> = cache.get(cache_keys::PRODUCTS).await.unwrap();
        assert_eq!(stored, Some(sample_products()));
    }
}
