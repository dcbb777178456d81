//! Collaborator construction.
//!
//! Every client object is built here once, at process start, and handed
//! to the services that need it. Nothing is reachable through a global.

use catalog_config::{AppConfig, BrokerConfig, CacheBackend, CacheConfig};
use catalog_core::{CatalogError, CatalogResult, HealthCheck};
use catalog_jobs::{InMemoryJobQueue, JobQueue, QueueSettings, RedisJobQueue};
use catalog_repository::{DatabasePool, DatabasePoolInterface, PgProductRepository};
use catalog_resilience::TimeoutConfig;
use catalog_rest::AppState;
use catalog_service::{
    CacheInterface, InMemoryCache, OrderService, OrderServiceImpl, ProductService,
    ProductServiceImpl, RedisCacheService,
};
use std::sync::Arc;
use tracing::info;

/// A collaborator together with its health check.
pub struct Collaborator<T: ?Sized> {
    pub client: Arc<T>,
    pub health: Arc<dyn HealthCheck>,
}

/// Derives per-collaborator timeouts from configuration.
#[must_use]
pub fn timeouts(config: &AppConfig) -> TimeoutConfig {
    TimeoutConfig {
        cache_timeout: config.cache.operation_timeout(),
        database_timeout: config.database.query_timeout(),
        broker_timeout: config.broker.publish_timeout(),
    }
}

/// Builds the cache selected by `cache.backend`.
///
/// # Errors
///
/// Returns `CatalogError::Configuration` if the Redis pool cannot be created.
pub fn build_cache(config: &CacheConfig) -> CatalogResult<Collaborator<dyn CacheInterface>> {
    info!(backend = ?config.backend, "Creating cache");
    Ok(match config.backend {
        CacheBackend::Redis => {
            let cache = Arc::new(RedisCacheService::new(catalog_service::create_pool(config)?));
            Collaborator {
                client: cache.clone(),
                health: cache,
            }
        }
        CacheBackend::Memory => {
            let cache = Arc::new(InMemoryCache::new());
            Collaborator {
                client: cache.clone(),
                health: cache,
            }
        }
        CacheBackend::Disabled => {
            let cache = Arc::new(RedisCacheService::disabled());
            Collaborator {
                client: cache.clone(),
                health: cache,
            }
        }
    })
}

/// Builds the task broker client.
///
/// With `broker.enabled = false` the queue lives in-process and tasks are
/// only visible to a worker pool running in the same process.
///
/// # Errors
///
/// Returns `CatalogError::Configuration` if the Redis pool cannot be created.
pub fn build_job_queue(config: &BrokerConfig) -> CatalogResult<Collaborator<dyn JobQueue>> {
    if !config.enabled {
        info!("Broker disabled; using in-process job queue");
        let queue = Arc::new(InMemoryJobQueue::with_settings(QueueSettings::from(config)));
        return Ok(Collaborator {
            client: queue.clone(),
            health: queue,
        });
    }

    let pool = catalog_jobs::create_pool(config)
        .map_err(|e| CatalogError::Configuration(e.to_string()))?;
    let queue = Arc::new(RedisJobQueue::new(pool, QueueSettings::from(config)));
    Ok(Collaborator {
        client: queue.clone(),
        health: queue,
    })
}

/// Fully wired application services.
pub struct AppContainer {
    pub db_pool: Arc<DatabasePool>,
    pub job_queue: Arc<dyn JobQueue>,
    pub product_service: Arc<dyn ProductService>,
    pub order_service: Arc<dyn OrderService>,
    pub health_checks: Vec<Arc<dyn HealthCheck>>,
}

impl AppContainer {
    /// Builds every collaborator and service from configuration.
    ///
    /// No connection is opened; an unreachable database, cache, or broker
    /// surfaces on the requests that need it.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Configuration` for unusable connection settings.
    pub fn build(config: &AppConfig) -> CatalogResult<Self> {
        let db_pool = Arc::new(DatabasePool::connect_lazy(&config.database)?);
        AppContainerBuilder::new(config.clone())
            .with_database_pool(db_pool)
            .build()
    }

    /// Application state for the REST layer.
    #[must_use]
    pub fn app_state(&self) -> AppState {
        AppState::new(
            self.product_service.clone(),
            self.order_service.clone(),
            self.health_checks.clone(),
        )
    }
}

/// Builder for [`AppContainer`].
pub struct AppContainerBuilder {
    config: AppConfig,
    db_pool: Option<Arc<DatabasePool>>,
}

impl AppContainerBuilder {
    /// Creates a new builder.
    #[must_use]
    pub const fn new(config: AppConfig) -> Self {
        Self {
            config,
            db_pool: None,
        }
    }

    /// Sets the database pool.
    #[must_use]
    pub fn with_database_pool(mut self, pool: Arc<DatabasePool>) -> Self {
        self.db_pool = Some(pool);
        self
    }

    /// Builds the container.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Configuration` if no database pool was set or
    /// a Redis pool cannot be created.
    pub fn build(self) -> CatalogResult<AppContainer> {
        let config = self.config;
        let db_pool = self
            .db_pool
            .ok_or_else(|| CatalogError::Configuration("Database pool is required".to_string()))?;
        let timeouts = timeouts(&config);

        let cache = build_cache(&config.cache)?;
        let queue = build_job_queue(&config.broker)?;

        let repository = Arc::new(PgProductRepository::new(
            db_pool.clone() as Arc<dyn DatabasePoolInterface>,
            timeouts.database_timeout,
        ));
        let product_service: Arc<dyn ProductService> =
            Arc::new(ProductServiceImpl::new(repository, cache.client, timeouts));
        let order_service: Arc<dyn OrderService> = Arc::new(OrderServiceImpl::new(
            queue.client.clone(),
            timeouts.broker_timeout,
        ));

        let health_checks: Vec<Arc<dyn HealthCheck>> =
            vec![db_pool.clone(), cache.health, queue.health];

        Ok(AppContainer {
            db_pool,
            job_queue: queue.client,
            product_service,
            order_service,
            health_checks,
        })
    }
}
