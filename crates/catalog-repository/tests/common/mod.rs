//! Common test infrastructure for database integration tests.

use catalog_config::DatabaseConfig;
use catalog_repository::{DatabasePool, DatabasePoolInterface};
use std::sync::Arc;
use testcontainers::{runners::AsyncRunner, ContainerAsync, ImageExt};
use testcontainers_modules::postgres::Postgres;

/// Test database container wrapper.
///
/// Manages a PostgreSQL testcontainer lifecycle and provides a migrated pool.
pub struct TestDatabase {
    _container: ContainerAsync<Postgres>,
    pool: Arc<DatabasePool>,
    config: DatabaseConfig,
}

impl TestDatabase {
    /// Starts a fresh PostgreSQL container and runs migrations.
    pub async fn new() -> Self {
        let container = Postgres::default()
            .with_env_var("POSTGRES_DB", "catalog_test")
            .with_env_var("POSTGRES_USER", "catalog")
            .with_env_var("POSTGRES_PASSWORD", "catalog")
            .start()
            .await
            .expect("Failed to start PostgreSQL container");

        let port = container
            .get_host_port_ipv4(5432)
            .await
            .expect("Failed to get PostgreSQL port");

        let config = DatabaseConfig {
            host: "127.0.0.1".to_string(),
            port,
            name: "catalog_test".to_string(),
            user: "catalog".to_string(),
            password: "catalog".to_string(),
            min_connections: 1,
            max_connections: 5,
            connect_timeout_secs: 30,
            ..DatabaseConfig::default()
        };

        let pool = Self::connect_with_retry(&config, 30).await;

        pool.run_migrations()
            .await
            .expect("Failed to run migrations");

        Self {
            _container: container,
            pool: Arc::new(pool),
            config,
        }
    }

    /// Returns the database pool.
    pub fn pool(&self) -> Arc<DatabasePool> {
        Arc::clone(&self.pool)
    }

    /// Returns the configuration pointing at the container.
    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    /// Inserts a product row.
    pub async fn insert_product(&self, id: i64, name: &str, price: &str) {
        sqlx::query("INSERT INTO products (id, name, price) VALUES ($1, $2, $3::NUMERIC)")
            .bind(id)
            .bind(name)
            .bind(price)
            .execute(self.pool.inner())
            .await
            .expect("Failed to insert product");
    }

    async fn connect_with_retry(config: &DatabaseConfig, max_attempts: u32) -> DatabasePool {
        let mut attempts = 0;
        loop {
            attempts += 1;
            match DatabasePool::new(config).await {
                Ok(pool) => return pool,
                Err(e) => {
                    assert!(
                        attempts < max_attempts,
                        "Failed to connect to database after {max_attempts} attempts: {e}"
                    );
                    tokio::time::sleep(std::time::Duration::from_secs(1)).await;
                }
            }
        }
    }
}
