//! Application configuration structures.

use catalog_core::telemetry::{LogFormat, TelemetryConfig};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Application name and metadata.
    pub app: AppMetadata,

    /// HTTP server configuration.
    pub server: ServerConfig,

    /// Relational source configuration.
    pub database: DatabaseConfig,

    /// Cache store configuration.
    pub cache: CacheConfig,

    /// Task broker configuration.
    pub broker: BrokerConfig,

    /// Order worker configuration.
    pub worker: WorkerConfig,

    /// Observability configuration.
    pub observability: ObservabilityConfig,
}

/// Application metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppMetadata {
    /// Application name.
    pub name: String,
    /// Application version.
    pub version: String,
    /// Environment (development, staging, production).
    pub environment: String,
}

impl Default for AppMetadata {
    fn default() -> Self {
        Self {
            name: "catalog".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            environment: "development".to_string(),
        }
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind host.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// Request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Enable CORS.
    pub cors_enabled: bool,
    /// CORS allowed origins.
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            request_timeout_secs: 30,
            cors_enabled: true,
            cors_origins: vec!["*".to_string()],
        }
    }
}

impl ServerConfig {
    /// Returns the bind address.
    #[must_use]
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Returns the request timeout as a Duration.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Relational source configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Database host (`DB_HOST`).
    pub host: String,
    /// Database port.
    pub port: u16,
    /// Database name (`DB_NAME`).
    pub name: String,
    /// Database user (`DB_USER`).
    pub user: String,
    /// Database password (`DB_PASS`).
    pub password: String,
    /// Minimum connection pool size.
    pub min_connections: u32,
    /// Maximum connection pool size.
    pub max_connections: u32,
    /// Connection acquire timeout in seconds.
    pub connect_timeout_secs: u64,
    /// Idle timeout in seconds.
    pub idle_timeout_secs: u64,
    /// Upper bound on a single listing query, in milliseconds.
    pub query_timeout_ms: u64,
    /// Apply migrations at startup.
    pub run_migrations: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: "db".to_string(),
            port: 5432,
            name: "ecommerce".to_string(),
            user: "postgres".to_string(),
            password: "admin".to_string(),
            min_connections: 1,
            max_connections: 10,
            connect_timeout_secs: 5,
            idle_timeout_secs: 600,
            query_timeout_ms: 5_000,
            run_migrations: true,
        }
    }
}

impl DatabaseConfig {
    /// Returns the PostgreSQL connection URL.
    #[must_use]
    pub fn url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.user, self.password, self.host, self.port, self.name
        )
    }

    /// Returns the connect timeout as a Duration.
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Returns the idle timeout as a Duration.
    #[must_use]
    pub const fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    /// Returns the query timeout as a Duration.
    #[must_use]
    pub const fn query_timeout(&self) -> Duration {
        Duration::from_millis(self.query_timeout_ms)
    }
}

/// Which cache store backs the product listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    /// Redis (production).
    #[default]
    Redis,
    /// Process-local store with the same TTL semantics (local development).
    Memory,
    /// No cache; every read goes to the relational source.
    Disabled,
}

/// Cache store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Cache backend.
    pub backend: CacheBackend,
    /// Redis host (`REDIS_HOST`).
    pub host: String,
    /// Redis port.
    pub port: u16,
    /// Redis logical database.
    pub db: u8,
    /// Connection pool size.
    pub pool_size: usize,
    /// Upper bound on a single GET/SET, in milliseconds.
    pub operation_timeout_ms: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackend::Redis,
            host: "redis".to_string(),
            port: 6379,
            db: 0,
            pool_size: 10,
            operation_timeout_ms: 500,
        }
    }
}

impl CacheConfig {
    /// Returns the Redis connection URL.
    #[must_use]
    pub fn url(&self) -> String {
        format!("redis://{}:{}/{}", self.host, self.port, self.db)
    }

    /// Returns the operation timeout as a Duration.
    #[must_use]
    pub const fn operation_timeout(&self) -> Duration {
        Duration::from_millis(self.operation_timeout_ms)
    }
}

/// Task broker configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrokerConfig {
    /// Use Redis as the broker. When disabled, tasks go to an in-process
    /// queue drained by a worker pool inside the server.
    pub enabled: bool,
    /// Broker host (follows `REDIS_HOST`).
    pub host: String,
    /// Broker port.
    pub port: u16,
    /// Broker logical database.
    pub db: u8,
    /// Connection pool size.
    pub pool_size: usize,
    /// Key prefix for all job-related keys.
    pub key_prefix: String,
    /// Upper bound on publishing a task, in milliseconds.
    pub publish_timeout_ms: u64,
    /// How long task results are retained, in seconds.
    pub result_ttl_secs: u64,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            host: "redis".to_string(),
            port: 6379,
            db: 0,
            pool_size: 10,
            key_prefix: "catalog:jobs".to_string(),
            publish_timeout_ms: 2_000,
            result_ttl_secs: 86_400,
        }
    }
}

impl BrokerConfig {
    /// Returns the broker connection URL.
    #[must_use]
    pub fn url(&self) -> String {
        format!("redis://{}:{}/{}", self.host, self.port, self.db)
    }

    /// Returns the publish timeout as a Duration.
    #[must_use]
    pub const fn publish_timeout(&self) -> Duration {
        Duration::from_millis(self.publish_timeout_ms)
    }

    /// Returns the result retention as a Duration.
    #[must_use]
    pub const fn result_ttl(&self) -> Duration {
        Duration::from_secs(self.result_ttl_secs)
    }
}

/// Order worker configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Number of jobs processed concurrently.
    pub concurrency: usize,
    /// Queues to poll, in priority order.
    pub queues: Vec<String>,
    /// Polling interval in milliseconds.
    pub poll_interval_ms: u64,
    /// Job execution timeout in seconds.
    pub job_timeout_secs: u64,
    /// Shutdown timeout in seconds.
    pub shutdown_timeout_secs: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            concurrency: 4,
            queues: vec!["orders".to_string()],
            poll_interval_ms: 200,
            job_timeout_secs: 60,
            shutdown_timeout_secs: 30,
        }
    }
}

impl WorkerConfig {
    /// Returns the polling interval as a Duration.
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Returns the job timeout as a Duration.
    #[must_use]
    pub const fn job_timeout(&self) -> Duration {
        Duration::from_secs(self.job_timeout_secs)
    }

    /// Returns the shutdown timeout as a Duration.
    #[must_use]
    pub const fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
    /// Log format (json, pretty).
    pub log_format: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
        }
    }
}

impl ObservabilityConfig {
    /// Converts to the telemetry settings understood by `catalog-core`.
    #[must_use]
    pub fn telemetry(&self) -> TelemetryConfig {
        TelemetryConfig {
            log_level: self.log_level.clone(),
            format: LogFormat::from_name(&self.log_format),
        }
    }
}
