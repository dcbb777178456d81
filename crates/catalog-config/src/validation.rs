//! Configuration validation.
//!
//! Collects every problem in one pass so a misconfigured deployment fails
//! at startup with the full list instead of one error at a time.

use crate::AppConfig;
use std::fmt;
use url::Url;

/// Configuration validation error variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigValidationError {
    /// A required value is empty.
    EmptyValue { name: String },
    /// Port number is invalid (must be 1-65535).
    InvalidPort { name: String, value: u16 },
    /// Pool size configuration is invalid (min must be <= max).
    InvalidPoolSize { min: u32, max: u32 },
    /// Pool size is zero or exceeds the maximum allowed.
    PoolSizeOutOfRange { name: String, value: usize, maximum: usize },
    /// URL format is invalid.
    InvalidUrl { url_type: String, message: String },
    /// Timeout value must be positive.
    NonPositiveTimeout { name: String },
    /// Log level is invalid.
    InvalidLogLevel { value: String },
    /// Log format is invalid.
    InvalidLogFormat { value: String },
    /// The worker has nothing to poll.
    NoWorkerQueues,
}

impl fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyValue { name } => write!(f, "'{name}' cannot be empty"),
            Self::InvalidPort { name, value } => {
                write!(f, "Invalid port for {name}: {value} (must be 1-65535)")
            }
            Self::InvalidPoolSize { min, max } => write!(
                f,
                "Invalid pool size: min ({min}) cannot be greater than max ({max})"
            ),
            Self::PoolSizeOutOfRange {
                name,
                value,
                maximum,
            } => write!(f, "Pool size '{name}' is {value} (must be 1-{maximum})"),
            Self::InvalidUrl { url_type, message } => {
                write!(f, "Invalid {url_type} URL: {message}")
            }
            Self::NonPositiveTimeout { name } => write!(f, "Timeout '{name}' must be positive"),
            Self::InvalidLogLevel { value } => write!(
                f,
                "Invalid log level: '{value}' (valid: trace, debug, info, warn, error)"
            ),
            Self::InvalidLogFormat { value } => {
                write!(f, "Invalid log format: '{value}' (valid: pretty, json)")
            }
            Self::NoWorkerQueues => write!(f, "worker.queues must name at least one queue"),
        }
    }
}

impl std::error::Error for ConfigValidationError {}

/// Result of configuration validation containing all errors found.
#[derive(Debug, Default)]
pub struct ValidationResult {
    errors: Vec<ConfigValidationError>,
}

impl ValidationResult {
    fn add_error(&mut self, error: ConfigValidationError) {
        self.errors.push(error);
    }

    /// Returns true if validation passed (no errors).
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns the validation errors.
    #[must_use]
    pub fn errors(&self) -> &[ConfigValidationError] {
        &self.errors
    }

    /// Converts to Result, returning Err with all errors if any exist.
    ///
    /// # Errors
    ///
    /// Returns every collected error when at least one check failed.
    pub fn into_result(self) -> Result<(), Vec<ConfigValidationError>> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.errors)
        }
    }
}

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    const MAX_DB_POOL_SIZE: u32 = 1000;
    const MAX_REDIS_POOL_SIZE: usize = 1000;
    const VALID_LOG_LEVELS: &'static [&'static str] = &["trace", "debug", "info", "warn", "error"];
    const VALID_LOG_FORMATS: &'static [&'static str] = &["pretty", "json"];

    /// Validates the entire application configuration.
    ///
    /// # Errors
    ///
    /// Returns all validation errors found.
    pub fn validate(config: &AppConfig) -> Result<(), Vec<ConfigValidationError>> {
        Self::collect(config).into_result()
    }

    /// Runs every check and returns the collected result.
    #[must_use]
    pub fn collect(config: &AppConfig) -> ValidationResult {
        let mut result = ValidationResult::default();

        Self::validate_server(&config.server, &mut result);
        Self::validate_database(&config.database, &mut result);
        Self::validate_cache(&config.cache, &mut result);
        Self::validate_broker(&config.broker, &mut result);
        Self::validate_worker(&config.worker, &mut result);
        Self::validate_observability(&config.observability, &mut result);

        result
    }

    fn validate_server(config: &crate::ServerConfig, result: &mut ValidationResult) {
        if config.port == 0 {
            result.add_error(ConfigValidationError::InvalidPort {
                name: "server.port".to_string(),
                value: config.port,
            });
        }
        if config.request_timeout_secs == 0 {
            result.add_error(ConfigValidationError::NonPositiveTimeout {
                name: "server.request_timeout_secs".to_string(),
            });
        }
    }

    fn validate_database(config: &crate::DatabaseConfig, result: &mut ValidationResult) {
        for (name, value) in [
            ("database.host", &config.host),
            ("database.name", &config.name),
            ("database.user", &config.user),
        ] {
            if value.trim().is_empty() {
                result.add_error(ConfigValidationError::EmptyValue {
                    name: name.to_string(),
                });
            }
        }

        if config.port == 0 {
            result.add_error(ConfigValidationError::InvalidPort {
                name: "database.port".to_string(),
                value: 0,
            });
        }

        if config.min_connections > config.max_connections {
            result.add_error(ConfigValidationError::InvalidPoolSize {
                min: config.min_connections,
                max: config.max_connections,
            });
        }
        if config.max_connections == 0 || config.max_connections > Self::MAX_DB_POOL_SIZE {
            result.add_error(ConfigValidationError::PoolSizeOutOfRange {
                name: "database.max_connections".to_string(),
                value: config.max_connections as usize,
                maximum: Self::MAX_DB_POOL_SIZE as usize,
            });
        }

        for (name, value) in [
            ("database.connect_timeout_secs", config.connect_timeout_secs),
            ("database.idle_timeout_secs", config.idle_timeout_secs),
            ("database.query_timeout_ms", config.query_timeout_ms),
        ] {
            if value == 0 {
                result.add_error(ConfigValidationError::NonPositiveTimeout {
                    name: name.to_string(),
                });
            }
        }
    }

    fn validate_cache(config: &crate::CacheConfig, result: &mut ValidationResult) {
        if config.backend != crate::CacheBackend::Redis {
            return;
        }

        Self::validate_redis_url("cache", &config.url(), result);

        if config.pool_size == 0 || config.pool_size > Self::MAX_REDIS_POOL_SIZE {
            result.add_error(ConfigValidationError::PoolSizeOutOfRange {
                name: "cache.pool_size".to_string(),
                value: config.pool_size,
                maximum: Self::MAX_REDIS_POOL_SIZE,
            });
        }
        if config.operation_timeout_ms == 0 {
            result.add_error(ConfigValidationError::NonPositiveTimeout {
                name: "cache.operation_timeout_ms".to_string(),
            });
        }
    }

    fn validate_broker(config: &crate::BrokerConfig, result: &mut ValidationResult) {
        if !config.enabled {
            return;
        }

        Self::validate_redis_url("broker", &config.url(), result);

        if config.key_prefix.trim().is_empty() {
            result.add_error(ConfigValidationError::EmptyValue {
                name: "broker.key_prefix".to_string(),
            });
        }
        if config.pool_size == 0 || config.pool_size > Self::MAX_REDIS_POOL_SIZE {
            result.add_error(ConfigValidationError::PoolSizeOutOfRange {
                name: "broker.pool_size".to_string(),
                value: config.pool_size,
                maximum: Self::MAX_REDIS_POOL_SIZE,
            });
        }
        if config.publish_timeout_ms == 0 {
            result.add_error(ConfigValidationError::NonPositiveTimeout {
                name: "broker.publish_timeout_ms".to_string(),
            });
        }
    }

    fn validate_worker(config: &crate::WorkerConfig, result: &mut ValidationResult) {
        if config.queues.iter().all(|q| q.trim().is_empty()) {
            result.add_error(ConfigValidationError::NoWorkerQueues);
        }
        if config.concurrency == 0 {
            result.add_error(ConfigValidationError::PoolSizeOutOfRange {
                name: "worker.concurrency".to_string(),
                value: 0,
                maximum: Self::MAX_REDIS_POOL_SIZE,
            });
        }
        for (name, value) in [
            ("worker.poll_interval_ms", config.poll_interval_ms),
            ("worker.job_timeout_secs", config.job_timeout_secs),
        ] {
            if value == 0 {
                result.add_error(ConfigValidationError::NonPositiveTimeout {
                    name: name.to_string(),
                });
            }
        }
    }

    fn validate_observability(config: &crate::ObservabilityConfig, result: &mut ValidationResult) {
        let level = config.log_level.to_lowercase();
        if !Self::VALID_LOG_LEVELS.contains(&level.as_str()) {
            result.add_error(ConfigValidationError::InvalidLogLevel {
                value: config.log_level.clone(),
            });
        }

        let format = config.log_format.to_lowercase();
        if !Self::VALID_LOG_FORMATS.contains(&format.as_str()) {
            result.add_error(ConfigValidationError::InvalidLogFormat {
                value: config.log_format.clone(),
            });
        }
    }

    fn validate_redis_url(url_type: &str, url: &str, result: &mut ValidationResult) {
        match Url::parse(url) {
            Ok(parsed) if matches!(parsed.scheme(), "redis" | "rediss") => {}
            Ok(parsed) => result.add_error(ConfigValidationError::InvalidUrl {
                url_type: url_type.to_string(),
                message: format!("unsupported scheme '{}'", parsed.scheme()),
            }),
            Err(e) => result.add_error(ConfigValidationError::InvalidUrl {
                url_type: url_type.to_string(),
                message: e.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CacheBackend;

    #[test]
    fn test_default_config_is_valid() {
        assert!(ConfigValidator::validate(&AppConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = AppConfig::default();
        config.server.port = 0;
        config.database.host = String::new();
        config.database.min_connections = 20;
        config.database.max_connections = 5;
        config.observability.log_level = "verbose".to_string();

        let errors = ConfigValidator::validate(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(errors.contains(&ConfigValidationError::InvalidPort {
            name: "server.port".to_string(),
            value: 0,
        }));
        assert!(errors.contains(&ConfigValidationError::EmptyValue {
            name: "database.host".to_string(),
        }));
        assert!(errors.contains(&ConfigValidationError::InvalidPoolSize { min: 20, max: 5 }));
        assert!(errors.contains(&ConfigValidationError::InvalidLogLevel {
            value: "verbose".to_string(),
        }));
    }

    #[test]
    fn test_invalid_cache_host_is_reported() {
        let mut config = AppConfig::default();
        config.cache.host = "bad host".to_string();

        let result = ConfigValidator::collect(&config);
        assert!(!result.is_valid());
        assert!(matches!(
            result.errors()[0],
            ConfigValidationError::InvalidUrl { ref url_type, .. } if url_type == "cache"
        ));
    }

    #[test]
    fn test_disabled_cache_skips_cache_checks() {
        let mut config = AppConfig::default();
        config.cache.backend = CacheBackend::Disabled;
        config.cache.pool_size = 0;
        config.cache.operation_timeout_ms = 0;

        assert!(ConfigValidator::validate(&config).is_ok());
    }

    #[test]
    fn test_disabled_broker_skips_broker_checks() {
        let mut config = AppConfig::default();
        config.broker.enabled = false;
        config.broker.key_prefix = String::new();

        assert!(ConfigValidator::validate(&config).is_ok());
    }

    #[test]
    fn test_zero_timeouts_rejected() {
        let mut config = AppConfig::default();
        config.cache.operation_timeout_ms = 0;
        config.broker.publish_timeout_ms = 0;

        let errors = ConfigValidator::validate(&config).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors
            .iter()
            .all(|e| matches!(e, ConfigValidationError::NonPositiveTimeout { .. })));
    }

    #[test]
    fn test_worker_needs_a_queue() {
        let mut config = AppConfig::default();
        config.worker.queues = vec![];

        let errors = ConfigValidator::validate(&config).unwrap_err();
        assert_eq!(errors, vec![ConfigValidationError::NoWorkerQueues]);
    }

    #[test]
    fn test_error_display() {
        let error = ConfigValidationError::InvalidPoolSize { min: 3, max: 1 };
        assert_eq!(
            error.to_string(),
            "Invalid pool size: min (3) cannot be greater than max (1)"
        );
    }
}
