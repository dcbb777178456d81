//! Configuration loader with layered sources.

use crate::{AppConfig, ConfigValidator};
use catalog_core::CatalogError;
use config::{Config, ConfigError, Environment, File};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Prefix for structured environment overrides, e.g. `CATALOG_DATABASE__PORT`.
pub const ENV_PREFIX: &str = "CATALOG";

/// Selects which `config/{environment}.toml` file is layered in.
pub const ENVIRONMENT_VAR: &str = "CATALOG_ENVIRONMENT";

/// Flat variables understood by the container deployment, applied last.
///
/// `REDIS_HOST` names the host for both the cache and the broker.
pub const LEGACY_ENV_OVERRIDES: &[(&str, &[&str])] = &[
    ("DB_HOST", &["database.host"]),
    ("DB_NAME", &["database.name"]),
    ("DB_USER", &["database.user"]),
    ("DB_PASS", &["database.password"]),
    ("REDIS_HOST", &["cache.host", "broker.host"]),
];

/// Configuration loader with runtime refresh support.
#[derive(Clone)]
pub struct ConfigLoader {
    config: Arc<RwLock<AppConfig>>,
    config_dir: PathBuf,
}

impl ConfigLoader {
    /// Creates a new configuration loader.
    ///
    /// Configuration is loaded from multiple sources in order:
    /// 1. `{config_dir}/default.toml` - Default values
    /// 2. `{config_dir}/{environment}.toml` - Environment-specific overrides
    /// 3. `{config_dir}/local.toml` - Local overrides
    /// 4. Environment variables with the `CATALOG_` prefix
    /// 5. `DB_HOST`, `DB_NAME`, `DB_USER`, `DB_PASS`, `REDIS_HOST`
    ///
    /// A `.env` file in the working directory is loaded into the process
    /// environment first.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if a source cannot be parsed or the
    /// result fails validation.
    pub fn new(config_dir: impl Into<PathBuf>) -> Result<Self, CatalogError> {
        if let Err(e) = dotenvy::dotenv() {
            debug!("No .env file found or error loading it: {}", e);
        }

        let config_dir = config_dir.into();
        let config = Self::load(&config_dir, &process_env())?;

        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            config_dir,
        })
    }

    /// Loads configuration from the default location (`./config`).
    ///
    /// # Errors
    ///
    /// See [`ConfigLoader::new`].
    pub fn from_default_location() -> Result<Self, CatalogError> {
        Self::new("./config")
    }

    /// Returns the current configuration.
    pub async fn get(&self) -> AppConfig {
        self.config.read().await.clone()
    }

    /// Reloads the configuration from disk and the process environment.
    ///
    /// # Errors
    ///
    /// Leaves the current configuration in place and returns the error if
    /// the new configuration cannot be loaded.
    pub async fn reload(&self) -> Result<(), CatalogError> {
        let new_config = Self::load(&self.config_dir, &process_env())?;
        *self.config.write().await = new_config;
        info!("Configuration reloaded successfully");
        Ok(())
    }

    /// Loads and validates configuration from `config_dir` using `env` as
    /// the environment.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if a source cannot be parsed or the
    /// result fails validation.
    pub fn load(config_dir: &Path, env: &HashMap<String, String>) -> Result<AppConfig, CatalogError> {
        let environment = env
            .get(ENVIRONMENT_VAR)
            .cloned()
            .unwrap_or_else(|| "development".to_string());

        info!(environment = %environment, config_dir = %config_dir.display(), "Loading configuration");

        let mut builder = Config::builder();

        for name in ["default", environment.as_str(), "local"] {
            let path = config_dir.join(format!("{name}.toml"));
            if path.exists() {
                debug!("Loading config from: {}", path.display());
                builder = builder.add_source(File::from(path).required(false));
            }
        }

        let env_source: config::Map<String, String> = env
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        builder = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .source(Some(env_source)),
            )
            .set_override("app.environment", environment.clone())
            .map_err(config_error_to_catalog_error)?;

        for (var, keys) in LEGACY_ENV_OVERRIDES {
            let value = env.get(*var).filter(|v| !v.is_empty());
            if value.is_some() {
                debug!(var = %var, "Applying legacy environment override");
            }
            for key in *keys {
                builder = builder
                    .set_override_option(*key, value.cloned())
                    .map_err(config_error_to_catalog_error)?;
            }
        }

        let app_config: AppConfig = builder
            .build()
            .and_then(|config| config.try_deserialize())
            .map_err(config_error_to_catalog_error)?;

        Self::validate_config(&app_config)?;

        Ok(app_config)
    }

    fn validate_config(config: &AppConfig) -> Result<(), CatalogError> {
        ConfigValidator::validate(config).map_err(|errors| {
            let message = errors
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; ");
            CatalogError::Configuration(message)
        })
    }
}

fn process_env() -> HashMap<String, String> {
    std::env::vars().collect()
}

fn config_error_to_catalog_error(err: ConfigError) -> CatalogError {
    CatalogError::Configuration(err.to_string())
}
