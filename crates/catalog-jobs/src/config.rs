//! Job queue settings derived from the broker configuration.

use catalog_config::BrokerConfig;
use std::time::Duration;

/// Settings shared by the queue backends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueSettings {
    /// Key prefix for all job-related keys.
    pub key_prefix: String,
    /// How long completed job records and results are retained.
    pub result_ttl: Duration,
}

impl Default for QueueSettings {
    fn default() -> Self {
        Self::from(&BrokerConfig::default())
    }
}

impl From<&BrokerConfig> for QueueSettings {
    fn from(config: &BrokerConfig) -> Self {
        Self {
            key_prefix: config.key_prefix.clone(),
            result_ttl: config.result_ttl(),
        }
    }
}
