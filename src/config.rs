//! Client configuration
//! Loaded from environment variables with serde defaults for everything,
//! so a bare `ClientConfig::from_env()` works against a local backend.

use config::{Config, Environment};
use serde::Deserialize;

use crate::error::Result;

/// Top-level client configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// Backend base URL, e.g. "http://localhost:3000/api/v1"
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request deadline (seconds)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Maximum age of persisted credentials (seconds). Records older than
    /// this are discarded on read regardless of the tokens' own expiry.
    #[serde(default = "default_max_credential_age_secs")]
    pub max_credential_age_secs: u64,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format: json, pretty
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_base_url() -> String {
    "http://localhost:3000/api/v1".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

// 24 hours
fn default_max_credential_age_secs() -> u64 {
    24 * 60 * 60
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            max_credential_age_secs: default_max_credential_age_secs(),
            logging: LoggingConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Load configuration from `WASTEDESK_*` environment variables.
    ///
    /// Nested fields use `__` as separator, e.g. `WASTEDESK_LOGGING__LEVEL`.
    pub fn from_env() -> Result<Self> {
        let cfg = Config::builder()
            .add_source(
                Environment::with_prefix("WASTEDESK")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;
        Ok(cfg.try_deserialize()?)
    }
}
