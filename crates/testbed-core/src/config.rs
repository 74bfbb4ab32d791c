//! Configuration
//!
//! The CLI binary and the dashboard server share one JSON configuration file
//! (`conf/config.json` by default) carrying the API key and the poll bounds.

use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;

/// Default payment API base URL.
pub const DEFAULT_API_BASE: &str = "https://api.stripe.com/v1";

/// Bounds for the confirmation and settlement poll loops.
#[derive(Clone, Debug, Deserialize)]
pub struct PollSettings {
    /// Seconds to sleep between re-fetches
    #[serde(default = "default_check_interval")]
    pub check_interval: u64,

    /// Maximum re-fetches per loop
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

fn default_check_interval() -> u64 {
    5
}

fn default_max_attempts() -> u32 {
    6
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            check_interval: default_check_interval(),
            max_attempts: default_max_attempts(),
        }
    }
}

/// Shared harness configuration.
#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    /// Secret API key for the payment service
    pub stripe_api_key: String,

    /// API base URL override (test doubles, local stubs)
    #[serde(default)]
    pub api_base: Option<String>,

    #[serde(default)]
    pub payment_settings: PollSettings,
}

impl Config {
    /// Load and validate the configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config: Config = serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        if config.stripe_api_key.trim().is_empty() {
            return Err(ConfigError::MissingApiKey);
        }

        Ok(config)
    }

    /// API base URL, falling back to the public endpoint.
    pub fn api_base(&self) -> &str {
        self.api_base.as_deref().unwrap_or(DEFAULT_API_BASE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_poll_settings_defaults() {
        let config: Config =
            serde_json::from_str(r#"{"stripe_api_key": "sk_test_x"}"#).unwrap();
        assert_eq!(config.payment_settings.check_interval, 5);
        assert_eq!(config.payment_settings.max_attempts, 6);
        assert_eq!(config.api_base(), DEFAULT_API_BASE);
    }

    #[test]
    fn test_poll_settings_override() {
        let config: Config = serde_json::from_str(
            r#"{
                "stripe_api_key": "sk_test_x",
                "payment_settings": {"check_interval": 2, "max_attempts": 10}
            }"#,
        )
        .unwrap();
        assert_eq!(config.payment_settings.check_interval, 2);
        assert_eq!(config.payment_settings.max_attempts, 10);
    }

    #[test]
    fn test_missing_file_is_fatal() {
        let err = Config::load("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_empty_key_rejected() {
        let dir = std::env::temp_dir().join("testbed-core-config-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.json");
        std::fs::write(&path, r#"{"stripe_api_key": "  "}"#).unwrap();

        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::MissingApiKey));
    }
}
