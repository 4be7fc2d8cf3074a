//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::AppConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },
}

impl ConfigError {
    fn invalid(field: &str, reason: &str) -> Self {
        ConfigError::Invalid { field: field.into(), reason: reason.into() }
    }
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if `version` or `cache_prefix` is empty,
    /// and `ConfigError::Invalid` if:
    /// - `version` contains whitespace
    /// - `base_url` is not an absolute http(s) URL
    /// - `data_prefix` does not start and end with `/`
    /// - `offline_document` or `root_document` is not an absolute path
    /// - `timeout_ms` is set and below 100ms or above 5 minutes
    /// - `precache_concurrency` is 0 or above 16
    /// - `user_agent` is empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version.is_empty() {
            return Err(ConfigError::Missing {
                field: "version".into(),
                hint: "Set SWCACHE_VERSION to the build/release identifier".into(),
            });
        }
        if self.version.chars().any(char::is_whitespace) {
            return Err(ConfigError::invalid("version", "must not contain whitespace"));
        }
        if self.cache_prefix.is_empty() {
            return Err(ConfigError::Missing {
                field: "cache_prefix".into(),
                hint: "Set SWCACHE_CACHE_PREFIX or keep the default".into(),
            });
        }

        let base = self.base_url()?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(ConfigError::invalid("base_url", "must use http or https"));
        }

        if !self.data_prefix.starts_with('/') || !self.data_prefix.ends_with('/') {
            return Err(ConfigError::invalid("data_prefix", "must start and end with '/'"));
        }

        for (field, path) in [("offline_document", &self.offline_document), ("root_document", &self.root_document)] {
            if !path.starts_with('/') {
                return Err(ConfigError::invalid(field, "must be an absolute path"));
            }
        }

        if let Some(timeout_ms) = self.timeout_ms {
            if timeout_ms < 100 {
                return Err(ConfigError::invalid("timeout_ms", "must be at least 100ms"));
            }
            if timeout_ms > 300_000 {
                return Err(ConfigError::invalid("timeout_ms", "must not exceed 5 minutes (300000ms)"));
            }
        }

        if self.precache_concurrency == 0 || self.precache_concurrency > 16 {
            return Err(ConfigError::invalid("precache_concurrency", "must be between 1 and 16"));
        }

        if self.user_agent.is_empty() {
            return Err(ConfigError::invalid("user_agent", "must not be empty"));
        }

        if self.precache.is_empty() {
            tracing::warn!(version = %self.version, "precache manifest is empty; offline fallbacks will be unavailable");
        }

        Ok(())
    }
}
