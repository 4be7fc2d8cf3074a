//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (SWCACHE_*)
//! 2. TOML config file (if SWCACHE_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (SWCACHE_*)
/// 2. TOML config file (if SWCACHE_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to SQLite cache database.
    ///
    /// Set via SWCACHE_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Prefix shared by every generation name.
    #[serde(default = "default_cache_prefix")]
    pub cache_prefix: String,

    /// Build/release identifier. Changing it triggers a new install.
    ///
    /// Set via SWCACHE_VERSION environment variable.
    #[serde(default = "default_version")]
    pub version: String,

    /// Origin the application is served from; precache paths resolve against it.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Paths or absolute URLs that must be resident before activation.
    #[serde(default = "default_precache")]
    pub precache: Vec<String>,

    /// Document served to navigations when offline with no cached copy.
    #[serde(default = "default_offline_document")]
    pub offline_document: String,

    /// Last-resort document for navigations.
    #[serde(default = "default_root_document")]
    pub root_document: String,

    /// Path prefix of data assets (cache-first).
    #[serde(default = "default_data_prefix")]
    pub data_prefix: String,

    /// File extensions treated as static assets (stale-while-revalidate).
    #[serde(default = "default_static_extensions")]
    pub static_extensions: Vec<String>,

    /// Third-party asset hosts (fonts, CDN) cached cache-first.
    #[serde(default = "default_trusted_hosts")]
    pub trusted_hosts: Vec<String>,

    /// User-Agent string for network requests.
    ///
    /// Set via SWCACHE_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Optional network timeout in milliseconds. Unset means no timeout.
    ///
    /// Set via SWCACHE_TIMEOUT_MS environment variable.
    #[serde(default)]
    pub timeout_ms: Option<u64>,

    /// Maximum number of redirects followed per request.
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,

    /// Whether transport-successful responses with a non-2xx status are cached.
    #[serde(default = "default_true")]
    pub cache_error_responses: bool,

    /// Concurrent fetches while populating a generation.
    #[serde(default = "default_precache_concurrency")]
    pub precache_concurrency: usize,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./swcache.sqlite")
}

fn default_cache_prefix() -> String {
    "app-cache".into()
}

fn default_version() -> String {
    "v1".into()
}

fn default_base_url() -> String {
    "http://localhost:8080/".into()
}

fn default_precache() -> Vec<String> {
    vec!["/".into(), "/offline.html".into()]
}

fn default_offline_document() -> String {
    "/offline.html".into()
}

fn default_root_document() -> String {
    "/".into()
}

fn default_data_prefix() -> String {
    "/data/".into()
}

fn default_static_extensions() -> Vec<String> {
    vec!["js".into(), "css".into()]
}

fn default_trusted_hosts() -> Vec<String> {
    vec!["fonts.googleapis.com".into(), "fonts.gstatic.com".into(), "cdn.jsdelivr.net".into()]
}

fn default_user_agent() -> String {
    "swcache/0.1".into()
}

fn default_max_redirects() -> usize {
    5
}

fn default_true() -> bool {
    true
}

fn default_precache_concurrency() -> usize {
    4
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            cache_prefix: default_cache_prefix(),
            version: default_version(),
            base_url: default_base_url(),
            precache: default_precache(),
            offline_document: default_offline_document(),
            root_document: default_root_document(),
            data_prefix: default_data_prefix(),
            static_extensions: default_static_extensions(),
            trusted_hosts: default_trusted_hosts(),
            user_agent: default_user_agent(),
            timeout_ms: None,
            max_redirects: default_max_redirects(),
            cache_error_responses: true,
            precache_concurrency: default_precache_concurrency(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio, if one is configured.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    /// Name of the generation for the configured version.
    pub fn generation_name(&self) -> String {
        format!("{}-{}", self.cache_prefix, self.version)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `SWCACHE_`
    /// 2. TOML file from `SWCACHE_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("SWCACHE_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("SWCACHE_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }

    /// Parse the configured base URL.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if `base_url` is not an absolute URL.
    pub fn base_url(&self) -> Result<url::Url, ConfigError> {
        url::Url::parse(&self.base_url)
            .map_err(|e| ConfigError::Invalid { field: "base_url".into(), reason: e.to_string() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.db_path, PathBuf::from("./swcache.sqlite"));
        assert_eq!(config.cache_prefix, "app-cache");
        assert_eq!(config.version, "v1");
        assert_eq!(config.data_prefix, "/data/");
        assert_eq!(config.static_extensions, vec!["js", "css"]);
        assert_eq!(config.offline_document, "/offline.html");
        assert_eq!(config.root_document, "/");
        assert!(config.timeout_ms.is_none());
        assert!(config.cache_error_responses);
        assert_eq!(config.precache_concurrency, 4);
    }

    #[test]
    fn test_generation_name() {
        let config = AppConfig { version: "2024.06.1".into(), ..Default::default() };
        assert_eq!(config.generation_name(), "app-cache-2024.06.1");
    }

    #[test]
    fn test_timeout_duration() {
        assert_eq!(AppConfig::default().timeout(), None);
        let config = AppConfig { timeout_ms: Some(1500), ..Default::default() };
        assert_eq!(config.timeout(), Some(Duration::from_millis(1500)));
    }

    #[test]
    fn test_base_url_parse() {
        let config = AppConfig::default();
        assert_eq!(config.base_url().unwrap().as_str(), "http://localhost:8080/");

        let config = AppConfig { base_url: "not a url".into(), ..Default::default() };
        assert!(matches!(config.base_url(), Err(ConfigError::Invalid { field, .. }) if field == "base_url"));
    }

    #[test]
    fn test_load_from_toml_and_env() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "swcache.toml",
                r#"
                    version = "v7"
                    precache = ["/", "/app.js"]
                    trusted_hosts = ["cdn.example.net"]
                "#,
            )?;
            jail.set_env("SWCACHE_CONFIG_FILE", "swcache.toml");
            jail.set_env("SWCACHE_USER_AGENT", "custom/1.0");

            let config = AppConfig::load().expect("config loads");
            assert_eq!(config.version, "v7");
            assert_eq!(config.precache, vec!["/", "/app.js"]);
            assert_eq!(config.trusted_hosts, vec!["cdn.example.net"]);
            assert_eq!(config.user_agent, "custom/1.0");
            Ok(())
        });
    }

    #[test]
    fn test_env_overrides_file() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("swcache.toml", r#"version = "from-file""#)?;
            jail.set_env("SWCACHE_CONFIG_FILE", "swcache.toml");
            jail.set_env("SWCACHE_VERSION", "from-env");

            let config = AppConfig::load().expect("config loads");
            assert_eq!(config.version, "from-env");
            Ok(())
        });
    }
}
