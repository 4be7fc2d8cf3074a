//! Request classification.
//!
//! Rules, first match wins:
//! 1. Non-read-safe method → bypass
//! 2. Scheme other than http/https → bypass
//! 3. Path under the data prefix → [`RouteClass::DataAsset`]
//! 4. Path extension in the static set → [`RouteClass::StaticAsset`]
//! 5. Host in the trusted allow-list → [`RouteClass::ExternalAsset`]
//! 6. Otherwise → [`RouteClass::Document`]

use serde::Serialize;
use swcache_core::{AppConfig, Request};

/// Policy class of an intercepted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RouteClass {
    DataAsset,
    StaticAsset,
    ExternalAsset,
    Document,
}

/// Why a request was left to the default network path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum BypassReason {
    UnsafeMethod,
    ForeignScheme,
}

/// Outcome of classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Bypass(BypassReason),
    Intercept(RouteClass),
}

/// Classifies requests by URL shape.
#[derive(Debug, Clone)]
pub struct Router {
    data_prefix: String,
    static_extensions: Vec<String>,
    trusted_hosts: Vec<String>,
}

impl Router {
    pub fn new(data_prefix: &str, static_extensions: &[String], trusted_hosts: &[String]) -> Self {
        Self {
            data_prefix: data_prefix.to_string(),
            static_extensions: static_extensions.iter().map(|e| e.trim_start_matches('.').to_lowercase()).collect(),
            trusted_hosts: trusted_hosts.iter().map(|h| h.to_lowercase()).collect(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(&config.data_prefix, &config.static_extensions, &config.trusted_hosts)
    }

    /// Classify a request. Total and side-effect free.
    pub fn classify(&self, request: &Request) -> Route {
        if !request.is_read_safe() {
            return Route::Bypass(BypassReason::UnsafeMethod);
        }

        if !matches!(request.url.scheme(), "http" | "https") {
            return Route::Bypass(BypassReason::ForeignScheme);
        }

        let path = request.url.path();
        if path.starts_with(&self.data_prefix) {
            return Route::Intercept(RouteClass::DataAsset);
        }

        if let Some(ext) = extension(path)
            && self.static_extensions.iter().any(|e| e.eq_ignore_ascii_case(ext))
        {
            return Route::Intercept(RouteClass::StaticAsset);
        }

        if let Some(host) = request.url.host_str()
            && self.trusted_hosts.iter().any(|h| h == host)
        {
            return Route::Intercept(RouteClass::ExternalAsset);
        }

        Route::Intercept(RouteClass::Document)
    }
}

/// Extension of the last path segment, without the dot.
fn extension(path: &str) -> Option<&str> {
    let segment = path.rsplit('/').next()?;
    let (stem, ext) = segment.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() { None } else { Some(ext) }
}
