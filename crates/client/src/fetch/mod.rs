//! Network fetch capability.
//!
//! The engine only sees the [`Fetcher`] trait; [`FetchClient`] is the
//! reqwest-backed implementation used by the binary.
//!
//! ### Failure model
//! - DNS errors, refused connections, timeouts and offline state are
//!   [`NetworkError`]s.
//! - Any HTTP status, including 4xx/5xx, is a successful fetch and comes
//!   back as a [`Response`].
//!
//! ### Limits
//! - No timeout unless one is configured.
//! - Max redirects: 5 (configurable)

pub mod error;
pub mod url;

use reqwest::{Client, Method, header};
use std::time::{Duration, Instant};
use swcache_core::{AppConfig, Error, Request, Response};

pub use error::NetworkError;
pub use self::url::{UrlError, resolve};

/// The host environment's ability to perform a network request.
#[async_trait::async_trait]
pub trait Fetcher: Send + Sync {
    /// Perform the request, returning a response for any HTTP status.
    async fn fetch(&self, request: &Request) -> Result<Response, NetworkError>;
}

/// Configuration for the fetch client.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string (default: "swcache/0.1")
    pub user_agent: String,

    /// Request timeout (default: none)
    pub timeout: Option<Duration>,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self { user_agent: "swcache/0.1".to_string(), timeout: None, max_redirects: 5 }
    }
}

impl From<&AppConfig> for FetchConfig {
    fn from(config: &AppConfig) -> Self {
        Self { user_agent: config.user_agent.clone(), timeout: config.timeout(), max_redirects: config.max_redirects }
    }
}

/// reqwest-backed [`Fetcher`].
pub struct FetchClient {
    http: Client,
    config: FetchConfig,
}

impl FetchClient {
    /// Create a new fetch client with the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self, Error> {
        let mut builder = Client::builder()
            .user_agent(&config.user_agent)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true);

        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        let http = builder
            .build()
            .map_err(|e| Error::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { http, config })
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }
}

#[async_trait::async_trait]
impl Fetcher for FetchClient {
    async fn fetch(&self, request: &Request) -> Result<Response, NetworkError> {
        let start = Instant::now();
        let method = Method::from_bytes(request.method.as_bytes())
            .map_err(|_| NetworkError::InvalidMethod(request.method.clone()))?;

        let mut builder = self.http.request(method, request.url.clone());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send().await?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.to_string(), v.to_string())))
            .collect::<Vec<_>>();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let body = response.bytes().await?;

        tracing::debug!(
            method = %request.method,
            url = %request.url,
            status,
            content_type = content_type.as_deref().unwrap_or(""),
            bytes = body.len(),
            fetch_ms = start.elapsed().as_millis() as u64,
            "network fetch complete"
        );

        Ok(Response::new(status, headers, body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_config_default() {
        let config = FetchConfig::default();
        assert_eq!(config.user_agent, "swcache/0.1");
        assert_eq!(config.timeout, None);
        assert_eq!(config.max_redirects, 5);
    }

    #[test]
    fn test_fetch_config_from_app_config() {
        let app = AppConfig { user_agent: "app/2".into(), timeout_ms: Some(2500), max_redirects: 2, ..Default::default() };
        let config = FetchConfig::from(&app);
        assert_eq!(config.user_agent, "app/2");
        assert_eq!(config.timeout, Some(Duration::from_millis(2500)));
        assert_eq!(config.max_redirects, 2);
    }

    #[tokio::test]
    async fn test_fetch_client_new() {
        let client = FetchClient::new(FetchConfig::default());
        assert!(client.is_ok());
    }

    #[tokio::test]
    async fn test_fetch_rejects_invalid_method() {
        let client = FetchClient::new(FetchConfig::default()).unwrap();
        let request = Request::new("GE T", "https://example.com/").unwrap();
        let result = client.fetch(&request).await;
        assert!(matches!(result, Err(NetworkError::InvalidMethod(_))));
    }

    #[tokio::test]
    async fn test_fetch_connection_refused_is_network_error() {
        let client = FetchClient::new(FetchConfig::default()).unwrap();
        let request = Request::get("http://127.0.0.1:9/").unwrap();
        let result = client.fetch(&request).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    #[ignore = "requires network"]
    async fn test_fetch_http_error_status_is_response() {
        let client = FetchClient::new(FetchConfig::default()).unwrap();
        let request = Request::get("https://httpbin.org/status/404").unwrap();
        let response = client.fetch(&request).await.unwrap();
        assert_eq!(response.status, 404);
    }
}
