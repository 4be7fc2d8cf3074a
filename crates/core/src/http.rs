//! Plain request/response records crossing the engine boundary.
//!
//! The host hands the engine a [`Request`] and gets a [`Response`] back;
//! neither type is tied to a particular HTTP library.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::Error;
use crate::cache::hash::compute_entry_key;

/// Status code of the synthetic unavailability response.
pub const OFFLINE_STATUS: u16 = 503;

/// Body of the synthetic unavailability response.
pub const OFFLINE_BODY: &str = "Offline";

/// Header name/value pairs in arrival order.
pub type Headers = Vec<(String, String)>;

/// An intercepted outgoing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// Upper-cased HTTP method.
    pub method: String,
    pub url: Url,
    pub headers: Headers,
    pub body: Option<Bytes>,
    /// Top-level document load rather than a sub-resource fetch.
    pub navigate: bool,
}

impl Request {
    /// Build a request from a method and an absolute URL string.
    pub fn new(method: &str, url: &str) -> Result<Self, Error> {
        let method = method.trim().to_ascii_uppercase();
        if method.is_empty() {
            return Err(Error::InvalidInput("method cannot be empty".into()));
        }
        let url = Url::parse(url.trim()).map_err(|e| Error::InvalidUrl(format!("{url}: {e}")))?;
        Ok(Self { method, url, headers: Vec::new(), body: None, navigate: false })
    }

    /// A `GET` sub-resource request.
    pub fn get(url: &str) -> Result<Self, Error> {
        Self::new("GET", url)
    }

    /// A `GET` top-level navigation.
    pub fn navigation(url: &str) -> Result<Self, Error> {
        Ok(Self { navigate: true, ..Self::get(url)? })
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Whether the method is a safe retrieval verb (`GET` or `HEAD`).
    pub fn is_read_safe(&self) -> bool {
        matches!(self.method.as_str(), "GET" | "HEAD")
    }

    /// Canonical identity used as the cache key.
    pub fn identity(&self) -> RequestIdentity {
        RequestIdentity::new(&self.method, &self.url)
    }
}

/// Canonical cache key: method plus absolute URL without fragment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, schemars::JsonSchema)]
pub struct RequestIdentity {
    pub method: String,
    pub url: String,
}

impl RequestIdentity {
    pub fn new(method: &str, url: &Url) -> Self {
        let mut url = url.clone();
        url.set_fragment(None);
        Self { method: method.to_ascii_uppercase(), url: url.to_string() }
    }

    /// `GET` identity for a URL, as used for precache and fallback documents.
    pub fn get(url: &Url) -> Self {
        Self::new("GET", url)
    }

    /// SHA-256 hex key stored in the `entries` table.
    pub fn key(&self) -> String {
        compute_entry_key(&self.method, &self.url)
    }
}

/// A captured response.
///
/// The body is reference-counted: cloning the response yields an independent
/// handle that can be returned to the caller and written to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub headers: Headers,
    pub body: Bytes,
    pub captured_at: DateTime<Utc>,
}

impl Response {
    pub fn new(status: u16, headers: Headers, body: impl Into<Bytes>) -> Self {
        Self { status, headers, body: body.into(), captured_at: Utc::now() }
    }

    /// The synthetic 503 "Offline" response returned on total failure.
    pub fn offline() -> Self {
        Self::new(
            OFFLINE_STATUS,
            vec![("content-type".to_string(), "text/plain".to_string())],
            Bytes::from_static(OFFLINE_BODY.as_bytes()),
        )
    }

    /// Status in the 2xx range.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// First header value matching `name`, case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Body decoded as UTF-8, lossy.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).to_string()
    }
}
