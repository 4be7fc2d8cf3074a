//! Transport-level failures of the network fetch capability.

use std::sync::Arc;

/// A fetch that produced no HTTP response at all.
///
/// An HTTP error status is not a `NetworkError`; it comes back as a
/// regular [`swcache_core::Response`].
#[derive(Debug, Clone, thiserror::Error)]
pub enum NetworkError {
    /// Request timed out.
    #[error("request timeout")]
    Timeout,

    /// DNS failure or refused connection.
    #[error("connection failed: {0}")]
    Connect(String),

    /// The host reports no connectivity.
    #[error("offline")]
    Offline,

    /// Method could not be expressed as an HTTP method.
    #[error("invalid method: {0}")]
    InvalidMethod(String),

    /// Any other transport error.
    #[error("network error: {0}")]
    Transport(Arc<reqwest::Error>),
}

impl From<reqwest::Error> for NetworkError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            NetworkError::Timeout
        } else if err.is_connect() {
            NetworkError::Connect(err.to_string())
        } else {
            NetworkError::Transport(Arc::new(err))
        }
    }
}

impl From<NetworkError> for swcache_core::Error {
    fn from(err: NetworkError) -> Self {
        swcache_core::Error::Network(err.to_string())
    }
}
