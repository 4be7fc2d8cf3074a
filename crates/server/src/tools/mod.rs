//! MCP tool implementations.
//!
//! This module contains all tools exposed by the swcache server.

pub mod sw_deploy;
pub mod sw_fetch;
pub mod sw_generations;
pub mod sw_message;

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use serde::Serialize;

use crate::error::ToolError;

pub use sw_fetch::SwFetchParams;
pub use sw_message::SwMessageParams;

/// Encode a tool output as pretty JSON text content.
pub(crate) fn json_result<T: Serialize>(output: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(output).map_err(|e| ToolError::SerializeFailed(e.to_string()))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    use swcache_client::{Fetcher, NetworkError, OfflineCache};
    use swcache_core::{AppConfig, CacheDb, Request, Response};

    /// Serves `"body of {path}"` for every URL until switched offline.
    #[derive(Default)]
    pub struct EchoNetwork {
        pub offline: AtomicBool,
    }

    #[async_trait::async_trait]
    impl Fetcher for EchoNetwork {
        async fn fetch(&self, request: &Request) -> Result<Response, NetworkError> {
            if self.offline.load(Ordering::SeqCst) {
                return Err(NetworkError::Offline);
            }
            Ok(Response::new(200, Vec::new(), format!("body of {}", request.url.path())))
        }
    }

    pub fn config() -> AppConfig {
        AppConfig {
            base_url: "https://app.test/".into(),
            precache: vec!["/".into(), "/offline.html".into(), "/app.js".into()],
            ..Default::default()
        }
    }

    pub async fn cache() -> (Arc<OfflineCache>, Arc<EchoNetwork>) {
        let network = Arc::new(EchoNetwork::default());
        let db = CacheDb::open_in_memory().await.unwrap();
        let fetcher: Arc<dyn Fetcher> = network.clone();
        let cache = OfflineCache::new(db, fetcher, &config()).await.unwrap();
        (Arc::new(cache), network)
    }

    pub fn output_json(result: &rmcp::model::CallToolResult) -> serde_json::Value {
        let text = result.content.first().and_then(|c| c.as_text()).map(|t| t.text.clone()).unwrap();
        serde_json::from_str(&text).unwrap()
    }
}
