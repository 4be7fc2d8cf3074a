//! sw_message tool implementation.
//!
//! Delivers a raw control message to the control channel.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swcache_client::OfflineCache;

use super::json_result;

/// Input parameters for sw_message tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwMessageParams {
    /// Control message, e.g. `{"kind": "ADOPT_NOW"}` or
    /// `{"kind": "BACKGROUND_SYNC", "tag": "outbox"}`.
    pub message: serde_json::Value,
}

/// Implementation of the sw_message tool.
pub async fn message_impl(cache: &OfflineCache, params: SwMessageParams) -> Result<CallToolResult, McpError> {
    let outcome = cache.control().deliver(&params.message).await?;
    json_result(&outcome)
}
