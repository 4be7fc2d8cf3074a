//! sw_deploy tool implementation.
//!
//! Installs the configured version and activates it unless sessions are open.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use swcache_client::OfflineCache;

use super::json_result;

/// Implementation of the sw_deploy tool.
pub async fn deploy_impl(cache: &OfflineCache) -> Result<CallToolResult, McpError> {
    let outcome = cache.lifecycle().deploy().await?;
    json_result(&outcome)
}
