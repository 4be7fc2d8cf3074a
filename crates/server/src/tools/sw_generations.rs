//! sw_generations tool implementation.
//!
//! Lists cache generations and engine counters.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swcache_client::{OfflineCache, RevalidationStats};
use swcache_core::{GenerationInfo, StoreStats};

use super::json_result;

/// Output structure for sw_generations tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct SwGenerationsOutput {
    /// Generation currently serving requests.
    pub active: Option<String>,
    /// Generation the configured version installs into.
    pub configured: String,
    pub generations: Vec<GenerationInfo>,
    /// Open client sessions.
    pub sessions: usize,
    pub revalidation: RevalidationStats,
    pub store: StoreStats,
}

/// Implementation of the sw_generations tool.
pub async fn generations_impl(cache: &OfflineCache) -> Result<CallToolResult, McpError> {
    let lifecycle = cache.lifecycle();
    let output = SwGenerationsOutput {
        active: lifecycle.active().get().await.map(|g| g.name().to_string()),
        configured: lifecycle.generation_name().to_string(),
        generations: lifecycle.generations().await?,
        sessions: lifecycle.sessions(),
        revalidation: cache.revalidation_stats(),
        store: cache.store_stats(),
    };
    json_result(&output)
}
