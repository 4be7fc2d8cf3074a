//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the offline cache engine.
use std::sync::Arc;

use crate::tools::{
    SwFetchParams, SwMessageParams, sw_deploy::deploy_impl, sw_fetch::fetch_impl,
    sw_generations::generations_impl, sw_message::message_impl,
};

use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};
use swcache_client::OfflineCache;

/// The main MCP server handler for swcache.
#[derive(Clone)]
pub struct SwCacheServer {
    cache: Arc<OfflineCache>,
    tool_router: ToolRouter<Self>,
}

/// Tool router implementation using the #[tool_router] macro.
///
/// This macro generates the routing logic that maps tool names to handler methods.
#[tool_router]
impl SwCacheServer {
    /// Create a new server handler around an initialized engine.
    pub fn new(cache: Arc<OfflineCache>) -> Self {
        Self { cache, tool_router: Self::tool_router() }
    }

    #[tool(
        description = "Run a request through the offline cache. Returns status, headers, body text, route class, strategy and where the response came from."
    )]
    async fn sw_fetch(&self, params: Parameters<SwFetchParams>) -> Result<CallToolResult, McpError> {
        fetch_impl(&self.cache, params.0).await
    }

    #[tool(description = "Deliver a control message: {\"kind\": \"ADOPT_NOW\"} or {\"kind\": \"BACKGROUND_SYNC\", \"tag\": ...}.")]
    async fn sw_message(&self, params: Parameters<SwMessageParams>) -> Result<CallToolResult, McpError> {
        message_impl(&self.cache, params.0).await
    }

    #[tool(description = "List cache generations with their state and entry counts, plus engine counters.")]
    async fn sw_generations(&self) -> Result<CallToolResult, McpError> {
        generations_impl(&self.cache).await
    }

    #[tool(description = "Install the configured version from the precache manifest and activate it.")]
    async fn sw_deploy(&self) -> Result<CallToolResult, McpError> {
        deploy_impl(&self.cache).await
    }
}

impl ServerHandler for SwCacheServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "swcache".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}
