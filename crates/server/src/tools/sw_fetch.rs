//! sw_fetch tool implementation.
//!
//! Runs one request through the offline cache and reports where the
//! response came from.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swcache_client::{BypassReason, Intercept, OfflineCache, RouteClass, Source, Strategy};
use swcache_core::{Error, Request, Response};

use super::json_result;
use crate::error::ToolError;

/// Input parameters for sw_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwFetchParams {
    /// Absolute request URL.
    pub url: String,

    /// HTTP method (default: GET).
    #[serde(default = "default_method")]
    pub method: String,

    /// Whether this is a full document navigation.
    #[serde(default)]
    pub navigate: bool,
}

fn default_method() -> String {
    "GET".into()
}

/// Output structure for sw_fetch tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct SwFetchOutput {
    pub url: String,
    pub method: String,
    /// Route class, absent when bypassed.
    pub route: Option<RouteClass>,
    /// Strategy used, absent when bypassed.
    pub strategy: Option<Strategy>,
    /// Where the response came from, absent when bypassed.
    pub source: Option<Source>,
    /// Why the request skipped the cache.
    pub bypass: Option<BypassReason>,
    pub status: u16,
    pub headers: Vec<(String, String)>,
    /// Body decoded as UTF-8 (lossy).
    pub body: String,
    /// ISO8601 capture time of the response.
    pub captured_at: String,
}

impl SwFetchOutput {
    fn new(request: &Request, response: &Response) -> Self {
        Self {
            url: request.url.to_string(),
            method: request.method.clone(),
            route: None,
            strategy: None,
            source: None,
            bypass: None,
            status: response.status,
            headers: response.headers.clone(),
            body: response.text(),
            captured_at: response.captured_at.to_rfc3339(),
        }
    }
}

/// Implementation of the sw_fetch tool.
pub async fn fetch_impl(cache: &OfflineCache, params: SwFetchParams) -> Result<CallToolResult, McpError> {
    if params.url.trim().is_empty() {
        return Err(ToolError::InvalidInput("url cannot be empty".into()).into());
    }

    let mut request = Request::new(&params.method, params.url.trim())?;
    request.navigate = params.navigate;

    let output = match cache.handle(&request).await {
        Intercept::Passthrough(reason) => {
            let response = cache.passthrough(&request).await.map_err(Error::from)?;
            SwFetchOutput { bypass: Some(reason), ..SwFetchOutput::new(&request, &response) }
        }
        Intercept::Respond { class, strategy, served } => SwFetchOutput {
            route: Some(class),
            strategy: Some(strategy),
            source: Some(served.source),
            ..SwFetchOutput::new(&request, &served.response)
        },
    };

    json_result(&output)
}
