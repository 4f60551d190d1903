//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the appropriate implementations.
use crate::tools::{
    CacheFetchParams, CacheUpdateParams,
    cache::{clear_impl, status_impl, update_impl},
    cache_fetch::fetch_impl,
    skip_waiting::skip_waiting_impl,
};

use edgecache_client::{CacheController, ControllerHandle, FetchClient};
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
use std::sync::Arc;

/// The main MCP server handler for edgecache.
#[derive(Clone)]
pub struct EdgecacheServer {
    controller: Arc<CacheController<FetchClient>>,
    handle: ControllerHandle,
    tool_router: ToolRouter<Self>,
}

/// Tool router implementation using the #[tool_router] macro.
///
/// This macro generates the routing logic that maps tool names to handler methods.
#[tool_router]
impl EdgecacheServer {
    /// Create a server around a running controller and its message channel.
    pub fn new(controller: Arc<CacheController<FetchClient>>, handle: ControllerHandle) -> Self {
        Self { controller, handle, tool_router: Self::tool_router() }
    }

    /// Dispatch one request through the cache controller.
    #[tool(
        description = "Fetch a URL through the cache controller. Reports the status, which strategy answered it and whether it came from the network, the cache, a fallback or was synthesized."
    )]
    async fn cache_fetch(&self, params: Parameters<CacheFetchParams>) -> Result<CallToolResult, McpError> {
        fetch_impl(&self.controller, params.0).await
    }

    #[tool(description = "Report cache partitions with their entry counts, the current version and total bytes.")]
    async fn cache_status(&self) -> Result<CallToolResult, McpError> {
        status_impl(&self.handle).await
    }

    #[tool(description = "Delete every cache partition.")]
    async fn cache_clear(&self) -> Result<CallToolResult, McpError> {
        clear_impl(&self.handle).await
    }

    #[tool(description = "Store a JSON document as the cached response for a URL in the dynamic partition.")]
    async fn cache_update(&self, params: Parameters<CacheUpdateParams>) -> Result<CallToolResult, McpError> {
        update_impl(&self.handle, params.0).await
    }

    #[tool(description = "Activate the installed cache version immediately, purging partitions from older versions.")]
    async fn skip_waiting(&self) -> Result<CallToolResult, McpError> {
        skip_waiting_impl(&self.controller, &self.handle).await
    }
}

impl ServerHandler for EdgecacheServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "edgecache".into(),
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::fixture;
    use wiremock::MockServer;

    #[tokio::test]
    async fn test_all_tools_registered() {
        let server = MockServer::start().await;
        let fixture = fixture(&server).await;
        let handler = EdgecacheServer::new(fixture.controller, fixture.handle);

        let mut names: Vec<String> = handler.tool_router.list_all().into_iter().map(|t| t.name.to_string()).collect();
        names.sort();

        assert_eq!(names, vec!["cache_clear", "cache_fetch", "cache_status", "cache_update", "skip_waiting"]);
    }
}
