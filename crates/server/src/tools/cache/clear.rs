//! cache_clear tool implementation.

use super::status::CacheStatusOutput;
use crate::tools::json_result;
use edgecache_client::{ControlMessage, ControllerHandle};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Output from the cache_clear tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheClearOutput {
    /// Partitions that existed before the clear.
    pub cleared: usize,
    /// Occupancy after the clear.
    pub status: CacheStatusOutput,
}

/// Implementation of the cache_clear tool.
pub async fn clear_impl(handle: &ControllerHandle) -> Result<CallToolResult, McpError> {
    let before = handle.request_status().await?;
    handle.post(ControlMessage::ClearCache).await?;
    let after = handle.request_status().await?;

    json_result(&CacheClearOutput { cleared: before.total_caches, status: after.into() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::{fixture, output};
    use wiremock::MockServer;

    #[tokio::test]
    async fn test_clear_removes_partitions() {
        let server = MockServer::start().await;
        let fixture = fixture(&server).await;
        fixture.controller.install().await;

        let result = output(&clear_impl(&fixture.handle).await.unwrap());

        assert_eq!(result["cleared"], 3);
        assert_eq!(result["status"]["totalCaches"], 0);
    }
}
