//! cache_status tool implementation.

use crate::tools::json_result;
use edgecache_client::{CacheStatus, ControllerHandle};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Output from the cache_status tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CacheStatusOutput {
    /// Entry count per partition.
    pub caches: BTreeMap<String, u64>,
    pub total_caches: usize,
    /// Version tag of the current partition set.
    pub version: String,
    /// Approximate size of all cached bodies in bytes.
    pub total_bytes: u64,
}

impl From<CacheStatus> for CacheStatusOutput {
    fn from(status: CacheStatus) -> Self {
        Self {
            caches: status.caches,
            total_caches: status.total_caches,
            version: status.version,
            total_bytes: status.total_bytes,
        }
    }
}

/// Implementation of the cache_status tool.
pub async fn status_impl(handle: &ControllerHandle) -> Result<CallToolResult, McpError> {
    let status = handle.request_status().await?;
    json_result(&CacheStatusOutput::from(status))
}
