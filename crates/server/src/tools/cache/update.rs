//! cache_update tool implementation.
//!
//! Stores caller-provided JSON as the cached response for a URL.

use super::status::CacheStatusOutput;
use crate::tools::json_result;
use edgecache_client::{ControlMessage, ControllerHandle};
use edgecache_core::Error;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the cache_update tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheUpdateParams {
    /// URL to store the data under; relative URLs resolve against the origin.
    pub url: String,

    /// JSON document served for the URL from now on.
    pub data: serde_json::Value,
}

/// Implementation of the cache_update tool.
pub async fn update_impl(handle: &ControllerHandle, params: CacheUpdateParams) -> Result<CallToolResult, McpError> {
    if params.url.trim().is_empty() {
        return Err(Error::InvalidInput("url cannot be empty".into()).into());
    }

    handle
        .post(ControlMessage::CacheUpdate { url: params.url, data: params.data })
        .await?;
    let status = handle.request_status().await?;

    json_result(&CacheStatusOutput::from(status))
}
