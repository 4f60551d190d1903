//! cache_fetch tool implementation.
//!
//! Sends one request through the cache controller and reports how it was answered.

use super::json_result;
use edgecache_client::{CacheController, Destination, Network, Request, ResponseSource};
use edgecache_core::Error;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Input parameters for the cache_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheFetchParams {
    /// URL to request; relative URLs resolve against the configured origin.
    pub url: String,

    /// HTTP method (default: GET).
    #[serde(default = "default_method")]
    pub method: String,

    /// Treat the request as a page navigation (enables the offline page fallback).
    #[serde(default)]
    pub navigate: bool,
}

fn default_method() -> String {
    "GET".into()
}

/// Output structure for the cache_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheFetchOutput {
    pub url: String,
    pub status: u16,
    pub status_text: String,
    /// Where the response came from: network, cache, fallback or synthetic.
    pub source: String,
    /// Strategy the request was classified into.
    pub strategy: String,
    pub content_type: Option<String>,
    pub body: String,
    pub body_bytes: usize,
}

/// Implementation of the cache_fetch tool.
pub async fn fetch_impl<N: Network>(
    controller: &CacheController<N>, params: CacheFetchParams,
) -> Result<CallToolResult, McpError> {
    if params.url.trim().is_empty() {
        return Err(Error::InvalidInput("url cannot be empty".into()).into());
    }

    let url = controller.resolve(&params.url)?;
    let request = if params.navigate {
        Request::navigate(url)
    } else {
        let destination = Destination::from_path(url.path());
        Request::get(url).with_destination(destination)
    };
    let request = request.with_method(&params.method);

    let served = controller
        .handle(&request)
        .await?
        .ok_or_else(|| Error::InvalidUrl(format!("{} is not intercepted", request.url)))?;

    let output = CacheFetchOutput {
        url: request.url.to_string(),
        status: served.response.status,
        status_text: served.response.status_text.clone(),
        source: source_name(served.source).into(),
        strategy: served.strategy.to_string(),
        content_type: served.response.content_type().map(str::to_string),
        body: served.response.text(),
        body_bytes: served.response.body.len(),
    };

    json_result(&output)
}

fn source_name(source: ResponseSource) -> &'static str {
    match source {
        ResponseSource::Network => "network",
        ResponseSource::Cache => "cache",
        ResponseSource::Fallback => "fallback",
        ResponseSource::Synthetic => "synthetic",
    }
}
