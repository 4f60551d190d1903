//! MCP tool implementations.
//!
//! This module contains all tools exposed by the edgecache server.

pub mod cache;
pub mod cache_fetch;
pub mod skip_waiting;

pub use cache::CacheUpdateParams;
pub use cache_fetch::CacheFetchParams;

use edgecache_core::Error;
use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use serde::Serialize;

/// Render a tool output as pretty JSON text content.
pub(crate) fn json_result<T: Serialize>(output: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(output)
        .map_err(|e| Error::InvalidInput(format!("Failed to serialize output: {e}")))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

#[cfg(test)]
pub(crate) mod test_support {
    use edgecache_client::{CacheController, ControllerHandle, ControllerSettings, FetchClient, FetchConfig, spawn_message_loop};
    use edgecache_core::{AppConfig, CacheDb};
    use rmcp::model::CallToolResult;
    use std::sync::Arc;
    use wiremock::MockServer;

    pub(crate) struct Fixture {
        pub(crate) controller: Arc<CacheController<FetchClient>>,
        pub(crate) handle: ControllerHandle,
    }

    /// A controller whose origin is the mock server, with an empty install manifest.
    pub(crate) async fn fixture(server: &MockServer) -> Fixture {
        let config = AppConfig {
            origin: server.uri(),
            cache_version: "v1".into(),
            precache_urls: Vec::new(),
            api_prefetch_urls: Vec::new(),
            ..Default::default()
        };
        let db = CacheDb::open_in_memory().await.unwrap();
        let network = FetchClient::new(FetchConfig::default()).unwrap();
        let settings = ControllerSettings::from_config(&config).unwrap();
        let controller = Arc::new(CacheController::new(db, network, settings));
        let (handle, rx) = ControllerHandle::channel(8);
        spawn_message_loop(Arc::clone(&controller), rx);
        Fixture { controller, handle }
    }

    /// The JSON document carried by a tool result.
    pub(crate) fn output(result: &CallToolResult) -> serde_json::Value {
        let content = serde_json::to_value(&result.content[0]).unwrap();
        serde_json::from_str(content["text"].as_str().unwrap()).unwrap()
    }
}
