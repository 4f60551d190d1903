//! skip_waiting tool implementation.
//!
//! Asks the controller to activate now instead of waiting for open sessions.

use super::json_result;
use edgecache_client::{CacheController, ControlMessage, ControllerHandle, Lifecycle, Network};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Output from the skip_waiting tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SkipWaitingOutput {
    /// Lifecycle phase after the message was processed.
    #[schemars(with = "String")]
    pub lifecycle: Lifecycle,
    /// Whether the controller has claimed open sessions.
    pub controls_clients: bool,
}

/// Implementation of the skip_waiting tool.
pub async fn skip_waiting_impl<N: Network>(
    controller: &CacheController<N>, handle: &ControllerHandle,
) -> Result<CallToolResult, McpError> {
    handle.post(ControlMessage::SkipWaiting).await?;
    // Status replies are processed after the skip, so this waits for it.
    handle.request_status().await?;

    json_result(&SkipWaitingOutput {
        lifecycle: controller.lifecycle().await,
        controls_clients: controller.controls_clients(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::{fixture, output};
    use wiremock::MockServer;

    #[tokio::test]
    async fn test_skip_waiting_activates_installed() {
        let server = MockServer::start().await;
        let fixture = fixture(&server).await;
        fixture.controller.install().await;

        let result = output(&skip_waiting_impl(&fixture.controller, &fixture.handle).await.unwrap());

        assert_eq!(result["lifecycle"], "activated");
        assert_eq!(result["controls_clients"], true);
        assert!(fixture.controller.is_waiting_skipped());
    }

    #[tokio::test]
    async fn test_skip_waiting_before_install() {
        let server = MockServer::start().await;
        let fixture = fixture(&server).await;

        let result = output(&skip_waiting_impl(&fixture.controller, &fixture.handle).await.unwrap());

        assert_eq!(result["lifecycle"], "parsed");
        assert_eq!(result["controls_clients"], false);
    }
}
