//! edgecache server entry point.
//!
//! Loads configuration, opens the cache store, installs and activates the
//! current cache version, then serves MCP on stdio transport.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use anyhow::Result;
use edgecache_client::{CacheController, ControllerHandle, ControllerSettings, FetchClient, FetchConfig, spawn_message_loop};
use edgecache_core::{AppConfig, CacheDb};
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

mod handler;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    tracing::info!(version = %config.cache_version, origin = %config.origin, "starting edgecache server on stdio transport");

    let db = CacheDb::open(&config.db_path).await?;
    let schema = db.schema();
    tracing::info!(schema_version = schema.current, migrated_from = schema.found, "cache store opened");
    let network = FetchClient::new(FetchConfig::from_app(&config))?;
    let settings = ControllerSettings::from_config(&config)?;
    let controller = Arc::new(CacheController::new(db, network, settings));

    let report = controller.install().await;
    tracing::info!(cached = report.cached.len(), failed = report.failed.len(), "cache installed");
    let purged = controller.activate().await?;
    tracing::info!(purged = purged.len(), "cache activated");

    let (handle, rx) = ControllerHandle::channel(64);
    let message_loop = spawn_message_loop(Arc::clone(&controller), rx);

    let handler = handler::EdgecacheServer::new(controller, handle);
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;
    message_loop.abort();

    Ok(())
}
