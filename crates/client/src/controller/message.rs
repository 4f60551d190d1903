//! Out-of-band commands sent from the page side to the controller.
//!
//! Messages travel over an mpsc channel and are processed strictly in
//! arrival order by [`spawn_message_loop`]. `GET_CACHE_STATUS` answers on
//! the oneshot channel carried next to the message.

use super::{CacheController, Lifecycle};
use crate::fetch::Network;
use edgecache_core::{Error, HttpResponse, PartitionPurpose, RequestKey};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

/// A command for the controller, tagged by `type` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ControlMessage {
    /// Store `data` as a JSON response for `url` in the dynamic partition.
    CacheUpdate { url: String, data: serde_json::Value },
    /// Delete every partition.
    ClearCache,
    /// Report partition occupancy on the reply channel.
    GetCacheStatus,
    /// Activate immediately.
    SkipWaiting,
}

/// Partition occupancy report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStatus {
    /// Entry count per partition name.
    pub caches: BTreeMap<String, u64>,
    pub total_caches: usize,
    pub version: String,
    /// Approximate size of all stored bodies.
    pub total_bytes: u64,
}

/// A message plus the channel its reply goes to, if any.
#[derive(Debug)]
pub struct Envelope {
    pub message: ControlMessage,
    pub reply: Option<oneshot::Sender<CacheStatus>>,
}

/// Page-side sender for controller messages.
#[derive(Debug, Clone)]
pub struct ControllerHandle {
    tx: mpsc::Sender<Envelope>,
}

impl ControllerHandle {
    /// Create a handle and the receiver to pass to [`spawn_message_loop`].
    pub fn channel(buffer: usize) -> (Self, mpsc::Receiver<Envelope>) {
        let (tx, rx) = mpsc::channel(buffer);
        (Self { tx }, rx)
    }

    /// Send a message without waiting for it to be processed.
    pub async fn post(&self, message: ControlMessage) -> Result<(), Error> {
        self.send(Envelope { message, reply: None }).await
    }

    /// Ask for the cache status and wait for the answer.
    pub async fn request_status(&self) -> Result<CacheStatus, Error> {
        let (reply, rx) = oneshot::channel();
        self.send(Envelope { message: ControlMessage::GetCacheStatus, reply: Some(reply) }).await?;
        rx.await
            .map_err(|_| Error::Network("controller dropped the status request".into()))
    }

    async fn send(&self, envelope: Envelope) -> Result<(), Error> {
        self.tx
            .send(envelope)
            .await
            .map_err(|_| Error::Network("controller message loop has stopped".into()))
    }
}

/// Process messages for `controller` until every sender is dropped.
pub fn spawn_message_loop<N: Network>(
    controller: Arc<CacheController<N>>, mut rx: mpsc::Receiver<Envelope>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(envelope) = rx.recv().await {
            controller.handle_message(envelope).await;
        }
        tracing::debug!("message loop finished");
    })
}

impl<N: Network> CacheController<N> {
    /// Apply one message. Failures are logged; nothing is returned to the sender
    /// except the status reply.
    pub async fn handle_message(&self, envelope: Envelope) {
        let Envelope { message, reply } = envelope;

        match message {
            ControlMessage::CacheUpdate { url, data } => {
                if let Err(e) = self.update_cache(&url, &data).await {
                    tracing::warn!("cache update for {} failed: {}", url, e);
                }
            }
            ControlMessage::ClearCache => {
                if let Err(e) = self.clear_all_caches().await {
                    tracing::warn!("clearing caches failed: {}", e);
                }
            }
            ControlMessage::GetCacheStatus => {
                let Some(reply) = reply else {
                    tracing::warn!("GET_CACHE_STATUS without reply channel dropped");
                    return;
                };
                match self.cache_status().await {
                    Ok(status) => {
                        if reply.send(status).is_err() {
                            tracing::debug!("status requester went away");
                        }
                    }
                    Err(e) => tracing::warn!("cache status failed: {}", e),
                }
            }
            ControlMessage::SkipWaiting => {
                self.skip_waiting();
                if self.lifecycle().await == Lifecycle::Installed
                    && let Err(e) = self.activate().await
                {
                    tracing::warn!("activation after skip-waiting failed: {}", e);
                }
            }
        }
    }

    /// Store `data` as a synthetic JSON response under `url`.
    pub async fn update_cache(&self, url: &str, data: &serde_json::Value) -> Result<(), Error> {
        let url = self.resolve(url)?;
        let partition = self.partition(PartitionPurpose::DynamicPages);
        self.db
            .put(&partition, &RequestKey::get(url.as_str()), &HttpResponse::json(data))
            .await?;
        tracing::debug!("stored update for {} in {}", url, partition);
        Ok(())
    }

    /// Delete every partition, returning how many were removed.
    pub async fn clear_all_caches(&self) -> Result<u64, Error> {
        let removed = self.db.clear_all().await?;
        tracing::info!("cleared {} partitions", removed);
        Ok(removed)
    }

    pub async fn cache_status(&self) -> Result<CacheStatus, Error> {
        let stats = self.db.partition_stats().await?;
        Ok(CacheStatus {
            total_caches: stats.len(),
            total_bytes: stats.iter().map(|s| s.bytes).sum(),
            caches: stats.into_iter().map(|s| (s.name, s.entries)).collect(),
            version: self.settings.partitions.version_tag().to_string(),
        })
    }
}
