//! Install and activate phases of the controller.

use super::CacheController;
use crate::fetch::{Destination, Network, Request};
use edgecache_core::{Error, PartitionPurpose};
use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use std::sync::atomic::Ordering;

/// Where the controller is in its install/activate lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lifecycle {
    Parsed,
    Installing,
    Installed,
    Activating,
    Activated,
}

/// Outcome of an install: which manifest URLs made it into the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallReport {
    pub cached: Vec<String>,
    /// URL and reason for every entry that could not be cached.
    pub failed: Vec<(String, String)>,
}

impl InstallReport {
    fn record(&mut self, url: String, outcome: Result<(), String>) {
        match outcome {
            Ok(()) => self.cached.push(url),
            Err(reason) => {
                tracing::warn!("failed to cache {}: {}", url, reason);
                self.failed.push((url, reason));
            }
        }
    }
}

impl<N: Network> CacheController<N> {
    pub async fn lifecycle(&self) -> Lifecycle {
        *self.lifecycle.read().await
    }

    async fn transition(&self, next: Lifecycle) {
        let mut state = self.lifecycle.write().await;
        tracing::info!(from = ?*state, to = ?next, "lifecycle transition");
        *state = next;
    }

    /// Populate the current partitions from the install manifest.
    ///
    /// Every URL is attempted independently; individual failures end up in
    /// the report and never fail the install. Static URLs are fetched
    /// concurrently, API endpoints one after another.
    pub async fn install(&self) -> InstallReport {
        self.transition(Lifecycle::Installing).await;

        for purpose in PartitionPurpose::ALL {
            if let Err(e) = self.db.open_partition(&self.partition(purpose)).await {
                tracing::warn!("could not open partition {}: {}", self.partition(purpose), e);
            }
        }

        let mut report = InstallReport::default();

        let static_partition = self.partition(PartitionPurpose::StaticAssets);
        let precache = self
            .settings
            .precache_urls
            .iter()
            .map(|path| self.precache(&static_partition, path));
        for (path, outcome) in join_all(precache).await {
            report.record(path, outcome);
        }

        let api_partition = self.partition(PartitionPurpose::ApiResponses);
        for path in &self.settings.api_prefetch_urls {
            let (path, outcome) = self.precache(&api_partition, path).await;
            report.record(path, outcome);
        }

        tracing::info!(cached = report.cached.len(), failed = report.failed.len(), "install complete");
        self.transition(Lifecycle::Installed).await;
        self.skip_waiting();
        report
    }

    async fn precache(&self, partition: &str, path: &str) -> (String, Result<(), String>) {
        let url = match self.resolve(path) {
            Ok(url) => url,
            Err(e) => return (path.to_string(), Err(e.to_string())),
        };
        let request = Request::get(url).with_destination(Destination::from_path(path));

        let outcome = match self.network.fetch(&request).await {
            Ok(response) if response.is_success() => self
                .db
                .put(partition, &request.key(), &response)
                .await
                .map_err(|e| e.to_string()),
            Ok(response) => Err(format!("HTTP {} {}", response.status, response.status_text)),
            Err(e) => Err(e.to_string()),
        };
        (path.to_string(), outcome)
    }

    /// Ask to replace the previous version without waiting for open sessions.
    pub fn skip_waiting(&self) {
        self.waiting_skipped.store(true, Ordering::SeqCst);
    }

    pub fn is_waiting_skipped(&self) -> bool {
        self.waiting_skipped.load(Ordering::SeqCst)
    }

    /// Purge every partition outside the current version, then claim clients.
    ///
    /// Activations are serialized; the purge finishes before clients are
    /// claimed. Returns the names of the purged partitions.
    pub async fn activate(&self) -> Result<Vec<String>, Error> {
        let _guard = self.activation.lock().await;
        self.transition(Lifecycle::Activating).await;

        let mut purged = Vec::new();
        for name in self.db.partition_names().await? {
            if self.settings.partitions.contains(&name) {
                continue;
            }
            if self.db.delete_partition(&name).await? {
                tracing::info!("deleted stale partition {}", name);
                purged.push(name);
            }
        }

        self.transition(Lifecycle::Activated).await;
        self.clients_claimed.store(true, Ordering::SeqCst);
        Ok(purged)
    }

    /// Whether the controller has taken over open sessions.
    pub fn controls_clients(&self) -> bool {
        self.clients_claimed.load(Ordering::SeqCst)
    }
}
