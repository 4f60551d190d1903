//! The four answering strategies.

use super::{CacheController, ResponseSource, Served, Strategy};
use crate::fetch::{Destination, Network, Request};
use edgecache_core::{Error, HttpResponse, PartitionPurpose};
use std::sync::Arc;

const UNAVAILABLE: &str = "Resource not available offline";

impl<N: Network> CacheController<N> {
    /// Static partition first; on a miss go to the network and keep a copy.
    pub(crate) async fn cache_first(&self, request: &Request) -> Served {
        let strategy = Strategy::CacheFirst;
        let partition = self.partition(PartitionPurpose::StaticAssets);
        let key = request.key();

        if let Some(cached) = self.lookup(&partition, &key).await {
            tracing::debug!("cache hit for {}", request.url);
            return Served::new(cached, ResponseSource::Cache, strategy);
        }

        match self.network.fetch(request).await {
            Ok(response) => {
                self.store(&partition, &key, &response).await;
                Served::new(response, ResponseSource::Network, strategy)
            }
            Err(e) => {
                tracing::warn!("cache-first fetch failed for {}: {}", request.url, e);
                self.fallback(request, strategy).await
            }
        }
    }

    /// Network first, keeping a copy in the dynamic partition; the copy is the
    /// answer when the network is unreachable.
    pub(crate) async fn network_first(&self, request: &Request) -> Served {
        let strategy = Strategy::NetworkFirst;
        let partition = self.partition(PartitionPurpose::DynamicPages);
        let key = request.key();

        match self.network.fetch(request).await {
            Ok(response) => {
                self.store(&partition, &key, &response).await;
                Served::new(response, ResponseSource::Network, strategy)
            }
            Err(e) => {
                tracing::debug!("network failed, trying cache for {}: {}", request.url, e);

                if let Some(cached) = self.lookup(&partition, &key).await {
                    return Served::new(cached, ResponseSource::Cache, strategy);
                }

                if request.is_navigation()
                    && let Some(offline) = self.cached_resource(&self.settings.offline_page).await
                {
                    return Served::new(offline, ResponseSource::Fallback, strategy);
                }

                Served::new(HttpResponse::service_unavailable(UNAVAILABLE), ResponseSource::Synthetic, strategy)
            }
        }
    }

    /// Answer from the API partition immediately and refresh it in the
    /// background. Without a cached copy the caller waits for the refresh.
    pub(crate) async fn stale_while_revalidate(&self, request: &Request) -> Result<Served, Error> {
        let strategy = Strategy::StaleWhileRevalidate;
        let partition = self.partition(PartitionPurpose::ApiResponses);
        let key = request.key();

        let cached = self.lookup(&partition, &key).await;

        let network = Arc::clone(&self.network);
        let db = self.db.clone();
        let background = request.clone();
        let revalidate = tokio::spawn(async move {
            let result = network.fetch(&background).await;
            match &result {
                Ok(response) if response.is_success() => {
                    if let Err(e) = db.put(&partition, &background.key(), response).await {
                        tracing::warn!("revalidation write failed for {}: {}", background.url, e);
                    }
                }
                Ok(response) => {
                    tracing::debug!("revalidation of {} returned {}", background.url, response.status);
                }
                Err(e) => tracing::debug!("revalidation of {} failed: {}", background.url, e),
            }
            result
        });

        if let Some(cached) = cached {
            tracing::debug!("serving stale copy of {}", request.url);
            return Ok(Served::new(cached, ResponseSource::Cache, strategy));
        }

        match revalidate.await {
            Ok(Ok(response)) => Ok(Served::new(response, ResponseSource::Network, strategy)),
            Ok(Err(e)) => Err(e),
            Err(e) => Err(Error::Network(format!("revalidation task failed: {e}"))),
        }
    }

    /// Straight to the network; the store is never read or written.
    pub(crate) async fn network_only(&self, request: &Request) -> Served {
        let strategy = Strategy::NetworkOnly;

        match self.network.fetch(request).await {
            Ok(response) => Served::new(response, ResponseSource::Network, strategy),
            Err(e) => {
                tracing::debug!("network-only fetch failed for {}: {}", request.url, e);

                if request.is_get()
                    && let Some(offline) = self.cached_resource(&self.settings.offline_page).await
                {
                    return Served::new(offline, ResponseSource::Fallback, strategy);
                }

                Served::new(HttpResponse::service_unavailable(UNAVAILABLE), ResponseSource::Synthetic, strategy)
            }
        }
    }

    /// Stand-in for a failed cache-first request.
    async fn fallback(&self, request: &Request, strategy: Strategy) -> Served {
        let stand_in = if request.destination == Destination::Image {
            self.cached_resource(&self.settings.placeholder_image).await
        } else if request.is_navigation() {
            self.cached_resource(&self.settings.offline_page).await
        } else {
            None
        };

        match stand_in {
            Some(response) => Served::new(response, ResponseSource::Fallback, strategy),
            None => Served::new(HttpResponse::service_unavailable(UNAVAILABLE), ResponseSource::Synthetic, strategy),
        }
    }
}
