//! Offline/performance cache controller.
//!
//! Sits in front of the network: every request goes through [`CacheController::handle`],
//! which classifies the URL and answers with one of four strategies backed by
//! versioned cache partitions:
//!
//! - **cache-first** (static assets): static partition, then network
//! - **network-first** (pages): network, then dynamic partition, then offline page
//! - **stale-while-revalidate** (API): API partition now, network refresh in background
//! - **network-only** (everything else): never touches the store
//!
//! Storage failures never escape a request handler; they degrade to network
//! pass-through or a synthetic response.

pub mod lifecycle;
pub mod message;
pub mod rules;
mod strategy;

use async_trait::async_trait;
use edgecache_core::{AppConfig, CacheDb, Error, HttpResponse, PartitionPurpose, PartitionSet, RequestKey};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use tokio::sync::{Mutex, RwLock};
use url::Url;

use crate::fetch::{Network, Request, is_interceptable, resolve};

pub use lifecycle::{InstallReport, Lifecycle};
pub use message::{CacheStatus, ControlMessage, ControllerHandle, Envelope, spawn_message_loop};
pub use rules::{ClassificationRules, Rule, Strategy};

/// Where a served response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResponseSource {
    Network,
    Cache,
    /// A cached stand-in: the offline page or the placeholder image.
    Fallback,
    /// Generated by the controller (503).
    Synthetic,
}

/// A response produced by the controller for one request.
#[derive(Debug, Clone)]
pub struct Served {
    pub response: HttpResponse,
    pub source: ResponseSource,
    pub strategy: Strategy,
}

impl Served {
    pub(crate) fn new(response: HttpResponse, source: ResponseSource, strategy: Strategy) -> Self {
        Self { response, source, strategy }
    }
}

/// Deployment-specific controller settings.
#[derive(Debug, Clone)]
pub struct ControllerSettings {
    /// Origin relative URLs resolve against.
    pub origin: Url,
    pub partitions: PartitionSet,
    pub precache_urls: Vec<String>,
    pub api_prefetch_urls: Vec<String>,
    pub offline_page: String,
    pub placeholder_image: String,
}

impl ControllerSettings {
    pub fn from_config(config: &AppConfig) -> Result<Self, Error> {
        let origin = Url::parse(&config.origin).map_err(|e| Error::InvalidUrl(e.to_string()))?;
        Ok(Self {
            origin,
            partitions: config.partitions(),
            precache_urls: config.precache_urls.clone(),
            api_prefetch_urls: config.api_prefetch_urls.clone(),
            offline_page: config.offline_page.clone(),
            placeholder_image: config.placeholder_image.clone(),
        })
    }
}

/// The cache controller.
pub struct CacheController<N: Network> {
    db: CacheDb,
    network: Arc<N>,
    settings: ControllerSettings,
    rules: ClassificationRules,
    lifecycle: RwLock<Lifecycle>,
    activation: Mutex<()>,
    waiting_skipped: AtomicBool,
    clients_claimed: AtomicBool,
}

impl<N: Network> CacheController<N> {
    /// Create a controller with the default classification rules.
    pub fn new(db: CacheDb, network: N, settings: ControllerSettings) -> Self {
        Self::with_shared_network(db, Arc::new(network), settings)
    }

    /// Create a controller around a network handle shared with other components.
    pub fn with_shared_network(db: CacheDb, network: Arc<N>, settings: ControllerSettings) -> Self {
        Self {
            db,
            network,
            settings,
            rules: ClassificationRules::default(),
            lifecycle: RwLock::new(Lifecycle::Parsed),
            activation: Mutex::new(()),
            waiting_skipped: AtomicBool::new(false),
            clients_claimed: AtomicBool::new(false),
        }
    }

    /// Replace the classification rules.
    pub fn with_rules(mut self, rules: ClassificationRules) -> Self {
        self.rules = rules;
        self
    }

    pub fn settings(&self) -> &ControllerSettings {
        &self.settings
    }

    pub fn db(&self) -> &CacheDb {
        &self.db
    }

    /// Name of the partition serving `purpose` in the current version.
    pub fn partition(&self, purpose: PartitionPurpose) -> String {
        self.settings.partitions.name(purpose)
    }

    /// Resolve a possibly relative URL against the configured origin.
    pub fn resolve(&self, input: &str) -> Result<Url, Error> {
        Ok(resolve(&self.settings.origin, input)?)
    }

    /// Strategy the controller would use for `url`.
    pub fn classify(&self, url: &Url) -> Strategy {
        self.rules.classify(url)
    }

    /// Answer one intercepted request.
    ///
    /// Returns `Ok(None)` when the request is not intercepted at all (non-HTTP
    /// scheme) and should go to the network untouched. The only error path is a
    /// stale-while-revalidate miss whose network fetch also fails.
    ///
    /// Only `GET` requests are ever matched against or written to the store;
    /// every other method is answered network-only whatever its URL.
    pub async fn handle(&self, request: &Request) -> Result<Option<Served>, Error> {
        if !is_interceptable(&request.url) {
            tracing::debug!("not intercepting {}", request.url);
            return Ok(None);
        }

        let strategy = if request.is_get() { self.classify(&request.url) } else { Strategy::NetworkOnly };
        tracing::debug!(%strategy, "dispatching {} {}", request.method, request.url);

        let served = match strategy {
            Strategy::CacheFirst => self.cache_first(request).await,
            Strategy::NetworkFirst => self.network_first(request).await,
            Strategy::StaleWhileRevalidate => self.stale_while_revalidate(request).await?,
            Strategy::NetworkOnly => self.network_only(request).await,
        };

        Ok(Some(served))
    }

    /// Look up a key, treating storage failures as a miss.
    pub(crate) async fn lookup(&self, partition: &str, key: &RequestKey) -> Option<HttpResponse> {
        match self.db.match_in(partition, key).await {
            Ok(found) => found,
            Err(e) => {
                log_store_failure("read", key, partition, &e);
                None
            }
        }
    }

    /// Store a successful response, logging and dropping storage failures.
    pub(crate) async fn store(&self, partition: &str, key: &RequestKey, response: &HttpResponse) {
        if !response.is_success() {
            return;
        }
        if let Err(e) = self.db.put(partition, key, response).await {
            log_store_failure("write", key, partition, &e);
        }
    }

    /// Look up a configured fallback resource in any partition.
    pub(crate) async fn cached_resource(&self, path: &str) -> Option<HttpResponse> {
        let url = match self.resolve(path) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!("invalid fallback url {}: {}", path, e);
                return None;
            }
        };

        match self.db.match_any(&RequestKey::get(url.as_str())).await {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!("cache read failed for fallback {}: {}", path, e);
                None
            }
        }
    }
}

/// Storage outages warn; anything else, such as an undecodable entry, logs at debug.
fn log_store_failure(op: &str, key: &RequestKey, partition: &str, error: &Error) {
    if error.is_storage() {
        tracing::warn!("cache {} failed for {} in {}: {}", op, key.url, partition, error);
    } else {
        tracing::debug!("cache {} skipped for {} in {}: {}", op, key.url, partition, error);
    }
}

/// A controller is itself a network: requests sent through it are answered
/// by the strategies, so a page-side client can sit on top of it.
#[async_trait]
impl<N: Network> Network for CacheController<N> {
    async fn fetch(&self, request: &Request) -> Result<HttpResponse, Error> {
        match self.handle(request).await? {
            Some(served) => Ok(served.response),
            None => self.network.fetch(request).await,
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::testing::FakeNetwork;

    pub(crate) const ORIGIN: &str = "https://app.example.com";

    pub(crate) fn url(path: &str) -> String {
        format!("{ORIGIN}{path}")
    }

    pub(crate) fn settings(version: &str) -> ControllerSettings {
        let config = AppConfig { origin: ORIGIN.into(), cache_version: version.into(), ..Default::default() };
        ControllerSettings::from_config(&config).unwrap()
    }

    pub(crate) async fn controller() -> (CacheController<FakeNetwork>, Arc<FakeNetwork>) {
        controller_with(CacheDb::open_in_memory().await.unwrap(), "v1").await
    }

    pub(crate) async fn controller_with(db: CacheDb, version: &str) -> (CacheController<FakeNetwork>, Arc<FakeNetwork>) {
        let network = Arc::new(FakeNetwork::new());
        let controller = CacheController::with_shared_network(db, Arc::clone(&network), settings(version));
        (controller, network)
    }

    pub(crate) fn get(path: &str) -> Request {
        Request::get(Url::parse(&url(path)).unwrap())
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[tokio::test]
    async fn test_non_http_is_passed_through() {
        let (controller, network) = controller().await;
        let request = Request::get(Url::parse("chrome-extension://abc/content.js").unwrap());

        assert!(controller.handle(&request).await.unwrap().is_none());
        assert_eq!(network.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_dispatch_reports_strategy() {
        let (controller, network) = controller().await;
        network.respond_text(&url("/static/js/app.js"), "js");
        network.respond_text(&url("/dashboard"), "page");
        network.respond_text(&url("/api/campaigns"), "[]");
        network.respond_text(&url("/login"), "login");

        let cases = [
            ("/static/js/app.js", Strategy::CacheFirst),
            ("/dashboard", Strategy::NetworkFirst),
            ("/api/campaigns", Strategy::StaleWhileRevalidate),
            ("/login", Strategy::NetworkOnly),
        ];
        for (path, expected) in cases {
            let served = controller.handle(&get(path)).await.unwrap().unwrap();
            assert_eq!(served.strategy, expected, "{path}");
            assert_eq!(served.source, ResponseSource::Network, "{path}");
        }
    }

    #[tokio::test]
    async fn test_controller_as_network() {
        let (controller, network) = controller().await;
        network.respond_text(&url("/static/css/style.css"), "body{}");

        let first = Network::fetch(&controller, &get("/static/css/style.css")).await.unwrap();
        let second = Network::fetch(&controller, &get("/static/css/style.css")).await.unwrap();

        assert_eq!(first.text(), "body{}");
        assert_eq!(second.text(), "body{}");
        assert_eq!(network.calls(&url("/static/css/style.css")), 1);
    }
}
