//! Where list pages come from.

use crate::fetch::{ACCEPT_JSON, Network, REQUESTED_WITH, Request, resolve, set_query_params};
use async_trait::async_trait;
use edgecache_core::Error;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use url::Url;

/// One page request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub per_page: u32,
    /// Non-empty filter fields.
    pub filters: Vec<(String, String)>,
    pub reset: bool,
}

/// The list endpoint's JSON answer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub items_html: String,
    #[serde(default)]
    pub has_more: Option<bool>,
    #[serde(default)]
    pub total_pages: Option<u32>,
    #[serde(default)]
    pub total_items: Option<u64>,
    #[serde(default)]
    pub error: Option<String>,
}

#[async_trait]
pub trait ListSource: Send + Sync + 'static {
    /// Fetch one page. `Err` means the request never produced a readable answer.
    async fn fetch_page(&self, request: &PageRequest) -> Result<PageResponse, Error>;
}

/// A [`ListSource`] backed by a JSON endpoint over a [`Network`].
pub struct HttpListSource<N: Network> {
    network: Arc<N>,
    endpoint: Url,
}

impl<N: Network> HttpListSource<N> {
    /// `endpoint` may be relative to `origin`.
    pub fn new(network: Arc<N>, origin: &Url, endpoint: &str) -> Result<Self, Error> {
        Ok(Self { network, endpoint: resolve(origin, endpoint)? })
    }

    /// The URL a page request is sent to.
    pub fn page_url(&self, request: &PageRequest) -> Url {
        let mut params = vec![
            ("page".to_string(), request.page.to_string()),
            ("per_page".to_string(), request.per_page.to_string()),
        ];
        params.extend(request.filters.iter().cloned());
        if request.reset {
            params.push(("reset".to_string(), "1".to_string()));
        }

        let mut url = self.endpoint.clone();
        set_query_params(&mut url, &params);
        url
    }
}

#[async_trait]
impl<N: Network> ListSource for HttpListSource<N> {
    async fn fetch_page(&self, request: &PageRequest) -> Result<PageResponse, Error> {
        let url = self.page_url(request);
        tracing::debug!("fetching list page {}", url);

        let http = Request::get(url)
            .with_header(ACCEPT_JSON.0, ACCEPT_JSON.1)
            .with_header(REQUESTED_WITH.0, REQUESTED_WITH.1);
        let response = self.network.fetch(&http).await?;

        serde_json::from_slice(&response.body).map_err(|e| {
            Error::Parse(format!("list endpoint answered {} with unreadable body: {}", response.status, e))
        })
    }
}
