//! Scripted network fake shared by the controller and loader tests.

use crate::fetch::{Network, Request};
use async_trait::async_trait;
use edgecache_core::{Error, HttpResponse};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

#[derive(Clone)]
enum Route {
    Respond(HttpResponse),
    Fail(String),
}

/// A [`Network`] that answers from a route table keyed by URL.
///
/// Routes match the full URL first, then the URL without its query string.
/// Unrouted URLs fail as if the host were unreachable. A gated URL waits
/// until [`FakeNetwork::release`] is called before answering.
#[derive(Default)]
pub(crate) struct FakeNetwork {
    routes: Mutex<HashMap<String, Route>>,
    gates: Mutex<HashMap<String, Arc<Notify>>>,
    calls: Mutex<Vec<String>>,
}

impl FakeNetwork {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn respond(&self, url: &str, response: HttpResponse) {
        self.routes.lock().unwrap().insert(url.to_string(), Route::Respond(response));
    }

    pub(crate) fn respond_text(&self, url: &str, body: &str) {
        self.respond(url, HttpResponse::new(200, "OK", body.as_bytes().to_vec()));
    }

    pub(crate) fn respond_json(&self, url: &str, value: serde_json::Value) {
        self.respond(url, HttpResponse::json(&value));
    }

    pub(crate) fn fail(&self, url: &str) {
        self.routes
            .lock()
            .unwrap()
            .insert(url.to_string(), Route::Fail("connection refused".into()));
    }

    /// Hold answers for `url` until released.
    pub(crate) fn gate(&self, url: &str) {
        self.gates.lock().unwrap().insert(url.to_string(), Arc::new(Notify::new()));
    }

    /// Let one held request for `url` through.
    pub(crate) fn release(&self, url: &str) {
        if let Some(gate) = self.gates.lock().unwrap().get(url) {
            gate.notify_one();
        }
    }

    /// Number of requests made whose URL (with or without query) equals `url`.
    pub(crate) fn calls(&self, url: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|u| u.as_str() == url || strip_query(u) == url)
            .count()
    }

    pub(crate) fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Every requested URL, in order.
    pub(crate) fn requested(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn lookup<T: Clone>(map: &Mutex<HashMap<String, T>>, url: &str) -> Option<T> {
        let map = map.lock().unwrap();
        map.get(url).or_else(|| map.get(strip_query(url))).cloned()
    }
}

fn strip_query(url: &str) -> &str {
    url.split_once('?').map(|(base, _)| base).unwrap_or(url)
}

#[async_trait]
impl Network for FakeNetwork {
    async fn fetch(&self, request: &Request) -> Result<HttpResponse, Error> {
        let url = request.url.to_string();
        self.calls.lock().unwrap().push(url.clone());

        if let Some(gate) = Self::lookup(&self.gates, &url) {
            gate.notified().await;
        }

        match Self::lookup(&self.routes, &url) {
            Some(Route::Respond(response)) => Ok(response),
            Some(Route::Fail(reason)) => Err(Error::Network(reason)),
            None => Err(Error::Network(format!("no route to {url}"))),
        }
    }
}
