//! Outgoing request description.

use edgecache_core::RequestKey;
use serde::{Deserialize, Serialize};
use url::Url;

/// How the request was initiated by the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RequestMode {
    /// A top-level page navigation.
    Navigate,
    #[default]
    SameOrigin,
    Cors,
    NoCors,
}

/// What kind of resource the request is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Destination {
    Document,
    Image,
    Script,
    Style,
    Font,
    #[default]
    Empty,
}

impl Destination {
    /// Guess the destination from a URL path's extension.
    pub fn from_path(path: &str) -> Self {
        let ext = path.rsplit_once('.').map(|(_, e)| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("png" | "jpg" | "jpeg" | "svg" | "gif" | "ico" | "webp") => Destination::Image,
            Some("js" | "mjs") => Destination::Script,
            Some("css") => Destination::Style,
            Some("woff" | "woff2" | "ttf" | "eot") => Destination::Font,
            Some("html" | "htm") => Destination::Document,
            _ => Destination::Empty,
        }
    }
}

/// An outgoing HTTP request as seen by the cache controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: String,
    pub url: Url,
    pub mode: RequestMode,
    pub destination: Destination,
    pub headers: Vec<(String, String)>,
}

impl Request {
    /// A plain `GET` with no special mode or destination.
    pub fn get(url: Url) -> Self {
        Self {
            method: "GET".into(),
            url,
            mode: RequestMode::default(),
            destination: Destination::default(),
            headers: Vec::new(),
        }
    }

    /// A page navigation to `url`.
    pub fn navigate(url: Url) -> Self {
        Self { mode: RequestMode::Navigate, destination: Destination::Document, ..Self::get(url) }
    }

    pub fn with_method(mut self, method: &str) -> Self {
        self.method = method.to_ascii_uppercase();
        self
    }

    pub fn with_destination(mut self, destination: Destination) -> Self {
        self.destination = destination;
        self
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn is_get(&self) -> bool {
        self.method.eq_ignore_ascii_case("GET")
    }

    pub fn is_navigation(&self) -> bool {
        self.mode == RequestMode::Navigate
    }

    /// The cache identity of this request.
    pub fn key(&self) -> RequestKey {
        RequestKey::new(&self.method, self.url.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_destination_from_path() {
        assert_eq!(Destination::from_path("/static/images/logo.PNG"), Destination::Image);
        assert_eq!(Destination::from_path("/static/js/app.js"), Destination::Script);
        assert_eq!(Destination::from_path("/fonts/a.woff2"), Destination::Font);
        assert_eq!(Destination::from_path("/offline.html"), Destination::Document);
        assert_eq!(Destination::from_path("/api/campaigns"), Destination::Empty);
    }

    #[test]
    fn test_navigate_request() {
        let request = Request::navigate(Url::parse("https://example.com/dashboard").unwrap());
        assert!(request.is_navigation());
        assert!(request.is_get());
        assert_eq!(request.destination, Destination::Document);
    }

    #[test]
    fn test_key_includes_method() {
        let url = Url::parse("https://example.com/api/boutiques").unwrap();
        let get = Request::get(url.clone()).key();
        let post = Request::get(url).with_method("post").key();
        assert_eq!(post.method, "POST");
        assert_ne!(get.hash(), post.hash());
    }
}
