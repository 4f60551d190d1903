//! HTTP value types shared by the cache store and the controller.

use serde::{Deserialize, Serialize};

/// A captured HTTP response: status line, headers and body.
///
/// This is what the cache store persists and what every controller strategy
/// answers with, whether it came from the network, the store or was synthesized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpResponse {
    pub status: u16,
    pub status_text: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Build a response with the given status and body and no headers.
    pub fn new(status: u16, status_text: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        Self { status, status_text: status_text.into(), headers: Vec::new(), body: body.into() }
    }

    /// Synthetic `503 Service Unavailable` with a plain-text body.
    pub fn service_unavailable(message: &str) -> Self {
        Self::new(503, "Service Unavailable", message.as_bytes().to_vec())
            .with_header("content-type", "text/plain; charset=utf-8")
    }

    /// Synthetic `200 OK` carrying a JSON document.
    pub fn json(value: &serde_json::Value) -> Self {
        Self::new(200, "OK", value.to_string().into_bytes()).with_header("content-type", "application/json")
    }

    /// Append a header.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    /// Whether the status is in the 2xx range.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// First header value matching `name`, case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// Body decoded as UTF-8, lossily.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}
