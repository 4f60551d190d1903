//! Request identity and cache key generation.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// The identity of an outgoing request as far as the cache is concerned.
///
/// Two requests are the same cache entry when both method and URL match
/// exactly; the URL is expected to be canonical already.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestKey {
    pub method: String,
    pub url: String,
}

impl RequestKey {
    pub fn new(method: &str, url: &str) -> Self {
        Self { method: method.to_ascii_uppercase(), url: url.to_string() }
    }

    /// Shorthand for a `GET` of `url`.
    pub fn get(url: &str) -> Self {
        Self::new("GET", url)
    }

    /// Hex-encoded SHA-256 of this key.
    pub fn hash(&self) -> String {
        compute_cache_key(&self.method, &self.url)
    }
}

/// Compute the storage key for a request.
pub fn compute_cache_key(method: &str, url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(method.to_ascii_uppercase().as_bytes());
    hasher.update(b"\n");
    hasher.update(url.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_stability() {
        let hash1 = compute_cache_key("GET", "https://example.com/app.js");
        let hash2 = compute_cache_key("GET", "https://example.com/app.js");
        assert_eq!(hash1, hash2);
    }

    #[test]
    fn test_hash_different_method() {
        let get = compute_cache_key("GET", "https://example.com/api/items");
        let post = compute_cache_key("POST", "https://example.com/api/items");
        assert_ne!(get, post);
    }

    #[test]
    fn test_method_case_insensitive() {
        assert_eq!(RequestKey::new("get", "https://example.com/").hash(), RequestKey::get("https://example.com/").hash());
    }

    #[test]
    fn test_hash_format() {
        let hash = RequestKey::get("https://example.com/").hash();
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
