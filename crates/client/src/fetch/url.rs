//! URL resolution against the configured origin, for consistent cache keys.

use url::Url;

/// Error type for URL resolution failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UrlError {
    #[error("empty URL")]
    Empty,

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

impl From<UrlError> for edgecache_core::Error {
    fn from(err: UrlError) -> Self {
        edgecache_core::Error::InvalidUrl(err.to_string())
    }
}

/// Resolve `input` against `origin` when it is relative, then normalize:
/// http(s) only, lowercase host, no fragment, query kept as written.
pub fn resolve(origin: &Url, input: &str) -> Result<Url, UrlError> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let joined = origin.join(trimmed).map_err(|e| UrlError::InvalidUrl(e.to_string()))?;

    normalize(joined)
}

/// Whether the controller may intercept a request for this URL at all.
pub fn is_interceptable(url: &Url) -> bool {
    matches!(url.scheme(), "http" | "https")
}

/// Set query parameters, replacing any existing values for the same names.
pub fn set_query_params(url: &mut Url, params: &[(String, String)]) {
    let retained: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| !params.iter().any(|(name, _)| name == k))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    let mut pairs = url.query_pairs_mut();
    pairs.clear();
    for (k, v) in retained.iter().chain(params.iter()) {
        pairs.append_pair(k, v);
    }
}

fn normalize(mut parsed: Url) -> Result<Url, UrlError> {
    match parsed.scheme() {
        "http" | "https" => {}
        scheme => return Err(UrlError::UnsupportedScheme(scheme.to_string())),
    }

    if let Some(host) = parsed.host_str() {
        let lowered = host.to_lowercase();
        parsed
            .set_host(Some(&lowered))
            .map_err(|e| UrlError::InvalidUrl(e.to_string()))?;
    }

    parsed.set_fragment(None);

    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> Url {
        Url::parse("https://app.example.com").unwrap()
    }

    #[test]
    fn test_resolve_preserves_query_and_drops_fragment() {
        let url = resolve(&origin(), "/page?b=2&a=1#section").unwrap();
        assert_eq!(url.query(), Some("b=2&a=1"));
        assert_eq!(url.fragment(), None);
        assert_eq!(url.path(), "/page");
    }

    #[test]
    fn test_resolve_unsupported_scheme() {
        let result = resolve(&origin(), "file:///etc/passwd");
        assert!(matches!(result, Err(UrlError::UnsupportedScheme(_))));
    }

    #[test]
    fn test_resolve_empty() {
        assert!(matches!(resolve(&origin(), "   "), Err(UrlError::Empty)));
    }

    #[test]
    fn test_resolve_relative() {
        let url = resolve(&origin(), "/offline.html").unwrap();
        assert_eq!(url.as_str(), "https://app.example.com/offline.html");
    }

    #[test]
    fn test_resolve_absolute_keeps_host() {
        let url = resolve(&origin(), "https://CDN.example.com/lib.js#x").unwrap();
        assert_eq!(url.as_str(), "https://cdn.example.com/lib.js");
    }

    #[test]
    fn test_is_interceptable() {
        assert!(is_interceptable(&Url::parse("http://example.com/").unwrap()));
        assert!(!is_interceptable(&Url::parse("chrome-extension://abc/script.js").unwrap()));
        assert!(!is_interceptable(&Url::parse("data:text/plain,hello").unwrap()));
    }

    #[test]
    fn test_set_query_params_replaces() {
        let mut url = Url::parse("https://example.com/api/items?page=9&sort=name").unwrap();
        set_query_params(&mut url, &[("page".into(), "2".into()), ("per_page".into(), "20".into())]);
        assert_eq!(url.query(), Some("sort=name&page=2&per_page=20"));
    }
}
