//! URL classification rules.
//!
//! Rules are evaluated in order against the request path (query excluded);
//! the first rule with a matching pattern decides the strategy. A request
//! no rule matches is answered network-only.

use edgecache_core::Error;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;
use url::Url;

/// How a request is answered from cache versus network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    CacheFirst,
    NetworkFirst,
    StaleWhileRevalidate,
    NetworkOnly,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Strategy::CacheFirst => "cache-first",
            Strategy::NetworkFirst => "network-first",
            Strategy::StaleWhileRevalidate => "stale-while-revalidate",
            Strategy::NetworkOnly => "network-only",
        };
        f.write_str(name)
    }
}

/// A set of path patterns mapped to one strategy.
#[derive(Debug, Clone)]
pub struct Rule {
    strategy: Strategy,
    patterns: Vec<Regex>,
}

impl Rule {
    /// Compile a rule from regex sources.
    pub fn new(strategy: Strategy, patterns: &[&str]) -> Result<Self, Error> {
        let patterns = patterns
            .iter()
            .map(|p| Regex::new(p).map_err(|e| Error::InvalidInput(format!("invalid pattern {p}: {e}"))))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { strategy, patterns })
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    pub fn matches(&self, path: &str) -> bool {
        self.patterns.iter().any(|p| p.is_match(path))
    }
}

static DEFAULT_RULES: LazyLock<ClassificationRules> = LazyLock::new(|| {
    let rules = [
        (
            Strategy::CacheFirst,
            &[
                r"\.(?:css|js|png|jpg|jpeg|svg|gif|woff|woff2|ttf|eot|ico)$",
                r"^/static/",
                r"^/assets/",
                r"^/optimized-images/",
            ][..],
        ),
        (
            Strategy::NetworkFirst,
            &[r"\.html$", r"^/dashboard", r"^/campaigns", r"^/boutiques", r"^/admin"][..],
        ),
        (Strategy::StaleWhileRevalidate, &[r"^/api/", r"^/health"][..]),
    ];

    ClassificationRules {
        rules: rules
            .iter()
            .map(|(strategy, patterns)| Rule::new(*strategy, patterns).expect("invalid built-in pattern"))
            .collect(),
    }
});

/// Ordered rule table.
#[derive(Debug, Clone)]
pub struct ClassificationRules {
    rules: Vec<Rule>,
}

impl Default for ClassificationRules {
    fn default() -> Self {
        DEFAULT_RULES.clone()
    }
}

impl ClassificationRules {
    /// Build a table from rules in priority order.
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// Strategy for a path.
    pub fn classify_path(&self, path: &str) -> Strategy {
        self.rules
            .iter()
            .find(|rule| rule.matches(path))
            .map(Rule::strategy)
            .unwrap_or(Strategy::NetworkOnly)
    }

    /// Strategy for a URL, judged by its path.
    pub fn classify(&self, url: &Url) -> Strategy {
        self.classify_path(url.path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(path: &str) -> Strategy {
        ClassificationRules::default().classify_path(path)
    }

    #[test]
    fn test_static_assets_are_cache_first() {
        assert_eq!(classify("/static/css/style.css"), Strategy::CacheFirst);
        assert_eq!(classify("/vendor/lib.js"), Strategy::CacheFirst);
        assert_eq!(classify("/assets/bundle"), Strategy::CacheFirst);
        assert_eq!(classify("/optimized-images/hero"), Strategy::CacheFirst);
        assert_eq!(classify("/favicon.ico"), Strategy::CacheFirst);
    }

    #[test]
    fn test_pages_are_network_first() {
        assert_eq!(classify("/offline.html"), Strategy::NetworkFirst);
        assert_eq!(classify("/dashboard"), Strategy::NetworkFirst);
        assert_eq!(classify("/campaigns/42/edit"), Strategy::NetworkFirst);
        assert_eq!(classify("/boutiques"), Strategy::NetworkFirst);
        assert_eq!(classify("/admin/users"), Strategy::NetworkFirst);
    }

    #[test]
    fn test_api_is_stale_while_revalidate() {
        assert_eq!(classify("/api/campaigns"), Strategy::StaleWhileRevalidate);
        assert_eq!(classify("/health"), Strategy::StaleWhileRevalidate);
    }

    #[test]
    fn test_unmatched_is_network_only() {
        assert_eq!(classify("/"), Strategy::NetworkOnly);
        assert_eq!(classify("/login"), Strategy::NetworkOnly);
        assert_eq!(classify("/apis"), Strategy::NetworkOnly);
    }

    #[test]
    fn test_first_match_wins() {
        // A script under /api/ is still a static asset.
        assert_eq!(classify("/api/widget.js"), Strategy::CacheFirst);
        assert_eq!(classify("/dashboard/report.css"), Strategy::CacheFirst);
    }

    #[test]
    fn test_query_does_not_affect_extension_match() {
        let url = Url::parse("https://example.com/static/app.js?v=3").unwrap();
        assert_eq!(ClassificationRules::default().classify(&url), Strategy::CacheFirst);
    }

    #[test]
    fn test_custom_rules() {
        let rules = ClassificationRules::new(vec![Rule::new(Strategy::NetworkFirst, &[r"^/reports"]).unwrap()]);
        assert_eq!(rules.classify_path("/reports/q3"), Strategy::NetworkFirst);
        assert_eq!(rules.classify_path("/static/app.js"), Strategy::NetworkOnly);
    }

    #[test]
    fn test_invalid_pattern() {
        assert!(matches!(Rule::new(Strategy::CacheFirst, &["("]), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_strategy_display() {
        assert_eq!(Strategy::StaleWhileRevalidate.to_string(), "stale-while-revalidate");
    }
}
