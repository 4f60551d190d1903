//! Loader configuration read from the hosting container.

use edgecache_core::{AppConfig, Error};
use scraper::{Html, Selector};
use std::time::Duration;

pub const DEFAULT_ITEM_SELECTOR: &str = ".list-item";

/// Per-container settings, taken from `data-*` attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderConfig {
    /// List endpoint, possibly relative to the origin.
    pub endpoint: String,
    pub current_page: u32,
    pub total_pages: u32,
    pub per_page: u32,
    pub item_selector: String,
    pub infinite_scroll: bool,
}

impl LoaderConfig {
    /// Read the first `[data-progressive-container]` element in `html`.
    ///
    /// Only `data-endpoint` is required. Missing or unparsable numbers fall
    /// back to page 1 of 1 and `default_per_page`.
    pub fn from_container(html: &str, default_per_page: u32) -> Result<Self, Error> {
        let document = Html::parse_document(html);
        let selector = Selector::parse("[data-progressive-container]")
            .map_err(|e| Error::InvalidInput(format!("invalid container selector: {e}")))?;
        let element = document
            .select(&selector)
            .next()
            .ok_or_else(|| Error::InvalidInput("no [data-progressive-container] element".into()))?;
        let el = element.value();

        let endpoint = el
            .attr("data-endpoint")
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .ok_or_else(|| Error::InvalidInput("container has no data-endpoint".into()))?
            .to_string();

        let number = |name: &str, default: u32| {
            el.attr(name)
                .and_then(|v| v.trim().parse::<u32>().ok())
                .filter(|n| *n > 0)
                .unwrap_or(default)
        };

        Ok(Self {
            endpoint,
            current_page: number("data-current-page", 1),
            total_pages: number("data-total-pages", 1),
            per_page: number("data-per-page", default_per_page),
            item_selector: el
                .attr("data-item-selector")
                .filter(|s| !s.trim().is_empty())
                .unwrap_or(DEFAULT_ITEM_SELECTOR)
                .to_string(),
            infinite_scroll: el.attr("data-infinite-scroll") == Some("true"),
        })
    }
}

/// Timing and threshold knobs shared by every loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoaderTiming {
    /// Remaining scroll distance that triggers an automatic load.
    pub scroll_threshold_px: u32,
    pub scroll_throttle: Duration,
    pub filter_debounce: Duration,
    pub banner_dismiss: Duration,
    pub reveal_stagger: Duration,
}

impl Default for LoaderTiming {
    fn default() -> Self {
        Self::from_app(&AppConfig::default())
    }
}

impl LoaderTiming {
    pub fn from_app(config: &AppConfig) -> Self {
        Self {
            scroll_threshold_px: config.scroll_threshold_px,
            scroll_throttle: Duration::from_millis(config.scroll_throttle_ms),
            filter_debounce: Duration::from_millis(config.filter_debounce_ms),
            banner_dismiss: Duration::from_millis(config.banner_dismiss_ms),
            reveal_stagger: Duration::from_millis(config.reveal_stagger_ms),
        }
    }
}
