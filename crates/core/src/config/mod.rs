//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (EDGECACHE_*)
//! 2. TOML config file (if EDGECACHE_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::cache::PartitionSet;

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (EDGECACHE_*)
/// 2. TOML config file (if EDGECACHE_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to SQLite cache database.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// User-Agent string for HTTP requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// HTTP request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Origin that relative URLs (manifest entries, list endpoints) resolve against.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Prefix of every partition name.
    #[serde(default = "default_cache_prefix")]
    pub cache_prefix: String,

    /// Version tag of the current partition set. Bumping it retires every
    /// partition written by earlier versions on the next activation.
    #[serde(default = "default_cache_version")]
    pub cache_version: String,

    /// Must-have URLs stored in the static partition at install time.
    #[serde(default = "default_precache_urls")]
    pub precache_urls: Vec<String>,

    /// API endpoints prefetched into the API partition at install time.
    #[serde(default = "default_api_prefetch_urls")]
    pub api_prefetch_urls: Vec<String>,

    /// Page served to failed navigations.
    #[serde(default = "default_offline_page")]
    pub offline_page: String,

    /// Image served to failed image requests.
    #[serde(default = "default_placeholder_image")]
    pub placeholder_image: String,

    #[serde(default = "default_per_page")]
    pub default_per_page: u32,

    /// Remaining scroll distance (px) that triggers an automatic load.
    #[serde(default = "default_scroll_threshold_px")]
    pub scroll_threshold_px: u32,

    #[serde(default = "default_scroll_throttle_ms")]
    pub scroll_throttle_ms: u64,

    #[serde(default = "default_filter_debounce_ms")]
    pub filter_debounce_ms: u64,

    #[serde(default = "default_banner_dismiss_ms")]
    pub banner_dismiss_ms: u64,

    #[serde(default = "default_reveal_stagger_ms")]
    pub reveal_stagger_ms: u64,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./edgecache.sqlite")
}

fn default_user_agent() -> String {
    "edgecache/0.1".into()
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_origin() -> String {
    "http://localhost:5000".into()
}

fn default_cache_prefix() -> String {
    "edgecache".into()
}

fn default_cache_version() -> String {
    "v1.2.0".into()
}

fn default_precache_urls() -> Vec<String> {
    [
        "/",
        "/static/css/style.css",
        "/static/css/bootstrap.min.css",
        "/static/js/app.js",
        "/static/js/bootstrap.bundle.min.js",
        "/static/images/logo.png",
        "/static/images/ninja-avatar.png",
        "/offline.html",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_api_prefetch_urls() -> Vec<String> {
    ["/api/dashboard-stats", "/api/campaigns", "/api/boutiques", "/health"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_offline_page() -> String {
    "/offline.html".into()
}

fn default_placeholder_image() -> String {
    "/static/images/placeholder.png".into()
}

fn default_per_page() -> u32 {
    20
}

fn default_scroll_threshold_px() -> u32 {
    200
}

fn default_scroll_throttle_ms() -> u64 {
    200
}

fn default_filter_debounce_ms() -> u64 {
    500
}

fn default_banner_dismiss_ms() -> u64 {
    5_000
}

fn default_reveal_stagger_ms() -> u64 {
    50
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
            origin: default_origin(),
            cache_prefix: default_cache_prefix(),
            cache_version: default_cache_version(),
            precache_urls: default_precache_urls(),
            api_prefetch_urls: default_api_prefetch_urls(),
            offline_page: default_offline_page(),
            placeholder_image: default_placeholder_image(),
            default_per_page: default_per_page(),
            scroll_threshold_px: default_scroll_threshold_px(),
            scroll_throttle_ms: default_scroll_throttle_ms(),
            filter_debounce_ms: default_filter_debounce_ms(),
            banner_dismiss_ms: default_banner_dismiss_ms(),
            reveal_stagger_ms: default_reveal_stagger_ms(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// The partition set for the configured prefix and version.
    pub fn partitions(&self) -> PartitionSet {
        PartitionSet::new(&self.cache_prefix, &self.cache_version)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `EDGECACHE_`
    /// 2. TOML file from `EDGECACHE_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file or environment cannot be parsed
    /// or validation fails after loading.
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("EDGECACHE_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("EDGECACHE_")
                .ignore(&["config_file"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
