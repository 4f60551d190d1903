//! Progressive list loader.
//!
//! Reveals a paginated list page by page, either on explicit "load more"
//! requests or when the reader scrolls near the bottom, and swaps the whole
//! list when filters change. At most one page request is in flight at a
//! time; failures leave pagination untouched and show an auto-dismissing
//! banner inside the container.

pub mod config;
pub mod container;
pub mod filter;
pub mod notify;
pub mod schedule;
pub mod source;
pub mod state;

use edgecache_core::Error;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{Mutex, broadcast};

pub use config::{LoaderConfig, LoaderTiming};
pub use container::{Container, LoadMoreControl, Node, NodeKind};
pub use filter::{FilterField, FilterForm};
pub use notify::{Notifier, Severity};
pub use schedule::{Debouncer, Throttle};
pub use source::{HttpListSource, ListSource, PageRequest, PageResponse};
pub use state::{LoadPhase, PaginationState};

const LOAD_FAILED: &str = "Failed to load items";
const FILTER_FAILED: &str = "Failed to filter items";
const CONNECTION_ERROR: &str = "Connection error";

/// Notifications emitted by a loader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LoaderEvent {
    ItemsLoaded { page: u32, total_items: u64 },
    Filtered { total_items: u64 },
    LoadFailed { message: String },
    /// The container should be scrolled to its top.
    ScrollIntoView,
}

/// Result of a load or reset trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// A guard rejected the trigger; nothing was requested.
    Skipped,
    Loaded { page: u32 },
    Failed { message: String },
}

/// Scroll position of the viewport, in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollMetrics {
    pub scroll_top: f64,
    pub viewport_height: f64,
    pub document_height: f64,
}

impl ScrollMetrics {
    /// Distance left between the bottom of the viewport and the end of the document.
    pub fn remaining(&self) -> f64 {
        self.document_height - (self.scroll_top + self.viewport_height)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trigger {
    Explicit,
    Scroll,
}

struct Inner {
    state: PaginationState,
    container: Container,
    /// An auto-filter reset arrived while a request was in flight.
    reset_deferred: bool,
}

impl Inner {
    fn refresh(&mut self) {
        self.container.hide_loading();
        self.container.refresh_controls(self.state.has_more, self.state.is_loading());
    }
}

/// Drives one list container.
pub struct ProgressiveLoader<S: ListSource> {
    source: Arc<S>,
    config: LoaderConfig,
    timing: LoaderTiming,
    inner: Arc<Mutex<Inner>>,
    filters: Mutex<Option<FilterForm>>,
    throttle: Mutex<Throttle>,
    debouncer: Debouncer,
    events: broadcast::Sender<LoaderEvent>,
    notifier: Option<Arc<dyn Notifier>>,
}

impl<S: ListSource> ProgressiveLoader<S> {
    pub fn new(source: S, config: LoaderConfig, container: Container, timing: LoaderTiming) -> Self {
        let state = PaginationState::new(config.current_page, config.total_pages, config.per_page);
        let mut container = container.with_reveal_stagger(timing.reveal_stagger);
        container.refresh_controls(state.has_more, false);
        let (events, _) = broadcast::channel(64);

        Self {
            source: Arc::new(source),
            config,
            timing,
            inner: Arc::new(Mutex::new(Inner { state, container, reset_deferred: false })),
            filters: Mutex::new(None),
            throttle: Mutex::new(Throttle::new(timing.scroll_throttle)),
            debouncer: Debouncer::new(timing.filter_debounce),
            events,
            notifier: None,
        }
    }

    /// Attach the filter form whose fields are sent with every request.
    pub fn with_filters(mut self, form: FilterForm) -> Self {
        self.filters = Mutex::new(Some(form));
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LoaderEvent> {
        self.events.subscribe()
    }

    pub async fn state(&self) -> PaginationState {
        self.inner.lock().await.state.clone()
    }

    /// A copy of the container as it is now.
    pub async fn container(&self) -> Container {
        self.inner.lock().await.container.clone()
    }

    /// Load the next page. No-op while loading or when no pages remain.
    pub async fn load_more(&self) -> LoadOutcome {
        self.load_next(Trigger::Explicit).await
    }

    async fn load_next(&self, trigger: Trigger) -> LoadOutcome {
        let request = {
            let mut guard = self.inner.lock().await;
            let inner = &mut *guard;
            let allowed = match trigger {
                Trigger::Explicit => inner.state.can_load_more(),
                Trigger::Scroll => inner.state.can_auto_load(),
            };
            if !allowed {
                return LoadOutcome::Skipped;
            }
            let Some(page) = inner.state.next_page() else {
                inner.state.has_more = false;
                inner.state.phase = LoadPhase::Exhausted;
                inner.refresh();
                return LoadOutcome::Skipped;
            };
            inner.state.begin();
            inner.container.show_loading();
            PageRequest { page, per_page: inner.state.per_page, filters: self.filter_params().await, reset: false }
        };

        let result = self.source.fetch_page(&request).await;

        let outcome = self.finish_page(&request, result).await;
        self.run_deferred_reset().await;
        outcome
    }

    async fn finish_page(&self, request: &PageRequest, result: Result<PageResponse, Error>) -> LoadOutcome {
        let mut guard = self.inner.lock().await;
        let inner = &mut *guard;
        let outcome = match result {
            Ok(page) if page.success => {
                inner.container.append_fragment(&page.items_html);
                inner.state.complete_page(request.page, page.has_more, page.total_pages);
                let total_items = page.total_items.unwrap_or_else(|| inner.container.item_count() as u64);
                tracing::debug!(page = request.page, total_items, "items loaded");
                self.emit(LoaderEvent::ItemsLoaded { page: request.page, total_items });
                LoadOutcome::Loaded { page: request.page }
            }
            Ok(page) => self.fail(inner, failure_message(page.error, LOAD_FAILED)),
            Err(e) => {
                tracing::warn!("loading page {} failed: {}", request.page, e);
                self.fail(inner, CONNECTION_ERROR.to_string())
            }
        };
        inner.refresh();
        outcome
    }

    /// Go back to page 1 with the current filters and replace every item.
    pub async fn reset_and_filter(&self) -> LoadOutcome {
        let outcome = self.reset(false).await;
        self.run_deferred_reset().await;
        outcome
    }

    /// Reset once. When `defer_if_busy` is set and a request is in flight,
    /// the reset is recorded and run by whichever request finishes last.
    async fn reset(&self, defer_if_busy: bool) -> LoadOutcome {
        let request = {
            let mut guard = self.inner.lock().await;
            let inner = &mut *guard;
            if !inner.state.can_reset() {
                if defer_if_busy {
                    tracing::debug!("filter reset deferred until the current request finishes");
                    inner.reset_deferred = true;
                }
                return LoadOutcome::Skipped;
            }
            inner.state.begin();
            inner.container.show_loading();
            PageRequest { page: 1, per_page: inner.state.per_page, filters: self.filter_params().await, reset: true }
        };

        let result = self.source.fetch_page(&request).await;
        self.finish_reset(result).await
    }

    async fn finish_reset(&self, result: Result<PageResponse, Error>) -> LoadOutcome {
        let mut guard = self.inner.lock().await;
        let inner = &mut *guard;
        let outcome = match result {
            Ok(page) if page.success => {
                inner.container.replace_items(&page.items_html);
                inner.state.complete_reset(page.has_more, page.total_pages);
                let total_items = page.total_items.unwrap_or_else(|| inner.container.item_count() as u64);
                tracing::debug!(total_items, "list filtered");
                self.emit(LoaderEvent::Filtered { total_items });
                self.emit(LoaderEvent::ScrollIntoView);
                LoadOutcome::Loaded { page: 1 }
            }
            Ok(page) => self.fail(inner, failure_message(page.error, FILTER_FAILED)),
            Err(e) => {
                tracing::warn!("filtering failed: {}", e);
                self.fail(inner, CONNECTION_ERROR.to_string())
            }
        };
        inner.refresh();
        outcome
    }

    /// Evaluate a scroll event. Evaluations are throttled; a load starts only
    /// when infinite scroll is on, the loader is idle and the end of the
    /// document is within the threshold.
    pub async fn on_scroll(&self, metrics: ScrollMetrics) -> LoadOutcome {
        if !self.config.infinite_scroll || !self.throttle.lock().await.ready() {
            return LoadOutcome::Skipped;
        }
        if metrics.remaining() > f64::from(self.timing.scroll_threshold_px) {
            return LoadOutcome::Skipped;
        }
        self.load_next(Trigger::Scroll).await
    }

    /// Run resets that were deferred while a request was in flight. Stops when
    /// another request has taken over; that request runs them when it ends.
    async fn run_deferred_reset(&self) {
        loop {
            let deferred = std::mem::take(&mut self.inner.lock().await.reset_deferred);
            if !deferred || self.reset(true).await == LoadOutcome::Skipped {
                break;
            }
        }
    }

    /// Update a filter field. Auto-filter fields schedule a debounced reset;
    /// if a request is in flight when the delay ends, the reset runs as soon
    /// as that request finishes.
    pub async fn on_filter_change(self: &Arc<Self>, name: &str, value: &str) {
        let auto = {
            let mut filters = self.filters.lock().await;
            let form = filters.get_or_insert_with(FilterForm::default);
            form.set(name, value);
            form.is_auto_filter(name)
        };

        if auto {
            let loader = Arc::clone(self);
            self.debouncer
                .call(async move {
                    loader.reset(true).await;
                    loader.run_deferred_reset().await;
                })
                .await;
        }
    }

    /// Handle a filter form submission.
    pub async fn submit_filters(&self) -> LoadOutcome {
        self.debouncer.cancel().await;
        self.reset_and_filter().await
    }

    async fn filter_params(&self) -> Vec<(String, String)> {
        self.filters
            .lock()
            .await
            .as_ref()
            .map(FilterForm::active_params)
            .unwrap_or_default()
    }

    fn fail(&self, inner: &mut Inner, message: String) -> LoadOutcome {
        inner.state.fail();
        let banner = inner.container.insert_banner(&message);
        self.schedule_dismissal(banner);

        if let Some(notifier) = &self.notifier {
            notifier.notify(Severity::Error, &message);
        }
        self.emit(LoaderEvent::LoadFailed { message: message.clone() });
        LoadOutcome::Failed { message }
    }

    fn schedule_dismissal(&self, banner: u64) {
        let inner = Arc::clone(&self.inner);
        let delay = self.timing.banner_dismiss;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let mut guard = inner.lock().await;
            let inner = &mut *guard;
            if inner.container.remove_banner(banner) && inner.container.banners().is_empty() {
                inner.state.dismiss_error();
                inner.container.refresh_controls(inner.state.has_more, inner.state.is_loading());
            }
        });
    }

    fn emit(&self, event: LoaderEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

fn failure_message(error: Option<String>, fallback: &str) -> String {
    error
        .map(|e| e.trim().to_string())
        .filter(|e| !e.is_empty())
        .unwrap_or_else(|| fallback.to_string())
}
