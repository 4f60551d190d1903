//! Pagination state machine.

use serde::{Deserialize, Serialize};

/// Loader phase.
///
/// `Idle → Loading` on a trigger; `Loading → Idle | Exhausted` on success
/// depending on whether more pages remain; `Loading → Error` on failure.
/// `Error` settles back once its banner is dismissed. `Exhausted` only
/// reopens through a filter reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadPhase {
    Idle,
    Loading,
    Error,
    Exhausted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationState {
    pub current_page: u32,
    pub total_pages: u32,
    pub per_page: u32,
    pub has_more: bool,
    pub phase: LoadPhase,
}

impl PaginationState {
    pub fn new(current_page: u32, total_pages: u32, per_page: u32) -> Self {
        let current_page = current_page.max(1);
        let total_pages = total_pages.max(1);
        let has_more = current_page < total_pages;
        Self { current_page, total_pages, per_page: per_page.max(1), has_more, phase: Self::settled(has_more) }
    }

    fn settled(has_more: bool) -> LoadPhase {
        if has_more { LoadPhase::Idle } else { LoadPhase::Exhausted }
    }

    pub fn is_loading(&self) -> bool {
        self.phase == LoadPhase::Loading
    }

    /// Whether an explicit load-more may start. Allowed after an error so
    /// the user can retry.
    pub fn can_load_more(&self) -> bool {
        !self.is_loading() && self.has_more
    }

    /// Whether a scroll-triggered load may start.
    pub fn can_auto_load(&self) -> bool {
        self.phase == LoadPhase::Idle && self.has_more
    }

    /// Whether a filter reset may start; it reopens an exhausted list.
    pub fn can_reset(&self) -> bool {
        !self.is_loading()
    }

    /// The page after the current one, if the page counter can still advance.
    pub fn next_page(&self) -> Option<u32> {
        self.current_page.checked_add(1)
    }

    pub(crate) fn begin(&mut self) {
        self.phase = LoadPhase::Loading;
    }

    /// Record a successful page load.
    ///
    /// The server's `has_more` wins when present; otherwise it is derived
    /// from the page count. A list whose page counter cannot advance is
    /// exhausted regardless.
    pub(crate) fn complete_page(&mut self, page: u32, has_more: Option<bool>, total_pages: Option<u32>) {
        self.current_page = page;
        if let Some(total) = total_pages {
            self.total_pages = total.max(1);
        }
        self.has_more =
            has_more.unwrap_or(self.current_page < self.total_pages) && self.next_page().is_some();
        self.phase = Self::settled(self.has_more);
    }

    /// Record a successful reset to the first page. Without a page count the
    /// list is assumed to fit on one page.
    pub(crate) fn complete_reset(&mut self, has_more: Option<bool>, total_pages: Option<u32>) {
        self.total_pages = 1;
        self.complete_page(1, has_more, total_pages);
    }

    /// Record a failure; pagination stays where it was.
    pub(crate) fn fail(&mut self) {
        self.phase = LoadPhase::Error;
    }

    /// Leave the error phase once the banner is gone.
    pub(crate) fn dismiss_error(&mut self) {
        if self.phase == LoadPhase::Error {
            self.phase = Self::settled(self.has_more);
        }
    }
}
