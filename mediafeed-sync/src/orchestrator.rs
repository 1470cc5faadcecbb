//! Fetch orchestrator: the feed state machine.
//!
//! Every user or timer event is a synchronous transition over [`FeedState`]
//! that may emit a [`FetchRequest`]. The caller performs the request against
//! a gateway and feeds the result back through [`FeedState::complete`]. No
//! transition awaits, so the state can be unit-tested without a runtime.
//!
//! # Epochs
//!
//! Each replace-class request bumps the [`FetchEpoch`]. Every request carries
//! the epoch it was issued under, and a completion whose epoch is no longer
//! current is discarded without touching the state. This is how a later
//! filter change wins over an earlier, still-pending fetch.

use mediafeed_core::{
    Cursor, FeedError, FeedResult, FetchEpoch, FetchFailure, HasMorePolicy, Item, Page, Section,
    SectionCatalog, SummaryStats,
};

use crate::config::SyncConfig;
use crate::filter::{FilterChange, FilterController};
use crate::pagination::PaginationEngine;
use crate::selection::SelectionTracker;

/// Why a replace-class fetch was issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplaceReason {
    /// First load of the session.
    Initial,
    /// The active section changed.
    FilterChange,
    /// Timer tick or explicit refresh of the active section.
    Refresh,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchKind {
    Replace(ReplaceReason),
    Append,
}

/// A gateway call the caller must perform on behalf of the state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub kind: FetchKind,
    pub epoch: FetchEpoch,
    pub section: Section,
    pub cursor: Option<Cursor>,
    pub page_size: usize,
}

impl FetchRequest {
    pub fn is_replace(&self) -> bool {
        matches!(self.kind, FetchKind::Replace(_))
    }
}

/// What happened when a request's result was fed back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The collection was substituted; `items` is its new length.
    Replaced { items: usize },
    /// `added` items were appended.
    Appended { added: usize },
    /// The request failed; state flags were updated, items kept.
    Failed(FeedError),
    /// The result belonged to a superseded epoch and was dropped.
    Stale,
}

impl FetchOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Replaced { .. } | Self::Appended { .. })
    }
}

/// Read-only view of the feed for the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedSnapshot {
    pub items: Vec<Item>,
    pub selected: Option<Item>,
    pub sections: Vec<Section>,
    pub active_section: Section,
    pub loading: bool,
    pub loading_more: bool,
    pub error: Option<FetchFailure>,
    pub load_more_error: Option<FetchFailure>,
    pub more_available: bool,
    pub stats: Option<SummaryStats>,
    pub epoch: FetchEpoch,
}

/// Owned state of one feed: collection, cursor, filter, selection, flags.
#[derive(Debug, Clone)]
pub struct FeedState {
    pagination: PaginationEngine,
    filter: FilterController,
    selection: SelectionTracker,
    epoch: FetchEpoch,
    loading: bool,
    loading_more: bool,
    error: Option<FetchFailure>,
    load_more_error: Option<FetchFailure>,
    stats: Option<SummaryStats>,
}

impl FeedState {
    pub fn new(config: &SyncConfig, policy: HasMorePolicy) -> Self {
        Self {
            pagination: PaginationEngine::new(policy, config.page_size),
            filter: FilterController::new(config.initial_section.clone()),
            selection: SelectionTracker::new(),
            epoch: FetchEpoch::initial(),
            loading: false,
            loading_more: false,
            error: None,
            load_more_error: None,
            stats: None,
        }
    }

    // ------------------------------------------------------------------------
    // Transitions that may issue a fetch
    // ------------------------------------------------------------------------

    /// Issue the first load for the active section.
    pub fn start_initial(&mut self) -> FetchRequest {
        self.begin_replace(ReplaceReason::Initial)
    }

    /// Switch section. Unknown sections are rejected with the state
    /// unchanged; re-selecting the active section issues nothing.
    pub fn set_filter(&mut self, section: Section) -> FeedResult<Option<FetchRequest>> {
        match self.filter.set_filter(section)? {
            FilterChange::Unchanged => Ok(None),
            FilterChange::Changed { previous } => {
                tracing::debug!(
                    from = %previous,
                    to = %self.filter.active(),
                    "Section changed"
                );
                Ok(Some(self.begin_replace(ReplaceReason::FilterChange)))
            }
        }
    }

    /// Explicit refresh of the active section. Always issues a fetch.
    pub fn refresh(&mut self) -> FetchRequest {
        self.begin_replace(ReplaceReason::Refresh)
    }

    /// Timer-driven refresh; skipped while any fetch is in flight.
    pub fn refresh_tick(&mut self) -> Option<FetchRequest> {
        if self.is_busy() {
            tracing::trace!(
                loading = self.loading,
                loading_more = self.loading_more,
                "Refresh tick skipped"
            );
            return None;
        }
        Some(self.begin_replace(ReplaceReason::Refresh))
    }

    /// Request the next page. Returns `None`, leaving the state untouched,
    /// when a fetch is already in flight, nothing more is available, or
    /// there is no cursor to resume from.
    pub fn load_more(&mut self) -> Option<FetchRequest> {
        if self.is_busy() || !self.pagination.more_available() {
            return None;
        }
        let cursor = self.pagination.cursor()?.clone();

        self.loading_more = true;
        Some(FetchRequest {
            kind: FetchKind::Append,
            epoch: self.epoch,
            section: self.filter.active().clone(),
            cursor: Some(cursor),
            page_size: self.pagination.page_size(),
        })
    }

    fn begin_replace(&mut self, reason: ReplaceReason) -> FetchRequest {
        self.epoch = self.epoch.next();
        self.loading = true;
        // A pending append belongs to the superseded epoch and will be
        // discarded on arrival.
        self.loading_more = false;
        self.load_more_error = None;

        if reason == ReplaceReason::FilterChange {
            self.pagination.reset();
            self.selection.clear();
        }

        FetchRequest {
            kind: FetchKind::Replace(reason),
            epoch: self.epoch,
            section: self.filter.active().clone(),
            cursor: None,
            page_size: self.pagination.page_size(),
        }
    }

    // ------------------------------------------------------------------------
    // Completion
    // ------------------------------------------------------------------------

    /// Apply the gateway's answer to `request`.
    pub fn complete(&mut self, request: &FetchRequest, result: FeedResult<Page>) -> FetchOutcome {
        if request.epoch != self.epoch {
            tracing::trace!(
                section = %request.section,
                request_epoch = %request.epoch,
                current_epoch = %self.epoch,
                "Discarding stale fetch result"
            );
            return FetchOutcome::Stale;
        }

        match request.kind {
            FetchKind::Replace(reason) => self.complete_replace(request, reason, result),
            FetchKind::Append => self.complete_append(request, result),
        }
    }

    fn complete_replace(
        &mut self,
        request: &FetchRequest,
        reason: ReplaceReason,
        result: FeedResult<Page>,
    ) -> FetchOutcome {
        self.loading = false;
        match result {
            Ok(page) => {
                self.pagination.replace(page);
                let items = self.pagination.items();
                if reason == ReplaceReason::Refresh {
                    self.selection.reconcile(items);
                }
                self.selection.auto_select_if_empty(items);
                if self.filter.discover_from_items(items) {
                    tracing::debug!(
                        sections = self.filter.sections().len(),
                        "Derived sections from first page"
                    );
                }
                self.error = None;

                tracing::info!(
                    section = %request.section,
                    epoch = %request.epoch,
                    items = items.len(),
                    more_available = self.pagination.more_available(),
                    "Applied replace fetch"
                );
                FetchOutcome::Replaced { items: items.len() }
            }
            Err(err) => {
                tracing::warn!(
                    section = %request.section,
                    epoch = %request.epoch,
                    transport = err.is_transport(),
                    error = %err,
                    "Replace fetch failed; keeping current items"
                );
                self.error = Some(FetchFailure::from(&err));
                FetchOutcome::Failed(err)
            }
        }
    }

    fn complete_append(&mut self, request: &FetchRequest, result: FeedResult<Page>) -> FetchOutcome {
        self.loading_more = false;
        match result {
            Ok(page) => {
                let added = self.pagination.append(page);
                self.load_more_error = None;
                tracing::debug!(
                    section = %request.section,
                    added,
                    total = self.pagination.len(),
                    more_available = self.pagination.more_available(),
                    "Applied load-more fetch"
                );
                FetchOutcome::Appended { added }
            }
            Err(err) => {
                tracing::warn!(
                    section = %request.section,
                    cursor = ?request.cursor,
                    error = %err,
                    "Load-more fetch failed; cursor kept for retry"
                );
                self.load_more_error = Some(FetchFailure::from(&err));
                FetchOutcome::Failed(err)
            }
        }
    }

    // ------------------------------------------------------------------------
    // Non-fetching transitions
    // ------------------------------------------------------------------------

    pub fn select_item(&mut self, id: &str) -> bool {
        self.selection.select(id, self.pagination.items())
    }

    pub fn select_next(&mut self) {
        self.selection.select_next(self.pagination.items());
    }

    pub fn select_previous(&mut self) {
        self.selection.select_previous(self.pagination.items());
    }

    pub fn install_catalog(&mut self, catalog: &SectionCatalog) {
        self.filter.install_catalog(catalog);
    }

    pub fn set_stats(&mut self, stats: Option<SummaryStats>) {
        self.stats = stats;
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    pub fn is_busy(&self) -> bool {
        self.loading || self.loading_more
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_loading_more(&self) -> bool {
        self.loading_more
    }

    pub fn epoch(&self) -> FetchEpoch {
        self.epoch
    }

    pub fn items(&self) -> &[Item] {
        self.pagination.items()
    }

    pub fn cursor(&self) -> Option<&Cursor> {
        self.pagination.cursor()
    }

    pub fn more_available(&self) -> bool {
        self.pagination.more_available()
    }

    pub fn selected(&self) -> Option<&Item> {
        self.selection.selected()
    }

    pub fn active_section(&self) -> &Section {
        self.filter.active()
    }

    pub fn sections(&self) -> &[Section] {
        self.filter.sections()
    }

    pub fn error(&self) -> Option<&FetchFailure> {
        self.error.as_ref()
    }

    pub fn load_more_error(&self) -> Option<&FetchFailure> {
        self.load_more_error.as_ref()
    }

    pub fn snapshot(&self) -> FeedSnapshot {
        FeedSnapshot {
            items: self.pagination.items().to_vec(),
            selected: self.selection.selected().cloned(),
            sections: self.filter.sections().to_vec(),
            active_section: self.filter.active().clone(),
            loading: self.loading,
            loading_more: self.loading_more,
            error: self.error.clone(),
            load_more_error: self.load_more_error.clone(),
            more_available: self.pagination.more_available(),
            stats: self.stats.clone(),
            epoch: self.epoch,
        }
    }
}
