use frontdesk_core::AppError;
use frontdesk_domain::{ListQuery, ListResult, Record};

/// Lifecycle of the latest fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchPhase {
    /// Nothing fetched yet.
    Idle,
    /// The latest fetch is in flight.
    Loading,
    /// The latest fetch succeeded.
    Settled,
    /// The latest fetch failed.
    Failed,
}

/// What became of one fetch request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStatus {
    /// Result applied to the state.
    Settled,
    /// Error recorded in the state; the previous result is kept.
    Failed,
    /// A newer fetch was issued before this one settled; its result was discarded.
    Stale,
    /// A debounced fetch was superseded before it was issued.
    Cancelled,
}

/// Renderable state of one list screen.
#[derive(Debug, Clone, PartialEq)]
pub struct ListState {
    pub(super) query: ListQuery,
    pub(super) result: Option<ListResult>,
    pub(super) phase: FetchPhase,
    pub(super) error: Option<AppError>,
}

impl ListState {
    pub(super) fn new(query: ListQuery) -> Self {
        Self {
            query,
            result: None,
            phase: FetchPhase::Idle,
            error: None,
        }
    }

    /// Returns the query of the most recent request.
    #[must_use]
    pub fn query(&self) -> &ListQuery {
        &self.query
    }

    /// Returns the latest settled page.
    #[must_use]
    pub fn result(&self) -> Option<&ListResult> {
        self.result.as_ref()
    }

    /// Returns the records shown, empty before the first settlement.
    #[must_use]
    pub fn items(&self) -> &[Record] {
        self.result.as_ref().map(ListResult::items).unwrap_or_default()
    }

    /// Returns the page the shown records belong to.
    ///
    /// Changes only when a fetch settles.
    #[must_use]
    pub fn page(&self) -> u32 {
        self.result.as_ref().map_or(1, ListResult::page)
    }

    /// Returns the fetch lifecycle phase.
    #[must_use]
    pub fn phase(&self) -> FetchPhase {
        self.phase
    }

    /// Returns whether a fetch is in flight.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.phase == FetchPhase::Loading
    }

    /// Returns the error of the latest failed fetch or delete.
    #[must_use]
    pub fn error(&self) -> Option<&AppError> {
        self.error.as_ref()
    }
}
