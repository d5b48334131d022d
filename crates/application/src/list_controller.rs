use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use frontdesk_core::AppResult;
use frontdesk_domain::{EntityKind, ListQuery, Record, SortSpec};

use crate::{Clock, DebounceTimer, RemoteCollectionGateway};

mod removal;
mod state;

#[cfg(test)]
mod tests;

pub use removal::{ConfirmedRemoval, PendingRemoval};
pub use state::{FetchPhase, FetchStatus, ListState};

/// Quiescence window applied to search keystrokes.
pub const DEFAULT_SEARCH_DEBOUNCE: Duration = Duration::from_millis(500);

/// Per-screen list behavior.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListControllerConfig {
    /// Records per page.
    pub page_size: u32,
    /// Whether a successful delete returns the list to page one.
    pub reset_page_on_delete: bool,
    /// Quiescence window of search text changes.
    pub debounce_window: Duration,
}

impl ListControllerConfig {
    /// Returns the defaults of an entity's list screen.
    #[must_use]
    pub fn for_entity(entity: EntityKind) -> Self {
        Self {
            page_size: entity.default_page_size(),
            reset_page_on_delete: false,
            debounce_window: DEFAULT_SEARCH_DEBOUNCE,
        }
    }

    /// Sets whether deletes return to page one.
    #[must_use]
    pub fn with_reset_page_on_delete(mut self, reset_page_on_delete: bool) -> Self {
        self.reset_page_on_delete = reset_page_on_delete;
        self
    }

    /// Sets the search debounce window.
    #[must_use]
    pub fn with_debounce_window(mut self, debounce_window: Duration) -> Self {
        self.debounce_window = debounce_window;
        self
    }
}

struct Inner {
    state: ListState,
    issued: u64,
}

/// Paginated, searchable, sortable state of one list screen.
///
/// Every fetch takes the next sequence number; only the settlement of the
/// most recently issued fetch may change the state.
pub struct ListController {
    gateway: Arc<dyn RemoteCollectionGateway>,
    config: ListControllerConfig,
    debounce: DebounceTimer,
    inner: Mutex<Inner>,
}

impl ListController {
    /// Creates a controller with the entity's default query.
    pub fn new(
        gateway: Arc<dyn RemoteCollectionGateway>,
        clock: Arc<dyn Clock>,
        config: ListControllerConfig,
    ) -> AppResult<Self> {
        let query = ListQuery::default_for(gateway.entity()).with_page_size(config.page_size)?;
        let debounce = DebounceTimer::new(clock, config.debounce_window);

        Ok(Self {
            gateway,
            config,
            debounce,
            inner: Mutex::new(Inner {
                state: ListState::new(query),
                issued: 0,
            }),
        })
    }

    /// Returns the listed entity.
    #[must_use]
    pub fn entity(&self) -> EntityKind {
        self.gateway.entity()
    }

    /// Returns the screen configuration.
    #[must_use]
    pub fn config(&self) -> &ListControllerConfig {
        &self.config
    }

    /// Returns a snapshot of the current state.
    pub async fn state(&self) -> ListState {
        self.inner.lock().await.state.clone()
    }

    /// Fetches the current query, as on first mount.
    pub async fn load(&self) -> FetchStatus {
        self.refresh().await
    }

    /// Replaces the whole query, as when restoring a saved view, and fetches it.
    pub async fn open(&self, query: ListQuery) -> FetchStatus {
        let Ok((sequence, query)) = self.issue(|_| infallible(query)).await;
        self.settle(sequence, query).await
    }

    /// Re-fetches the current query unchanged.
    pub async fn refresh(&self) -> FetchStatus {
        let Ok((sequence, query)) = self.issue(|state| infallible(state.query.clone())).await;
        self.settle(sequence, query).await
    }

    /// Updates the search text and fetches page one once typing pauses.
    ///
    /// A newer call within the debounce window cancels this one, which then
    /// issues no request.
    pub async fn set_search_text(&self, search_text: impl Into<String>) -> FetchStatus {
        let search_text = search_text.into();
        {
            let mut inner = self.inner.lock().await;
            inner.state.query = inner.state.query.clone().with_search_text(search_text);
        }

        if !self.debounce.wait().await {
            debug!(entity = %self.entity(), "search superseded before debounce window elapsed");
            return FetchStatus::Cancelled;
        }

        let Ok((sequence, query)) = self.begin(|state| infallible(state.query.clone())).await;
        self.settle(sequence, query).await
    }

    /// Moves to another page. Page zero is rejected without fetching.
    pub async fn set_page(&self, page: u32) -> AppResult<FetchStatus> {
        let (sequence, query) = self
            .issue(|state| state.query.clone().with_page(page))
            .await?;
        Ok(self.settle(sequence, query).await)
    }

    /// Changes the page size and returns to page one. Zero is rejected.
    pub async fn set_page_size(&self, page_size: u32) -> AppResult<FetchStatus> {
        let (sequence, query) = self
            .issue(|state| state.query.clone().with_page_size(page_size))
            .await?;
        Ok(self.settle(sequence, query).await)
    }

    /// Sorts by another column and returns to page one.
    ///
    /// `None` restores the newest-first default.
    pub async fn set_sort(&self, sort: Option<SortSpec>) -> FetchStatus {
        let Ok((sequence, query)) = self
            .issue(|state| infallible(state.query.clone().with_sort(sort)))
            .await;
        self.settle(sequence, query).await
    }

    /// Sets or clears an entity-specific filter and returns to page one.
    pub async fn set_filter(&self, name: impl Into<String>, value: Option<String>) -> FetchStatus {
        let name = name.into();
        let Ok((sequence, query)) = self
            .issue(|state| infallible(state.query.clone().with_filter(name, value)))
            .await;
        self.settle(sequence, query).await
    }

    /// Clears search text and filters, restores the default sort and page one.
    pub async fn reset(&self) -> FetchStatus {
        let Ok((sequence, query)) = self
            .issue(|state| infallible(state.query.clone().cleared()))
            .await;
        self.settle(sequence, query).await
    }

    /// Starts the confirmation step for deleting `record`.
    #[must_use]
    pub fn request_removal(&self, record: &Record) -> PendingRemoval {
        PendingRemoval::new(self.entity(), record.id().clone(), record.label())
    }

    /// Deletes a confirmed record and refreshes the list.
    ///
    /// The refresh stays on the current page unless the screen resets to page
    /// one, or the deleted record was the only one on a later page. A failed
    /// delete leaves the listed items untouched and is recorded as the state
    /// error.
    pub async fn remove(&self, removal: ConfirmedRemoval) -> AppResult<FetchStatus> {
        let entity = self.entity();
        if let Err(error) = self.gateway.delete(removal.record_id()).await {
            warn!(entity = %entity, record_id = %removal.record_id(), error = %error, "delete failed");
            self.inner.lock().await.state.error = Some(error.clone());
            return Err(error);
        }

        info!(entity = %entity, record_id = %removal.record_id(), "record deleted");

        let reset_page_on_delete = self.config.reset_page_on_delete;
        let (sequence, query) = self
            .issue(|state| {
                let page = state.query.page();
                if reset_page_on_delete || page == 1 {
                    return state.query.clone().with_page(1);
                }

                let emptied_page = state.result.as_ref().is_some_and(|result| {
                    result.page() == page
                        && result.items().len() == 1
                        && result.items()[0].id() == removal.record_id()
                });
                if emptied_page {
                    return state.query.clone().with_page(page - 1);
                }

                Ok(state.query.clone())
            })
            .await?;

        Ok(self.settle(sequence, query).await)
    }

    /// Starts an immediate fetch, superseding a pending debounced search.
    ///
    /// A rejected query leaves the state and the pending search untouched.
    async fn issue<E>(
        &self,
        update: impl FnOnce(&ListState) -> Result<ListQuery, E>,
    ) -> Result<(u64, ListQuery), E> {
        let mut inner = self.inner.lock().await;
        let query = update(&inner.state)?;
        self.debounce.cancel();
        Ok(Self::commit(&mut inner, query))
    }

    async fn begin<E>(
        &self,
        update: impl FnOnce(&ListState) -> Result<ListQuery, E>,
    ) -> Result<(u64, ListQuery), E> {
        let mut inner = self.inner.lock().await;
        let query = update(&inner.state)?;
        Ok(Self::commit(&mut inner, query))
    }

    fn commit(inner: &mut Inner, query: ListQuery) -> (u64, ListQuery) {
        inner.issued += 1;
        let sequence = inner.issued;
        inner.state.query = query.clone();
        inner.state.phase = FetchPhase::Loading;

        (sequence, query)
    }

    async fn settle(&self, sequence: u64, query: ListQuery) -> FetchStatus {
        let entity = self.entity();
        debug!(
            entity = %entity,
            sequence,
            page = query.page(),
            search = query.search_text(),
            "issuing list fetch"
        );
        let outcome = self.gateway.list(&query).await;

        let mut inner = self.inner.lock().await;
        if inner.issued != sequence {
            debug!(
                entity = %entity,
                sequence,
                latest = inner.issued,
                "discarding stale list settlement"
            );
            return FetchStatus::Stale;
        }

        match outcome {
            Ok(result) => {
                inner.state.result = Some(result);
                inner.state.error = None;
                inner.state.phase = FetchPhase::Settled;
                FetchStatus::Settled
            }
            Err(error) => {
                warn!(entity = %entity, sequence, error = %error, "list fetch failed");
                inner.state.error = Some(error);
                inner.state.phase = FetchPhase::Failed;
                FetchStatus::Failed
            }
        }
    }
}

fn infallible(query: ListQuery) -> Result<ListQuery, Infallible> {
    Ok(query)
}

impl std::fmt::Debug for ListController {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("ListController")
            .field("entity", &self.entity())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
