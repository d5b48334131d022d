use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::Mutex;

use frontdesk_core::{AppError, AppResult, RecordId};
use frontdesk_domain::{
    EntityKind, ListQuery, ListResult, Record, SortDirection, SortSpec, SubmissionPayload,
};

use crate::{RemoteCollectionGateway, TokioClock};

use super::{FetchPhase, FetchStatus, ListController, ListControllerConfig};

struct FakeCollectionGateway {
    entity: EntityKind,
    records: Mutex<Vec<Record>>,
    list_calls: Mutex<Vec<ListQuery>>,
    page_delays: Mutex<HashMap<u32, Duration>>,
    failing_pages: Mutex<Vec<u32>>,
}

impl FakeCollectionGateway {
    fn with_records(entity: EntityKind, count: usize) -> Self {
        let records = (1..=count)
            .map(|index| {
                Record::from_json(
                    entity,
                    json!({ "_id": format!("r{index}"), "name": format!("Record {index}") }),
                )
                .unwrap_or_else(|_| unreachable!())
            })
            .collect();

        Self {
            entity,
            records: Mutex::new(records),
            list_calls: Mutex::new(Vec::new()),
            page_delays: Mutex::new(HashMap::new()),
            failing_pages: Mutex::new(Vec::new()),
        }
    }

    async fn delay_page(&self, page: u32, delay: Duration) {
        self.page_delays.lock().await.insert(page, delay);
    }

    async fn fail_page(&self, page: u32) {
        self.failing_pages.lock().await.push(page);
    }

    async fn list_calls(&self) -> Vec<ListQuery> {
        self.list_calls.lock().await.clone()
    }
}

#[async_trait]
impl RemoteCollectionGateway for FakeCollectionGateway {
    fn entity(&self) -> EntityKind {
        self.entity
    }

    async fn list(&self, query: &ListQuery) -> AppResult<ListResult> {
        self.list_calls.lock().await.push(query.clone());
        let delay = self.page_delays.lock().await.get(&query.page()).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.failing_pages.lock().await.contains(&query.page()) {
            return Err(AppError::Transport("connection reset".to_owned()));
        }

        let search = query.search_text().to_ascii_lowercase();
        let records = self.records.lock().await;
        let matching = records
            .iter()
            .filter(|record| record.label().to_ascii_lowercase().contains(&search))
            .cloned()
            .collect::<Vec<_>>();
        let page_size = query.page_size() as usize;
        let start = (query.page() as usize - 1) * page_size;
        let items = matching.iter().skip(start).take(page_size).cloned().collect();

        ListResult::new(
            items,
            matching.len() as u64,
            query.page(),
            query.page_size(),
        )
    }

    async fn get_by_id(&self, record_id: &RecordId) -> AppResult<Record> {
        self.records
            .lock()
            .await
            .iter()
            .find(|record| record.id() == record_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("record '{record_id}'")))
    }

    async fn create(&self, _payload: SubmissionPayload) -> AppResult<Record> {
        Err(AppError::Internal("not used".to_owned()))
    }

    async fn update(
        &self,
        _record_id: &RecordId,
        _payload: SubmissionPayload,
    ) -> AppResult<Record> {
        Err(AppError::Internal("not used".to_owned()))
    }

    async fn delete(&self, record_id: &RecordId) -> AppResult<()> {
        let mut records = self.records.lock().await;
        let before = records.len();
        records.retain(|record| record.id() != record_id);
        if records.len() == before {
            return Err(AppError::NotFound(format!("record '{record_id}'")));
        }

        Ok(())
    }
}

fn build_controller(
    gateway: Arc<FakeCollectionGateway>,
    config: ListControllerConfig,
) -> ListController {
    ListController::new(gateway, Arc::new(TokioClock), config)
        .unwrap_or_else(|_| unreachable!())
}

fn record_id(value: &str) -> RecordId {
    RecordId::new(value).unwrap_or_else(|_| unreachable!())
}

#[tokio::test(start_paused = true)]
async fn burst_of_search_keystrokes_issues_one_fetch_with_last_text() {
    let gateway = Arc::new(FakeCollectionGateway::with_records(EntityKind::Doctor, 30));
    let controller = build_controller(
        gateway.clone(),
        ListControllerConfig::for_entity(EntityKind::Doctor),
    );

    let (first, second, third) = tokio::join!(
        controller.set_search_text("Rec"),
        async {
            tokio::time::sleep(Duration::from_millis(150)).await;
            controller.set_search_text("Record 1").await
        },
        async {
            tokio::time::sleep(Duration::from_millis(300)).await;
            controller.set_search_text("Record 2").await
        },
    );

    assert_eq!(first, FetchStatus::Cancelled);
    assert_eq!(second, FetchStatus::Cancelled);
    assert_eq!(third, FetchStatus::Settled);

    let calls = gateway.list_calls().await;
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].search_text(), "Record 2");
    assert_eq!(calls[0].page(), 1);
}

#[tokio::test(start_paused = true)]
async fn slower_earlier_fetch_never_overwrites_newer_page() {
    let gateway = Arc::new(FakeCollectionGateway::with_records(EntityKind::Floor, 45));
    gateway.delay_page(2, Duration::from_millis(400)).await;
    let controller = build_controller(
        gateway.clone(),
        ListControllerConfig::for_entity(EntityKind::Floor),
    );

    let (slow, fast) = tokio::join!(controller.set_page(2), async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        controller.set_page(3).await
    });

    assert_eq!(slow.ok(), Some(FetchStatus::Stale));
    assert_eq!(fast.ok(), Some(FetchStatus::Settled));

    let state = controller.state().await;
    assert_eq!(state.page(), 3);
    assert_eq!(state.items()[0].id().as_str(), "r21");
    assert_eq!(state.phase(), FetchPhase::Settled);
}

#[tokio::test(start_paused = true)]
async fn debounced_search_does_not_clobber_later_page_change() {
    let gateway = Arc::new(FakeCollectionGateway::with_records(EntityKind::Ward, 25));
    let controller = build_controller(
        gateway.clone(),
        ListControllerConfig::for_entity(EntityKind::Ward),
    );

    let (search, page) = tokio::join!(controller.set_search_text("Record"), async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        controller.set_page(2).await
    });

    assert_eq!(search, FetchStatus::Cancelled);
    assert_eq!(page.ok(), Some(FetchStatus::Settled));

    let calls = gateway.list_calls().await;
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].page(), 2);
    assert_eq!(calls[0].search_text(), "Record");
}

#[tokio::test(start_paused = true)]
async fn rejected_page_change_keeps_pending_search() {
    let gateway = Arc::new(FakeCollectionGateway::with_records(EntityKind::Ward, 25));
    let controller = build_controller(
        gateway.clone(),
        ListControllerConfig::for_entity(EntityKind::Ward),
    );

    let (search, page) = tokio::join!(controller.set_search_text("Record 2"), async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        controller.set_page(0).await
    });

    assert!(matches!(page, Err(AppError::Validation(_))));
    assert_eq!(search, FetchStatus::Settled);

    let calls = gateway.list_calls().await;
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].search_text(), "Record 2");
    assert_eq!(calls[0].page(), 1);

    let state = controller.state().await;
    assert_eq!(state.query().search_text(), "Record 2");
    assert!(state.result().is_some());
}

#[tokio::test(start_paused = true)]
async fn page_updates_only_after_settlement() {
    let gateway = Arc::new(FakeCollectionGateway::with_records(EntityKind::Doctor, 37));
    let controller = build_controller(
        gateway.clone(),
        ListControllerConfig::for_entity(EntityKind::Doctor),
    );

    assert_eq!(controller.load().await, FetchStatus::Settled);
    let state = controller.state().await;
    assert_eq!(state.items().len(), 12);
    assert_eq!(state.result().map(ListResult::total_count), Some(37));

    gateway.delay_page(2, Duration::from_millis(200)).await;
    let (status, in_flight) = tokio::join!(controller.set_page(2), async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        controller.state().await
    });

    assert_eq!(in_flight.query().page(), 2);
    assert_eq!(in_flight.page(), 1);
    assert!(in_flight.is_loading());

    assert_eq!(status.ok(), Some(FetchStatus::Settled));
    let settled = controller.state().await;
    assert_eq!(settled.page(), 2);
    assert_eq!(settled.result().map(ListResult::page), Some(2));
    assert_eq!(settled.items().len(), 12);

    let calls = gateway.list_calls().await;
    assert_eq!(calls[1].page(), 2);
    assert_eq!(calls[1].page_size(), 12);
}

#[tokio::test]
async fn page_zero_is_rejected_without_fetching() {
    let gateway = Arc::new(FakeCollectionGateway::with_records(EntityKind::Room, 5));
    let controller = build_controller(
        gateway.clone(),
        ListControllerConfig::for_entity(EntityKind::Room),
    );

    let result = controller.set_page(0).await;
    assert!(matches!(result, Err(AppError::Validation(_))));
    assert!(controller.set_page_size(0).await.is_err());
    assert!(gateway.list_calls().await.is_empty());
    assert_eq!(controller.state().await.query().page(), 1);
}

#[tokio::test]
async fn failed_fetch_keeps_previous_result() {
    let gateway = Arc::new(FakeCollectionGateway::with_records(EntityKind::Bed, 15));
    let controller = build_controller(
        gateway.clone(),
        ListControllerConfig::for_entity(EntityKind::Bed),
    );
    assert_eq!(controller.load().await, FetchStatus::Settled);

    gateway.fail_page(2).await;
    assert_eq!(controller.set_page(2).await.ok(), Some(FetchStatus::Failed));

    let state = controller.state().await;
    assert!(matches!(state.error(), Some(AppError::Transport(_))));
    assert!(!state.is_loading());
    assert_eq!(state.page(), 1);
    assert_eq!(state.items().len(), 10);
}

#[tokio::test]
async fn clearing_sort_restores_newest_first() {
    let gateway = Arc::new(FakeCollectionGateway::with_records(EntityKind::LabTest, 50));
    let controller = build_controller(
        gateway.clone(),
        ListControllerConfig::for_entity(EntityKind::LabTest),
    );
    assert!(controller.set_page(2).await.is_ok());

    let by_name = SortSpec::new("name", SortDirection::Ascending).ok();
    assert_eq!(controller.set_sort(by_name).await, FetchStatus::Settled);
    assert_eq!(controller.state().await.query().page(), 1);

    assert_eq!(controller.set_sort(None).await, FetchStatus::Settled);
    let state = controller.state().await;
    assert_eq!(state.query().sort(), Some(&SortSpec::newest_first()));
}

#[tokio::test]
async fn deleting_unknown_record_is_not_found_and_keeps_items() {
    let gateway = Arc::new(FakeCollectionGateway::with_records(EntityKind::Ward, 4));
    let controller = build_controller(
        gateway.clone(),
        ListControllerConfig::for_entity(EntityKind::Ward),
    );
    assert_eq!(controller.load().await, FetchStatus::Settled);
    let before = controller.state().await.items().to_vec();

    let removal = super::PendingRemoval::new(EntityKind::Ward, record_id("missing"), "Ghost")
        .confirm();
    let result = controller.remove(removal).await;

    assert!(matches!(result, Err(AppError::NotFound(_))));
    let state = controller.state().await;
    assert_eq!(state.items(), before.as_slice());
    assert!(matches!(state.error(), Some(AppError::NotFound(_))));
    assert_eq!(gateway.list_calls().await.len(), 1);
}

#[tokio::test]
async fn delete_refreshes_current_page_by_default() {
    let gateway = Arc::new(FakeCollectionGateway::with_records(EntityKind::Floor, 25));
    let controller = build_controller(
        gateway.clone(),
        ListControllerConfig::for_entity(EntityKind::Floor),
    );
    assert!(controller.set_page(2).await.is_ok());

    let target = controller.state().await.items()[0].clone();
    let pending = controller.request_removal(&target);
    assert_eq!(pending.prompt(), "Delete Floor 'Record 11'? This cannot be undone.");

    let status = controller.remove(pending.confirm()).await;
    assert_eq!(status.ok(), Some(FetchStatus::Settled));

    let state = controller.state().await;
    assert_eq!(state.page(), 2);
    assert_eq!(state.result().map(ListResult::total_count), Some(24));
    assert!(state.items().iter().all(|record| record.id() != target.id()));
}

#[tokio::test]
async fn delete_returns_to_first_page_when_configured() {
    let gateway = Arc::new(FakeCollectionGateway::with_records(EntityKind::Patient, 25));
    let controller = build_controller(
        gateway.clone(),
        ListControllerConfig::for_entity(EntityKind::Patient).with_reset_page_on_delete(true),
    );
    assert!(controller.set_page(3).await.is_ok());

    let target = controller.state().await.items()[0].clone();
    let status = controller
        .remove(controller.request_removal(&target).confirm())
        .await;

    assert_eq!(status.ok(), Some(FetchStatus::Settled));
    assert_eq!(controller.state().await.page(), 1);
}

#[tokio::test]
async fn deleting_last_record_of_a_page_steps_back() {
    let gateway = Arc::new(FakeCollectionGateway::with_records(EntityKind::Room, 21));
    let controller = build_controller(
        gateway.clone(),
        ListControllerConfig::for_entity(EntityKind::Room),
    );
    assert!(controller.set_page(3).await.is_ok());
    assert_eq!(controller.state().await.items().len(), 1);

    let target = controller.state().await.items()[0].clone();
    let status = controller
        .remove(controller.request_removal(&target).confirm())
        .await;

    assert_eq!(status.ok(), Some(FetchStatus::Settled));
    let state = controller.state().await;
    assert_eq!(state.page(), 2);
    assert_eq!(state.items().len(), 10);
}

#[tokio::test]
async fn reset_clears_search_and_filters() {
    let gateway = Arc::new(FakeCollectionGateway::with_records(EntityKind::Bed, 12));
    let controller = build_controller(
        gateway.clone(),
        ListControllerConfig::for_entity(EntityKind::Bed).with_debounce_window(Duration::ZERO),
    );

    assert_eq!(
        controller
            .set_filter("bedLocationType", Some("WARD".to_owned()))
            .await,
        FetchStatus::Settled
    );
    assert_eq!(controller.set_search_text("Record 1").await, FetchStatus::Settled);
    assert_eq!(controller.reset().await, FetchStatus::Settled);

    let state = controller.state().await;
    assert!(state.query().search_text().is_empty());
    assert!(state.query().extra_filters().is_empty());
    assert_eq!(state.items().len(), 10);
}

#[tokio::test]
async fn opening_a_saved_query_fetches_it_as_is() {
    let gateway = Arc::new(FakeCollectionGateway::with_records(EntityKind::Floor, 30));
    let controller = build_controller(
        gateway.clone(),
        ListControllerConfig::for_entity(EntityKind::Floor),
    );
    let query = ListQuery::first_page(5)
        .and_then(|query| query.with_search_text("Record 1").with_page(3))
        .unwrap_or_else(|_| unreachable!());

    assert_eq!(controller.open(query.clone()).await, FetchStatus::Settled);

    let state = controller.state().await;
    assert_eq!(state.query(), &query);
    assert_eq!(gateway.list_calls().await, vec![query]);
    // Eleven labels match; the third page of five holds the last one.
    assert_eq!(state.items().len(), 1);
}
