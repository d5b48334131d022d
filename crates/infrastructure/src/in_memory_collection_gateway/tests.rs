use serde_json::{Value, json};

use frontdesk_application::RemoteCollectionGateway;
use frontdesk_core::{AppError, RecordId, SessionContext, SessionUser, UserRole};
use frontdesk_domain::{
    EntityKind, FieldValue, FormDraft, FormSchema, ListQuery, ListResult, Record, SortDirection,
    SortSpec, SubmissionPayload,
};

use super::InMemoryCollectionGateway;

fn session(role: UserRole) -> SessionContext {
    SessionContext::authenticated("tok", Some(SessionUser::new("u1", "Asha", None, role)))
}

fn ward(id: &str, name: &str, floor: &str, beds: u64) -> Record {
    Record::from_json(
        EntityKind::Ward,
        json!({ "_id": id, "name": name, "floor": floor, "beds": beds }),
    )
    .unwrap_or_else(|_| unreachable!())
}

fn wards(role: UserRole) -> InMemoryCollectionGateway {
    InMemoryCollectionGateway::with_records(
        EntityKind::Ward,
        session(role),
        vec![
            ward("w1", "General", "f1", 20),
            ward("w2", "ICU", "f2", 8),
            ward("w3", "Maternity", "f1", 12),
            ward("w4", "Pediatric ICU", "f2", 6),
        ],
    )
}

fn ids(result: &ListResult) -> Vec<&str> {
    result.items().iter().map(|record| record.id().as_str()).collect()
}

fn record_id(value: &str) -> RecordId {
    RecordId::new(value).unwrap_or_else(|_| unreachable!())
}

#[tokio::test]
async fn default_listing_shows_latest_first() {
    let gateway = wards(UserRole::Admin);

    let result = gateway
        .list(&ListQuery::default_for(EntityKind::Ward))
        .await
        .unwrap_or_else(|_| unreachable!());

    assert_eq!(ids(&result), vec!["w4", "w3", "w2", "w1"]);
    assert_eq!(result.total_count(), 4);
}

#[tokio::test]
async fn search_sort_and_filters_combine() {
    let gateway = wards(UserRole::Admin);
    let sort = SortSpec::new("beds", SortDirection::Ascending).unwrap_or_else(|_| unreachable!());
    let query = ListQuery::default_for(EntityKind::Ward)
        .with_search_text("icu")
        .with_sort(Some(sort));

    let searched = gateway.list(&query).await.unwrap_or_else(|_| unreachable!());
    assert_eq!(ids(&searched), vec!["w4", "w2"]);

    let filtered = gateway
        .list(&ListQuery::default_for(EntityKind::Ward).with_filter("floor", Some("f1".to_owned())))
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(ids(&filtered), vec!["w3", "w1"]);
}

#[tokio::test]
async fn pages_are_sliced_from_the_filtered_set() {
    let gateway = wards(UserRole::Admin);
    let query = ListQuery::first_page(3)
        .and_then(|query| query.with_page(2))
        .unwrap_or_else(|_| unreachable!());

    let result = gateway.list(&query).await.unwrap_or_else(|_| unreachable!());

    assert_eq!(ids(&result), vec!["w1"]);
    assert_eq!(result.total_pages(), 2);
}

#[tokio::test]
async fn created_records_get_an_id_and_are_listed_first() {
    let gateway = wards(UserRole::Admin);
    let mut payload = SubmissionPayload::default();
    payload.insert_scalar("name", json!("Burns"));

    let created = gateway.create(payload).await.unwrap_or_else(|_| unreachable!());
    let listed = gateway
        .list(&ListQuery::default_for(EntityKind::Ward))
        .await
        .unwrap_or_else(|_| unreachable!());

    assert!(created.data().contains_key("createdAt"));
    assert_eq!(listed.items()[0].id(), created.id());
    assert_eq!(
        gateway.get_by_id(created.id()).await.ok().map(|record| record.label()),
        Some("Burns".to_owned())
    );

    let snapshot = gateway.records().await;
    assert_eq!(snapshot.len(), 5);
    assert_eq!(snapshot.last().map(Record::id), Some(created.id()));
}

#[tokio::test]
async fn update_clears_null_fields_and_keeps_the_rest() {
    let gateway = wards(UserRole::Admin);
    let mut payload = SubmissionPayload::default();
    payload.insert_scalar("floor", Value::Null);
    payload.insert_scalar("beds", json!(24));

    let updated = gateway
        .update(&record_id("w1"), payload)
        .await
        .unwrap_or_else(|_| unreachable!());

    assert_eq!(updated.field("beds"), Some(&json!(24)));
    assert_eq!(updated.field("name"), Some(&json!("General")));
    assert!(updated.field("floor").is_none());
}

#[tokio::test]
async fn charge_updates_are_stamped_for_accountants() {
    let charge = Record::from_json(
        EntityKind::ChargeMaster,
        json!({ "_id": "c1", "name": "Bed charge", "amount": 900 }),
    )
    .unwrap_or_else(|_| unreachable!());
    let gateway = InMemoryCollectionGateway::with_records(
        EntityKind::ChargeMaster,
        session(UserRole::Accountant),
        vec![charge],
    );
    let mut payload = SubmissionPayload::default();
    payload.insert_scalar("amount", json!(950));

    let updated = gateway
        .update(&record_id("c1"), payload)
        .await
        .unwrap_or_else(|_| unreachable!());

    assert_eq!(updated.field("updatedBy"), Some(&json!("u1")));
    assert!(matches!(
        gateway.delete(&record_id("c1")).await,
        Err(AppError::PermissionDenied(_))
    ));
}

#[tokio::test]
async fn deleting_unknown_record_is_not_found() {
    let gateway = wards(UserRole::Admin);

    assert!(matches!(
        gateway.delete(&record_id("w9")).await,
        Err(AppError::NotFound(_))
    ));
    assert!(gateway.delete(&record_id("w2")).await.is_ok());
    assert!(matches!(
        gateway.get_by_id(&record_id("w2")).await,
        Err(AppError::NotFound(_))
    ));
}

#[tokio::test]
async fn non_admin_cannot_create_wards() {
    let gateway = wards(UserRole::Doctor);
    let mut payload = SubmissionPayload::default();
    payload.insert_scalar("name", json!("Burns"));

    assert!(matches!(
        gateway.create(payload).await,
        Err(AppError::PermissionDenied(_))
    ));
    let listed = gateway
        .list(&ListQuery::default_for(EntityKind::Ward))
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(listed.total_count(), 4);
}

#[tokio::test]
async fn clearing_a_nested_leaf_on_edit_removes_it() {
    let patient = Record::from_json(
        EntityKind::Patient,
        json!({
            "_id": "p1",
            "firstName": "Meera",
            "caseType": "opd",
            "opd": { "doctor": "d1", "visitCount": 3 },
            "vitals": { "pulse": 80, "weight": 61 }
        }),
    )
    .unwrap_or_else(|_| unreachable!());
    let gateway = InMemoryCollectionGateway::with_records(
        EntityKind::Patient,
        session(UserRole::Admin),
        vec![patient.clone()],
    );
    let schema = FormSchema::for_entity(EntityKind::Patient);
    let mut draft = FormDraft::from_record(&schema, &patient);
    assert!(draft.set(&schema, "vitals.pulse", FieldValue::Empty).is_ok());
    assert!(draft.set(&schema, "opd.visitCount", FieldValue::Empty).is_ok());

    let updated = gateway
        .update(&record_id("p1"), SubmissionPayload::from_draft(&schema, &draft))
        .await
        .unwrap_or_else(|_| unreachable!());

    assert_eq!(updated.field("vitals"), Some(&json!({ "weight": 61 })));
    assert_eq!(updated.field("opd"), Some(&json!({ "doctor": "d1" })));
    assert_eq!(updated.field("firstName"), Some(&json!("Meera")));
}
