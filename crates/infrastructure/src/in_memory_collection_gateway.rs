use std::cmp::Ordering;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Map, Value};
use tokio::sync::RwLock;
use uuid::Uuid;

use frontdesk_application::RemoteCollectionGateway;
use frontdesk_core::{AppError, AppResult, RecordId, SessionContext};
use frontdesk_domain::{
    EntityKind, ListQuery, ListResult, Record, SortDirection, SubmissionPayload,
    format_wire_date,
};

use crate::mutation::Mutation;

/// In-memory collection used for offline runs and tests.
///
/// Applies the same role gating and actor stamps as the HTTP gateway.
#[derive(Debug)]
pub struct InMemoryCollectionGateway {
    entity: EntityKind,
    session: SessionContext,
    records: RwLock<Vec<Record>>,
}

impl InMemoryCollectionGateway {
    /// Creates an empty collection.
    #[must_use]
    pub fn new(entity: EntityKind, session: SessionContext) -> Self {
        Self::with_records(entity, session, Vec::new())
    }

    /// Creates a collection holding `records`, oldest first.
    #[must_use]
    pub fn with_records(entity: EntityKind, session: SessionContext, records: Vec<Record>) -> Self {
        Self {
            entity,
            session,
            records: RwLock::new(records),
        }
    }

    /// Returns the stored records, oldest first.
    pub async fn records(&self) -> Vec<Record> {
        self.records.read().await.clone()
    }

    fn not_found(&self, record_id: &RecordId) -> AppError {
        AppError::NotFound(format!(
            "{} '{record_id}' does not exist",
            self.entity.display_name()
        ))
    }
}

#[async_trait]
impl RemoteCollectionGateway for InMemoryCollectionGateway {
    fn entity(&self) -> EntityKind {
        self.entity
    }

    async fn list(&self, query: &ListQuery) -> AppResult<ListResult> {
        let records = self.records.read().await;
        let needle = query.search_text().trim().to_lowercase();

        let mut listed = records
            .iter()
            .filter(|record| needle.is_empty() || contains_text(record.data(), needle.as_str()))
            .filter(|record| {
                query
                    .extra_filters()
                    .iter()
                    .all(|(name, value)| record.text(name).as_deref() == Some(value.as_str()))
            })
            .cloned()
            .collect::<Vec<_>>();

        // Later inserts come first among equal sort keys.
        listed.reverse();
        if let Some(sort) = query.sort() {
            listed.sort_by(|left, right| {
                let ordering = compare_values(left.field(sort.field()), right.field(sort.field()));
                match sort.direction() {
                    SortDirection::Ascending => ordering,
                    SortDirection::Descending => ordering.reverse(),
                }
            });
        }

        let total_count = listed.len() as u64;
        let offset = (query.page() as usize - 1).saturating_mul(query.page_size() as usize);
        let items = listed
            .into_iter()
            .skip(offset)
            .take(query.page_size() as usize)
            .collect();

        ListResult::new(items, total_count, query.page(), query.page_size())
    }

    async fn get_by_id(&self, record_id: &RecordId) -> AppResult<Record> {
        self.records
            .read()
            .await
            .iter()
            .find(|record| record.id() == record_id)
            .cloned()
            .ok_or_else(|| self.not_found(record_id))
    }

    async fn create(&self, mut payload: SubmissionPayload) -> AppResult<Record> {
        Mutation::Create.authorize(&self.session, self.entity)?;
        Mutation::Create.stamp(&self.session, self.entity, &mut payload);

        let record_id = RecordId::new(Uuid::new_v4().to_string())?;
        let mut data = payload.to_record_fields();
        data.insert("_id".to_owned(), Value::String(record_id.as_str().to_owned()));
        data.insert(
            "createdAt".to_owned(),
            Value::String(format_wire_date(&Utc::now())),
        );

        let record = Record::new(record_id, self.entity, data);
        self.records.write().await.push(record.clone());
        Ok(record)
    }

    async fn update(&self, record_id: &RecordId, mut payload: SubmissionPayload) -> AppResult<Record> {
        Mutation::Update.authorize(&self.session, self.entity)?;
        Mutation::Update.stamp(&self.session, self.entity, &mut payload);

        let mut records = self.records.write().await;
        let stored = records
            .iter_mut()
            .find(|record| record.id() == record_id)
            .ok_or_else(|| self.not_found(record_id))?;

        let mut data = stored.data().clone();
        for (key, value) in payload.entries() {
            match value.stored_value() {
                Some(value) => {
                    data.insert(key.clone(), value);
                }
                None => {
                    data.remove(key);
                }
            }
        }
        data.insert(
            "updatedAt".to_owned(),
            Value::String(format_wire_date(&Utc::now())),
        );

        *stored = Record::new(record_id.clone(), self.entity, data);
        Ok(stored.clone())
    }

    async fn delete(&self, record_id: &RecordId) -> AppResult<()> {
        Mutation::Delete.authorize(&self.session, self.entity)?;

        let mut records = self.records.write().await;
        let position = records
            .iter()
            .position(|record| record.id() == record_id)
            .ok_or_else(|| self.not_found(record_id))?;
        records.remove(position);
        Ok(())
    }
}

fn contains_text(data: &Map<String, Value>, needle: &str) -> bool {
    data.values().any(|value| value_contains(value, needle))
}

fn value_contains(value: &Value, needle: &str) -> bool {
    match value {
        Value::String(text) => text.to_lowercase().contains(needle),
        Value::Number(number) => number.to_string().contains(needle),
        Value::Object(object) => contains_text(object, needle),
        Value::Array(items) => items.iter().any(|item| value_contains(item, needle)),
        Value::Bool(_) | Value::Null => false,
    }
}

// Missing values sort before present ones.
fn compare_values(left: Option<&Value>, right: Option<&Value>) -> Ordering {
    match (left, right) {
        (Some(Value::Number(left)), Some(Value::Number(right))) => left
            .as_f64()
            .zip(right.as_f64())
            .and_then(|(left, right)| left.partial_cmp(&right))
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(left)), Some(Value::String(right))) => {
            left.to_lowercase().cmp(&right.to_lowercase())
        }
        (Some(Value::Bool(left)), Some(Value::Bool(right))) => left.cmp(right),
        (None | Some(Value::Null), None | Some(Value::Null)) => Ordering::Equal,
        (None | Some(Value::Null), _) => Ordering::Less,
        (_, None | Some(Value::Null)) => Ordering::Greater,
        (Some(left), Some(right)) => left.to_string().cmp(&right.to_string()),
    }
}

#[cfg(test)]
mod tests;
