use frontdesk_core::{AppError, AppResult, RecordId};
use serde_json::{Map, Value};

use crate::{EntityKind, ListResult};

/// A persisted backend record with its flattened JSON fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    id: RecordId,
    entity: EntityKind,
    data: Map<String, Value>,
}

impl Record {
    /// Creates a record from an identifier and its JSON object.
    #[must_use]
    pub fn new(id: RecordId, entity: EntityKind, data: Map<String, Value>) -> Self {
        Self { id, entity, data }
    }

    /// Builds a record from a JSON object carrying `_id` or `id`.
    pub fn from_json(entity: EntityKind, value: Value) -> AppResult<Self> {
        let Value::Object(data) = value else {
            return Err(AppError::Transport(format!(
                "{entity} record must be a JSON object"
            )));
        };

        let id = record_id_of(&data).ok_or_else(|| {
            AppError::Transport(format!("{entity} record is missing an identifier"))
        })?;

        Ok(Self { id, entity, data })
    }

    /// Returns the backend identifier.
    #[must_use]
    pub fn id(&self) -> &RecordId {
        &self.id
    }

    /// Returns the collection this record belongs to.
    #[must_use]
    pub fn entity(&self) -> EntityKind {
        self.entity
    }

    /// Returns the raw JSON fields.
    #[must_use]
    pub fn data(&self) -> &Map<String, Value> {
        &self.data
    }

    /// Returns the value at a dotted path such as `address.city`.
    #[must_use]
    pub fn field(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let first = segments.next()?;
        let mut current = self.data.get(first)?;
        for segment in segments {
            current = current.as_object()?.get(segment)?;
        }

        Some(current)
    }

    /// Returns the text at a dotted path, rendering numbers and booleans.
    #[must_use]
    pub fn text(&self, path: &str) -> Option<String> {
        match self.field(path)? {
            Value::Null => None,
            Value::String(value) => Some(value.clone()),
            Value::Number(value) => Some(value.to_string()),
            Value::Bool(value) => Some(value.to_string()),
            other => Some(other.to_string()),
        }
    }

    /// Returns a human-readable label for confirmations and listings.
    #[must_use]
    pub fn label(&self) -> String {
        const CANDIDATES: &[&str] = &["name", "bedNumber", "roomNumber", "code", "email"];
        CANDIDATES
            .iter()
            .find_map(|path| self.text(path).filter(|value| !value.trim().is_empty()))
            .unwrap_or_else(|| self.id.to_string())
    }
}

/// Where a single-record response keeps the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordShape {
    /// Record nested two levels deep, e.g. `{ "doctor": { "doctor": {...} } }`.
    Nested(&'static str, &'static str),
    /// Record under one key.
    Keyed(&'static str),
    /// The body is the record.
    Root,
}

impl RecordShape {
    /// Returns the candidate object for this shape, if present.
    #[must_use]
    pub fn extract<'a>(&self, body: &'a Value) -> Option<&'a Value> {
        let candidate = match self {
            Self::Nested(outer, inner) => body.get(outer)?.get(inner)?,
            Self::Keyed(key) => body.get(key)?,
            Self::Root => body,
        };

        candidate.is_object().then_some(candidate)
    }

    /// Returns the ordered shapes single-record responses of `entity` are tried against.
    #[must_use]
    pub fn candidates(entity: EntityKind) -> Vec<Self> {
        let mut shapes = Vec::with_capacity(4);
        if entity == EntityKind::Doctor {
            shapes.push(Self::Nested("doctor", "doctor"));
        }
        shapes.push(Self::Keyed(entity.record_key()));
        shapes.push(Self::Keyed("data"));
        shapes.push(Self::Root);
        shapes
    }
}

/// Extracts the record from a single-record response body.
///
/// Shapes are tried in order and the first object carrying an identifier wins.
pub fn parse_record_envelope(entity: EntityKind, body: &Value) -> AppResult<Record> {
    RecordShape::candidates(entity)
        .iter()
        .filter_map(|shape| shape.extract(body))
        .find(|candidate| {
            candidate
                .as_object()
                .and_then(record_id_of)
                .is_some()
        })
        .map(|candidate| Record::from_json(entity, candidate.clone()))
        .unwrap_or_else(|| {
            Err(AppError::Transport(format!(
                "unrecognized {entity} response shape"
            )))
        })
}

/// Extracts a page of records from a list response body.
///
/// Items are read from the entity list key, `data`, `items`, or a bare array.
pub fn parse_list_envelope(
    entity: EntityKind,
    body: &Value,
    requested_page: u32,
    requested_page_size: u32,
) -> AppResult<ListResult> {
    let items = [entity.list_key(), "data", "items"]
        .iter()
        .find_map(|key| body.get(key).and_then(Value::as_array))
        .or_else(|| body.as_array())
        .ok_or_else(|| {
            AppError::Transport(format!("unrecognized {entity} list response shape"))
        })?;

    let records = items
        .iter()
        .map(|item| Record::from_json(entity, item.clone()))
        .collect::<AppResult<Vec<_>>>()?;

    let total_count = ["total", "totalCount", "count"]
        .iter()
        .find_map(|key| number_at(body, key))
        .unwrap_or(records.len() as u64);
    let page = number_at(body, "page")
        .and_then(|value| u32::try_from(value).ok())
        .filter(|value| *value > 0)
        .unwrap_or(requested_page);
    let page_size = number_at(body, "limit")
        .and_then(|value| u32::try_from(value).ok())
        .filter(|value| *value as usize >= records.len() && *value > 0)
        .unwrap_or(requested_page_size.max(records.len() as u32));

    ListResult::new(records, total_count, page, page_size)
}

fn record_id_of(data: &Map<String, Value>) -> Option<RecordId> {
    ["_id", "id"].iter().find_map(|key| match data.get(*key)? {
        Value::String(value) => RecordId::new(value.as_str()).ok(),
        Value::Number(value) => RecordId::new(value.to_string()).ok(),
        _ => None,
    })
}

fn number_at(body: &Value, key: &str) -> Option<u64> {
    match body.get(key)? {
        Value::Number(value) => value.as_u64(),
        Value::String(value) => value.trim().parse().ok(),
        _ => None,
    }
}
