use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::{FieldKind, FieldValue, FileHandle, FormDraft, FormSchema};

/// One top-level entry of a create or update request body.
#[derive(Debug, Clone, PartialEq)]
pub enum PayloadValue {
    /// Plain value sent as-is. `Null` clears a field on update.
    Scalar(Value),
    /// Structured value sent as embedded JSON, or as JSON text in multipart bodies.
    Nested(Value),
    /// Binary part.
    File(FileHandle),
}

impl PayloadValue {
    /// Returns the value a backend keeps for this entry, or `None` when the
    /// entry clears the field.
    ///
    /// Null leaves inside nested values are dropped, and a nested object left
    /// with no leaves clears the field too.
    #[must_use]
    pub fn stored_value(&self) -> Option<Value> {
        match self {
            Self::Scalar(Value::Null) => None,
            Self::Scalar(value) => Some(value.clone()),
            Self::Nested(Value::Object(object)) if object.is_empty() => {
                Some(Value::Object(Map::new()))
            }
            Self::Nested(value) => without_nulls(value),
            Self::File(file) => Some(Value::String(file.file_name().to_owned())),
        }
    }
}

/// Wire-ready body of a create or update request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubmissionPayload {
    entries: BTreeMap<String, PayloadValue>,
}

impl SubmissionPayload {
    /// Serializes the base section and active branch of a draft.
    ///
    /// Dotted paths are grouped into one nested object per top-level key.
    /// Empty values, top-level or nested leaves, are left out when creating
    /// and sent as null when editing. Inactive branch values are never
    /// serialized.
    #[must_use]
    pub fn from_draft(schema: &FormSchema, draft: &FormDraft) -> Self {
        let editing = draft.mode().is_edit();
        let mut entries = BTreeMap::new();
        let mut groups: BTreeMap<String, Map<String, Value>> = BTreeMap::new();

        for definition in schema.active_fields(draft.discriminant()) {
            let value = draft.field(definition.path()).cloned().unwrap_or(FieldValue::Empty);

            if let Some((head, rest)) = definition.path().split_once('.') {
                let group = groups.entry(head.to_owned()).or_default();
                match value.to_wire().filter(|_| !value.is_blank()) {
                    Some(wire) => insert_path(group, rest, wire),
                    None if editing => insert_path(group, rest, Value::Null),
                    None => {}
                }
                continue;
            }

            let key = definition.path().to_owned();
            match (definition.kind(), value) {
                (_, FieldValue::File(file)) => {
                    entries.insert(key, PayloadValue::File(file));
                }
                (FieldKind::File, _) => {}
                (FieldKind::Object, value) if value.is_blank() => {
                    if editing {
                        entries.insert(key, PayloadValue::Nested(Value::Object(Map::new())));
                    }
                }
                (FieldKind::List, value) if value.is_blank() => {
                    if editing {
                        entries.insert(key, PayloadValue::Nested(Value::Array(Vec::new())));
                    }
                }
                (_, value @ (FieldValue::Object(_) | FieldValue::List(_))) => {
                    if let Some(wire) = value.to_wire() {
                        entries.insert(key, PayloadValue::Nested(wire));
                    }
                }
                (_, value) if value.is_blank() => {
                    if editing {
                        entries.insert(key, PayloadValue::Scalar(Value::Null));
                    }
                }
                (_, value) => {
                    if let Some(wire) = value.to_wire() {
                        entries.insert(key, PayloadValue::Scalar(wire));
                    }
                }
            }
        }

        for (key, group) in groups {
            if !group.is_empty() {
                entries.insert(key, PayloadValue::Nested(Value::Object(group)));
            }
        }

        Self { entries }
    }

    /// Returns the entries in key order.
    #[must_use]
    pub fn entries(&self) -> &BTreeMap<String, PayloadValue> {
        &self.entries
    }

    /// Returns the entry for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&PayloadValue> {
        self.entries.get(key)
    }

    /// Sets a plain entry, replacing any previous value.
    pub fn insert_scalar(&mut self, key: impl Into<String>, value: Value) {
        self.entries.insert(key.into(), PayloadValue::Scalar(value));
    }

    /// Returns whether any binary part is attached.
    #[must_use]
    pub fn has_files(&self) -> bool {
        self.entries
            .values()
            .any(|value| matches!(value, PayloadValue::File(_)))
    }

    /// Returns whether the payload has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Renders the payload as one JSON object. Files are left out.
    #[must_use]
    pub fn to_json(&self) -> Value {
        let object = self
            .entries
            .iter()
            .filter_map(|(key, value)| match value {
                PayloadValue::Scalar(value) | PayloadValue::Nested(value) => {
                    Some((key.clone(), value.clone()))
                }
                PayloadValue::File(_) => None,
            })
            .collect::<Map<_, _>>();

        Value::Object(object)
    }

    /// Rebuilds a record body from the payload, as a backend would store it.
    ///
    /// Cleared entries are dropped and files are stored by name.
    #[must_use]
    pub fn to_record_fields(&self) -> Map<String, Value> {
        self.entries
            .iter()
            .filter_map(|(key, value)| Some((key.clone(), value.stored_value()?)))
            .collect()
    }
}

fn without_nulls(value: &Value) -> Option<Value> {
    match value {
        Value::Null => None,
        Value::Object(object) => {
            let kept = object
                .iter()
                .filter_map(|(key, value)| Some((key.clone(), without_nulls(value)?)))
                .collect::<Map<_, _>>();
            (!kept.is_empty()).then_some(Value::Object(kept))
        }
        other => Some(other.clone()),
    }
}

fn insert_path(target: &mut Map<String, Value>, path: &str, value: Value) {
    match path.split_once('.') {
        None => {
            target.insert(path.to_owned(), value);
        }
        Some((head, rest)) => {
            let child = target
                .entry(head.to_owned())
                .or_insert_with(|| Value::Object(Map::new()));
            if !child.is_object() {
                *child = Value::Object(Map::new());
            }
            if let Value::Object(child) = child {
                insert_path(child, rest, value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{PayloadValue, SubmissionPayload};
    use crate::{parse_date, EntityKind, FieldValue, FileHandle, FormDraft, FormSchema, Record};

    fn text(value: &str) -> FieldValue {
        FieldValue::Text(value.to_owned())
    }

    #[test]
    fn dotted_paths_are_grouped_and_inactive_branch_is_skipped() {
        let schema = FormSchema::for_entity(EntityKind::Patient);
        let mut draft = FormDraft::new(&schema);
        let admitted = parse_date("2026-10-01").unwrap_or_else(|_| unreachable!());
        for (path, value) in [
            ("caseType", text("opd")),
            ("opd.visitReason", text("cough")),
            ("caseType", text("ipd")),
            ("ipd.doctor", text("d1")),
            ("ipd.admissionDate", FieldValue::Date(admitted)),
            ("address.city", text("Pune")),
        ] {
            assert!(draft.set(&schema, path, value).is_ok());
        }

        let payload = SubmissionPayload::from_draft(&schema, &draft);
        assert_eq!(
            payload.get("ipd"),
            Some(&PayloadValue::Nested(json!({
                "doctor": "d1",
                "admissionDate": "2026-10-01T00:00:00.000Z"
            })))
        );
        assert_eq!(
            payload.get("address"),
            Some(&PayloadValue::Nested(json!({ "city": "Pune" })))
        );
        assert!(payload.get("opd").is_none());
        assert!(payload.get("vitals").is_none());
        assert!(payload.get("lastName").is_none());
    }

    #[test]
    fn cleared_fields_are_sent_as_null_when_editing() {
        let schema = FormSchema::for_entity(EntityKind::Floor);
        let record = Record::from_json(
            EntityKind::Floor,
            json!({ "_id": "f1", "name": "Ground", "code": "G", "floorNumber": 0, "notes": "lobby" }),
        )
        .unwrap_or_else(|_| unreachable!());
        let mut draft = FormDraft::from_record(&schema, &record);
        assert!(draft.set(&schema, "notes", FieldValue::Empty).is_ok());

        let payload = SubmissionPayload::from_draft(&schema, &draft);
        assert_eq!(payload.get("notes"), Some(&PayloadValue::Scalar(json!(null))));
        assert_eq!(payload.get("floorNumber"), Some(&PayloadValue::Scalar(json!(0))));
        assert!(!payload.has_files());
    }

    #[test]
    fn cleared_nested_leaves_are_sent_as_null_when_editing() {
        let schema = FormSchema::for_entity(EntityKind::Patient);
        let record = Record::from_json(
            EntityKind::Patient,
            json!({
                "_id": "p1",
                "caseType": "opd",
                "opd": { "doctor": "d1" },
                "vitals": { "pulse": 80 }
            }),
        )
        .unwrap_or_else(|_| unreachable!());
        let mut draft = FormDraft::from_record(&schema, &record);
        assert!(draft.set(&schema, "vitals.pulse", FieldValue::Empty).is_ok());

        let payload = SubmissionPayload::from_draft(&schema, &draft);
        let Some(PayloadValue::Nested(vitals)) = payload.get("vitals") else {
            unreachable!("vitals group is always sent when editing");
        };
        assert_eq!(vitals.get("pulse"), Some(&json!(null)));
        assert_eq!(payload.get("vitals").and_then(PayloadValue::stored_value), None);
        assert_eq!(
            payload.get("opd").and_then(PayloadValue::stored_value),
            Some(json!({ "doctor": "d1" }))
        );
        assert!(payload.to_record_fields().get("vitals").is_none());
    }

    #[test]
    fn numeric_text_is_sent_back_as_stored() {
        let schema = FormSchema::for_entity(EntityKind::Patient);
        let record = Record::from_json(
            EntityKind::Patient,
            json!({ "_id": "p1", "firstName": "Meera", "phone": 9800011122_u64 }),
        )
        .unwrap_or_else(|_| unreachable!());
        let draft = FormDraft::from_record(&schema, &record);

        let payload = SubmissionPayload::from_draft(&schema, &draft);
        assert_eq!(
            payload.get("phone"),
            Some(&PayloadValue::Scalar(json!(9800011122_u64)))
        );
        assert_eq!(
            payload.get("firstName"),
            Some(&PayloadValue::Scalar(json!("Meera")))
        );
    }

    #[test]
    fn attached_file_becomes_binary_part() {
        let schema = FormSchema::for_entity(EntityKind::Doctor);
        let mut draft = FormDraft::new(&schema);
        let photo = FileHandle::new("rao.png", "image/png", vec![1, 2, 3]);
        assert!(draft.set(&schema, "image", FieldValue::File(photo)).is_ok());

        let payload = SubmissionPayload::from_draft(&schema, &draft);
        assert!(payload.has_files());
        assert!(matches!(payload.get("availability"), Some(PayloadValue::Nested(_))));
        assert!(payload.to_json().get("image").is_none());
        assert!(payload.get("education").is_none());
    }
}
