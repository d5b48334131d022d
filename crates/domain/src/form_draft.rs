use std::collections::BTreeMap;

use frontdesk_core::{AppError, AppResult, FieldError, RecordId};

use crate::{BranchDefinition, FieldDefinition, FieldValue, FormSchema, Record};

static EMPTY_VALUE: FieldValue = FieldValue::Empty;

/// Whether a form creates a new record or edits an existing one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormMode {
    /// New record.
    Create,
    /// Existing record identified by `target_id`.
    Edit {
        /// Record being edited.
        target_id: RecordId,
    },
}

impl FormMode {
    /// Returns the edited record id in edit mode.
    #[must_use]
    pub fn target_id(&self) -> Option<&RecordId> {
        match self {
            Self::Create => None,
            Self::Edit { target_id } => Some(target_id),
        }
    }

    /// Returns whether the form edits an existing record.
    #[must_use]
    pub fn is_edit(&self) -> bool {
        matches!(self, Self::Edit { .. })
    }
}

/// Values entered into one create or edit form.
#[derive(Debug, Clone, PartialEq)]
pub struct FormDraft {
    mode: FormMode,
    fields: BTreeMap<String, FieldValue>,
    discriminant: Option<String>,
}

impl FormDraft {
    /// Creates a create-mode draft holding the schema defaults.
    #[must_use]
    pub fn new(schema: &FormSchema) -> Self {
        let fields = schema.defaults();
        let discriminant = discriminant_of(schema, &fields);
        Self {
            mode: FormMode::Create,
            fields,
            discriminant,
        }
    }

    /// Creates an edit-mode draft populated from a fetched record.
    #[must_use]
    pub fn from_record(schema: &FormSchema, record: &Record) -> Self {
        let fields = schema
            .all_fields()
            .map(|field| {
                (
                    field.path().to_owned(),
                    field.value_from_record(record.field(field.path())),
                )
            })
            .collect::<BTreeMap<_, _>>();
        let discriminant = discriminant_of(schema, &fields);

        Self {
            mode: FormMode::Edit {
                target_id: record.id().clone(),
            },
            fields,
            discriminant,
        }
    }

    /// Returns the form mode.
    #[must_use]
    pub fn mode(&self) -> &FormMode {
        &self.mode
    }

    /// Returns all entered values, including those of inactive branches.
    #[must_use]
    pub fn fields(&self) -> &BTreeMap<String, FieldValue> {
        &self.fields
    }

    /// Returns the value at `path`.
    #[must_use]
    pub fn field(&self, path: &str) -> Option<&FieldValue> {
        self.fields.get(path)
    }

    /// Returns the key of the active branch.
    #[must_use]
    pub fn discriminant(&self) -> Option<&str> {
        self.discriminant.as_deref()
    }

    /// Stores a value after checking it against the schema.
    ///
    /// Setting the discriminant field switches the active branch. Values of
    /// the previously active branch stay in the draft.
    pub fn set(&mut self, schema: &FormSchema, path: &str, value: FieldValue) -> AppResult<()> {
        let definition = schema.field(path).ok_or_else(|| {
            AppError::Validation(format!(
                "{} form has no field '{path}'",
                schema.entity()
            ))
        })?;
        definition.accepts(&value)?;

        if let Some(discriminant) = schema.discriminant().filter(|d| d.field() == path) {
            self.discriminant = match value.as_text().map(str::trim) {
                Some(key) if !key.is_empty() => {
                    let branch = discriminant.branch(key).ok_or_else(|| {
                        AppError::Validation(format!("'{key}' is not a valid {path}"))
                    })?;
                    Some(branch.key().to_owned())
                }
                _ => None,
            };
        }

        self.fields.insert(path.to_owned(), value);
        Ok(())
    }

    /// Returns a view over the active branch, if one is selected.
    #[must_use]
    pub fn active_branch<'a>(&'a self, schema: &'a FormSchema) -> Option<ActiveBranch<'a>> {
        let key = self.discriminant.as_deref()?;
        let definition = schema.discriminant()?.branch(key)?;
        Some(ActiveBranch {
            definition,
            fields: &self.fields,
        })
    }

    /// Returns the required-field and type errors of the base section and
    /// the active branch. Inactive branches are not checked.
    #[must_use]
    pub fn validate(&self, schema: &FormSchema) -> Vec<FieldError> {
        schema
            .active_fields(self.discriminant())
            .filter_map(|definition| {
                let value = self.fields.get(definition.path()).unwrap_or(&EMPTY_VALUE);
                if definition.is_required() && value.is_blank() {
                    return Some(FieldError::at(
                        definition.path(),
                        format!("{} is required", definition.label()),
                    ));
                }

                definition
                    .accepts(value)
                    .err()
                    .map(|error| FieldError::at(definition.path(), field_message(error)))
            })
            .collect()
    }
}

/// The selected branch of a discriminated form section.
///
/// Only this branch's fields are reachable through the view.
#[derive(Debug, Clone, Copy)]
pub struct ActiveBranch<'a> {
    definition: &'a BranchDefinition,
    fields: &'a BTreeMap<String, FieldValue>,
}

impl<'a> ActiveBranch<'a> {
    /// Returns the branch key.
    #[must_use]
    pub fn key(&self) -> &'a str {
        self.definition.key()
    }

    /// Returns the branch label.
    #[must_use]
    pub fn label(&self) -> &'a str {
        self.definition.label()
    }

    /// Returns the branch fields with their current values.
    pub fn fields(self) -> impl Iterator<Item = (&'a FieldDefinition, &'a FieldValue)> {
        let values = self.fields;
        self.definition.fields().iter().map(move |definition| {
            (
                definition,
                values.get(definition.path()).unwrap_or(&EMPTY_VALUE),
            )
        })
    }
}

fn discriminant_of(schema: &FormSchema, fields: &BTreeMap<String, FieldValue>) -> Option<String> {
    let discriminant = schema.discriminant()?;
    let key = fields.get(discriminant.field())?.as_text()?.trim();
    discriminant.branch(key).map(|branch| branch.key().to_owned())
}

fn field_message(error: AppError) -> String {
    match error {
        AppError::Validation(message) => message,
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{FormDraft, FormMode};
    use crate::{EntityKind, FieldValue, FormSchema, Record};

    fn text(value: &str) -> FieldValue {
        FieldValue::Text(value.to_owned())
    }

    #[test]
    fn create_draft_starts_from_defaults() {
        let schema = FormSchema::for_entity(EntityKind::Floor);
        let draft = FormDraft::new(&schema);
        assert_eq!(draft.mode(), &FormMode::Create);
        assert_eq!(draft.field("isActive"), Some(&FieldValue::Bool(true)));
        assert!(draft.discriminant().is_none());
    }

    #[test]
    fn switching_branches_keeps_earlier_values() {
        let schema = FormSchema::for_entity(EntityKind::Patient);
        let mut draft = FormDraft::new(&schema);

        assert!(draft.set(&schema, "caseType", text("opd")).is_ok());
        assert!(draft.set(&schema, "opd.visitReason", text("fever")).is_ok());
        assert!(draft.set(&schema, "caseType", text("ipd")).is_ok());
        assert_eq!(draft.discriminant(), Some("ipd"));
        assert!(draft.set(&schema, "caseType", text("opd")).is_ok());

        assert_eq!(draft.field("opd.visitReason"), Some(&text("fever")));
        let branch = draft.active_branch(&schema).map(|branch| branch.key());
        assert_eq!(branch, Some("opd"));
    }

    #[test]
    fn unknown_branch_and_field_are_rejected() {
        let schema = FormSchema::for_entity(EntityKind::Patient);
        let mut draft = FormDraft::new(&schema);
        assert!(draft.set(&schema, "caseType", text("daycare")).is_err());
        assert!(draft.set(&schema, "nickname", text("Bob")).is_err());
        assert!(draft.set(&schema, "age", text("forty")).is_err());
        assert!(draft.discriminant().is_none());
    }

    #[test]
    fn edit_draft_reads_discriminant_from_record() {
        let schema = FormSchema::for_entity(EntityKind::Bed);
        let record = Record::from_json(
            EntityKind::Bed,
            json!({
                "_id": "b1",
                "bedNumber": "B-12",
                "bedLocationType": "WARD",
                "ward": { "_id": "w7", "name": "General" },
                "floor": "f1"
            }),
        )
        .unwrap_or_else(|_| unreachable!());

        let draft = FormDraft::from_record(&schema, &record);
        assert_eq!(draft.mode().target_id().map(|id| id.as_str()), Some("b1"));
        assert_eq!(draft.discriminant(), Some("WARD"));
        assert_eq!(draft.field("ward"), Some(&text("w7")));
    }

    #[test]
    fn validation_ignores_inactive_branch() {
        let schema = FormSchema::for_entity(EntityKind::Bed);
        let mut draft = FormDraft::new(&schema);
        for (path, value) in [
            ("bedNumber", "B-1"),
            ("bedType", "general"),
            ("floor", "f1"),
            ("bedLocationType", "ROOM"),
        ] {
            assert!(draft.set(&schema, path, text(value)).is_ok());
        }

        let paths = draft
            .validate(&schema)
            .into_iter()
            .filter_map(|error| error.path)
            .collect::<Vec<_>>();
        assert_eq!(paths, vec!["room".to_owned()]);
    }
}
