use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use frontdesk_core::{AppError, AppResult};
use serde_json::{Map, Number, Value};

use crate::{parse_date, EntityKind, FieldValue};

/// Input kind of one form field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    /// Free text.
    Text,
    /// Integer or decimal number.
    Number,
    /// Checkbox.
    Boolean,
    /// Calendar date, sent in the wire date format.
    Date,
    /// One of a closed set of option values.
    Choice(Vec<String>),
    /// Identifier of another record, possibly embedded as `{"_id": ...}` on read.
    Reference,
    /// Structured object.
    Object,
    /// Ordered list of entries.
    List,
    /// Binary attachment.
    File,
}

impl FieldKind {
    /// Creates a choice kind from option values.
    #[must_use]
    pub fn choice(options: &[&str]) -> Self {
        Self::Choice(options.iter().map(|option| (*option).to_owned()).collect())
    }
}

/// Declaration of one form field addressed by a dotted path.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDefinition {
    path: String,
    label: String,
    kind: FieldKind,
    required: bool,
    default_value: FieldValue,
}

impl FieldDefinition {
    /// Creates an optional field without a default.
    #[must_use]
    pub fn new(path: impl Into<String>, label: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            path: path.into(),
            label: label.into(),
            kind,
            required: false,
            default_value: FieldValue::Empty,
        }
    }

    /// Marks the field as required.
    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Sets the value a new form starts with and a partial record falls back to.
    #[must_use]
    pub fn with_default(mut self, default_value: FieldValue) -> Self {
        self.default_value = default_value;
        self
    }

    /// Returns the dotted field path.
    #[must_use]
    pub fn path(&self) -> &str {
        self.path.as_str()
    }

    /// Returns the display label.
    #[must_use]
    pub fn label(&self) -> &str {
        self.label.as_str()
    }

    /// Returns the input kind.
    #[must_use]
    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }

    /// Returns whether the field must be filled before submitting.
    #[must_use]
    pub fn is_required(&self) -> bool {
        self.required
    }

    /// Returns the declared default.
    #[must_use]
    pub fn default_value(&self) -> &FieldValue {
        &self.default_value
    }

    /// Checks that `value` fits this field's kind. `Empty` always fits.
    ///
    /// Text fields also hold the numbers and flags some records store in them.
    pub fn accepts(&self, value: &FieldValue) -> AppResult<()> {
        let fits = match (&self.kind, value) {
            (_, FieldValue::Empty) => true,
            (FieldKind::Text | FieldKind::Reference, FieldValue::Text(_)) => true,
            (FieldKind::Text, FieldValue::Number(_) | FieldValue::Bool(_)) => true,
            (FieldKind::Choice(options), FieldValue::Text(text)) => {
                text.trim().is_empty() || options.iter().any(|option| option == text)
            }
            (FieldKind::Number, FieldValue::Number(_)) => true,
            (FieldKind::Boolean, FieldValue::Bool(_)) => true,
            (FieldKind::Date, FieldValue::Date(_)) => true,
            (FieldKind::Object, FieldValue::Object(_)) => true,
            (FieldKind::List, FieldValue::List(_)) => true,
            (FieldKind::File, FieldValue::File(_)) => true,
            _ => false,
        };

        if fits {
            return Ok(());
        }

        match &self.kind {
            FieldKind::Choice(options) => Err(AppError::Validation(format!(
                "{} must be one of {}",
                self.path,
                options.join(", ")
            ))),
            kind => Err(AppError::Validation(format!(
                "{} expects a {} value",
                self.path,
                kind_name(kind)
            ))),
        }
    }

    /// Parses operator text input into a value of this field's kind.
    pub fn parse_input(&self, raw: &str) -> AppResult<FieldValue> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(FieldValue::Empty);
        }

        let value = match &self.kind {
            FieldKind::Text | FieldKind::Reference | FieldKind::Choice(_) => {
                FieldValue::Text(trimmed.to_owned())
            }
            FieldKind::Number => FieldValue::Number(parse_number(trimmed).ok_or_else(|| {
                AppError::Validation(format!("{} expects a number, got '{trimmed}'", self.path))
            })?),
            FieldKind::Boolean => FieldValue::Bool(parse_bool(trimmed).ok_or_else(|| {
                AppError::Validation(format!(
                    "{} expects true or false, got '{trimmed}'",
                    self.path
                ))
            })?),
            FieldKind::Date => FieldValue::Date(parse_date(trimmed)?),
            FieldKind::Object | FieldKind::List => {
                let parsed = serde_json::from_str::<Value>(trimmed).map_err(|error| {
                    AppError::Validation(format!("{} expects JSON: {error}", self.path))
                })?;
                FieldValue::from_json(&parsed)
            }
            FieldKind::File => {
                return Err(AppError::Validation(format!(
                    "{} expects a file attachment",
                    self.path
                )));
            }
        };

        self.accepts(&value)?;
        Ok(value)
    }

    /// Normalizes the value a fetched record holds for this field.
    ///
    /// Missing or unreadable values fall back to the declared default. Scalars
    /// in text fields keep their JSON type so an unchanged edit sends them back
    /// as stored.
    #[must_use]
    pub fn value_from_record(&self, value: Option<&Value>) -> FieldValue {
        let normalized = match (&self.kind, value) {
            (_, None | Some(Value::Null)) => None,
            (FieldKind::Date, Some(Value::String(text))) => {
                parse_date(text).ok().map(FieldValue::Date)
            }
            (FieldKind::Reference, Some(Value::Object(object))) => ["_id", "id"]
                .iter()
                .find_map(|key| object.get(*key))
                .and_then(scalar_text)
                .map(FieldValue::Text),
            (FieldKind::Text, Some(Value::Number(number))) => {
                Some(FieldValue::Number(number.clone()))
            }
            (FieldKind::Text, Some(Value::Bool(flag))) => Some(FieldValue::Bool(*flag)),
            (FieldKind::Text | FieldKind::Reference | FieldKind::Choice(_), Some(value)) => {
                scalar_text(value).map(FieldValue::Text)
            }
            (FieldKind::Number, Some(Value::Number(number))) => {
                Some(FieldValue::Number(number.clone()))
            }
            (FieldKind::Number, Some(Value::String(text))) => {
                parse_number(text.trim()).map(FieldValue::Number)
            }
            (FieldKind::Boolean, Some(Value::Bool(flag))) => Some(FieldValue::Bool(*flag)),
            (FieldKind::Boolean, Some(Value::String(text))) => {
                parse_bool(text.trim()).map(FieldValue::Bool)
            }
            (FieldKind::Object, Some(Value::Object(object))) => {
                Some(FieldValue::Object(self.merge_object_default(object)))
            }
            (FieldKind::List, Some(Value::Array(items))) => Some(FieldValue::List(items.clone())),
            _ => None,
        };

        normalized.unwrap_or_else(|| self.default_value.clone())
    }

    fn merge_object_default(&self, object: &Map<String, Value>) -> Map<String, Value> {
        let mut merged = match &self.default_value {
            FieldValue::Object(defaults) => defaults.clone(),
            _ => Map::new(),
        };
        for (key, value) in object {
            if !value.is_null() {
                merged.insert(key.clone(), value.clone());
            }
        }

        merged
    }
}

/// One named branch of a discriminated form section.
#[derive(Debug, Clone, PartialEq)]
pub struct BranchDefinition {
    key: String,
    label: String,
    fields: Vec<FieldDefinition>,
}

impl BranchDefinition {
    /// Creates a branch.
    #[must_use]
    pub fn new(key: impl Into<String>, label: impl Into<String>, fields: Vec<FieldDefinition>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            fields,
        }
    }

    /// Returns the discriminant value selecting this branch.
    #[must_use]
    pub fn key(&self) -> &str {
        self.key.as_str()
    }

    /// Returns the display label.
    #[must_use]
    pub fn label(&self) -> &str {
        self.label.as_str()
    }

    /// Returns the fields only this branch shows.
    #[must_use]
    pub fn fields(&self) -> &[FieldDefinition] {
        &self.fields
    }
}

/// A field whose value selects exactly one active branch.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscriminantDefinition {
    field: String,
    branches: Vec<BranchDefinition>,
}

impl DiscriminantDefinition {
    /// Creates a discriminant over `field`.
    #[must_use]
    pub fn new(field: impl Into<String>, branches: Vec<BranchDefinition>) -> Self {
        Self {
            field: field.into(),
            branches,
        }
    }

    /// Returns the discriminant field path.
    #[must_use]
    pub fn field(&self) -> &str {
        self.field.as_str()
    }

    /// Returns all branches.
    #[must_use]
    pub fn branches(&self) -> &[BranchDefinition] {
        &self.branches
    }

    /// Returns the branch selected by `key`.
    #[must_use]
    pub fn branch(&self, key: &str) -> Option<&BranchDefinition> {
        self.branches.iter().find(|branch| branch.key == key)
    }
}

/// Field computed from other fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DerivedRule {
    /// Whole years elapsed since the date in `source`, written to `target`.
    AgeFromDate {
        /// Date field.
        source: String,
        /// Numeric field receiving the age.
        target: String,
    },
    /// Selects the discriminant branch from which candidate field is filled.
    ///
    /// Applies only while no branch is chosen and exactly one candidate is set.
    BranchFromPresence {
        /// `(field path, branch key)` pairs.
        candidates: Vec<(String, String)>,
    },
}

/// Declarative form layout of one entity.
#[derive(Debug, Clone, PartialEq)]
pub struct FormSchema {
    entity: EntityKind,
    fields: Vec<FieldDefinition>,
    discriminant: Option<DiscriminantDefinition>,
    derived: Vec<DerivedRule>,
}

impl FormSchema {
    /// Creates a schema from its base fields.
    #[must_use]
    pub fn new(entity: EntityKind, fields: Vec<FieldDefinition>) -> Self {
        Self {
            entity,
            fields,
            discriminant: None,
            derived: Vec::new(),
        }
    }

    /// Adds a discriminated section.
    #[must_use]
    pub fn with_discriminant(mut self, discriminant: DiscriminantDefinition) -> Self {
        self.discriminant = Some(discriminant);
        self
    }

    /// Adds a derived-field rule.
    #[must_use]
    pub fn with_derived(mut self, rule: DerivedRule) -> Self {
        self.derived.push(rule);
        self
    }

    /// Returns the entity this form edits.
    #[must_use]
    pub fn entity(&self) -> EntityKind {
        self.entity
    }

    /// Returns the fields shown regardless of branch.
    #[must_use]
    pub fn base_fields(&self) -> &[FieldDefinition] {
        &self.fields
    }

    /// Returns the discriminated section, if any.
    #[must_use]
    pub fn discriminant(&self) -> Option<&DiscriminantDefinition> {
        self.discriminant.as_ref()
    }

    /// Returns the derived-field rules.
    #[must_use]
    pub fn derived_rules(&self) -> &[DerivedRule] {
        &self.derived
    }

    /// Returns every field, including all branches.
    pub fn all_fields(&self) -> impl Iterator<Item = &FieldDefinition> {
        self.fields.iter().chain(
            self.discriminant
                .iter()
                .flat_map(|discriminant| discriminant.branches.iter())
                .flat_map(|branch| branch.fields.iter()),
        )
    }

    /// Returns the base fields plus the fields of the active branch only.
    pub fn active_fields<'a>(
        &'a self,
        active_branch: Option<&'a str>,
    ) -> impl Iterator<Item = &'a FieldDefinition> {
        let branch_fields = self
            .discriminant
            .as_ref()
            .zip(active_branch)
            .and_then(|(discriminant, key)| discriminant.branch(key))
            .map(|branch| branch.fields.as_slice())
            .unwrap_or_default();

        self.fields.iter().chain(branch_fields.iter())
    }

    /// Returns the definition of the field at `path`.
    #[must_use]
    pub fn field(&self, path: &str) -> Option<&FieldDefinition> {
        self.all_fields().find(|field| field.path == path)
    }

    /// Returns whether `path` is the discriminant field.
    #[must_use]
    pub fn is_discriminant(&self, path: &str) -> bool {
        self.discriminant
            .as_ref()
            .is_some_and(|discriminant| discriminant.field == path)
    }

    /// Returns the starting values of a create form.
    #[must_use]
    pub fn defaults(&self) -> BTreeMap<String, FieldValue> {
        self.all_fields()
            .map(|field| (field.path.clone(), field.default_value.clone()))
            .collect()
    }

    /// Computes derived field values from the current fields.
    ///
    /// Returns only values that differ from what `fields` already holds.
    #[must_use]
    pub fn derive(
        &self,
        fields: &BTreeMap<String, FieldValue>,
        today: NaiveDate,
    ) -> Vec<(String, FieldValue)> {
        let mut updates = Vec::new();
        for rule in &self.derived {
            match rule {
                DerivedRule::AgeFromDate { source, target } => {
                    let age = fields
                        .get(source)
                        .and_then(FieldValue::as_date)
                        .and_then(|birth| whole_years_between(birth.date_naive(), today));
                    if let Some(age) = age {
                        updates.push((target.clone(), FieldValue::Number(Number::from(age))));
                    }
                }
                DerivedRule::BranchFromPresence { candidates } => {
                    let Some(discriminant) = &self.discriminant else {
                        continue;
                    };
                    let unset = fields
                        .get(&discriminant.field)
                        .is_none_or(FieldValue::is_blank);
                    if !unset {
                        continue;
                    }

                    let mut filled = candidates.iter().filter(|(path, _)| {
                        fields.get(path).is_some_and(|value| !value.is_blank())
                    });
                    if let (Some((_, key)), None) = (filled.next(), filled.next()) {
                        updates.push((discriminant.field.clone(), FieldValue::Text(key.clone())));
                    }
                }
            }
        }

        updates.retain(|(path, value)| fields.get(path) != Some(value));
        updates
    }
}

fn whole_years_between(birth: NaiveDate, today: NaiveDate) -> Option<u32> {
    if birth > today {
        return None;
    }

    let mut years = today.year() - birth.year();
    if (today.month(), today.day()) < (birth.month(), birth.day()) {
        years -= 1;
    }

    u32::try_from(years).ok()
}

fn kind_name(kind: &FieldKind) -> &'static str {
    match kind {
        FieldKind::Text => "text",
        FieldKind::Number => "number",
        FieldKind::Boolean => "boolean",
        FieldKind::Date => "date",
        FieldKind::Choice(_) => "choice",
        FieldKind::Reference => "reference",
        FieldKind::Object => "object",
        FieldKind::List => "list",
        FieldKind::File => "file",
    }
}

fn parse_number(value: &str) -> Option<Number> {
    value
        .parse::<i64>()
        .ok()
        .map(Number::from)
        .or_else(|| value.parse::<f64>().ok().and_then(Number::from_f64))
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "y" | "1" => Some(true),
        "false" | "no" | "n" | "0" => Some(false),
        _ => None,
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}
