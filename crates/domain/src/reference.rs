use std::fmt::{Display, Formatter};
use std::str::FromStr;

use frontdesk_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Option lists that feed select fields of the forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceCatalog {
    /// Doctor names for patient case assignment.
    DoctorNames,
    /// Hospital departments.
    Departments,
    /// Doctor specializations.
    Specializations,
    /// Academic degrees for doctor education entries.
    Degrees,
}

impl ReferenceCatalog {
    /// Returns every catalog.
    #[must_use]
    pub fn all() -> &'static [Self] {
        &[
            Self::DoctorNames,
            Self::Departments,
            Self::Specializations,
            Self::Degrees,
        ]
    }

    /// Returns the stable name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DoctorNames => "doctor_names",
            Self::Departments => "departments",
            Self::Specializations => "specializations",
            Self::Degrees => "degrees",
        }
    }

    /// Returns the backend path.
    #[must_use]
    pub fn path(&self) -> &'static str {
        match self {
            Self::DoctorNames => "api/doctors/names",
            Self::Departments => "api/departments",
            Self::Specializations => "api/specializations",
            Self::Degrees => "api/degrees",
        }
    }

    /// Returns the key the options are listed under.
    #[must_use]
    pub fn response_key(&self) -> &'static str {
        match self {
            Self::DoctorNames => "doctors",
            Self::Departments => "departments",
            Self::Specializations => "specializations",
            Self::Degrees => "degrees",
        }
    }
}

impl Display for ReferenceCatalog {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for ReferenceCatalog {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "doctor_names" | "doctors" => Ok(Self::DoctorNames),
            "departments" => Ok(Self::Departments),
            "specializations" => Ok(Self::Specializations),
            "degrees" => Ok(Self::Degrees),
            _ => Err(AppError::Validation(format!(
                "unknown reference catalog '{value}'"
            ))),
        }
    }
}

/// One selectable option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceOption {
    /// Value stored in the form field.
    pub id: String,
    /// Text shown to the operator.
    pub label: String,
}

/// Reads options from a catalog response.
///
/// Entries may be plain strings or objects with an `_id`/`id` and a
/// `name`/`label`/`title`.
pub fn parse_reference_options(catalog: ReferenceCatalog, body: &Value) -> AppResult<Vec<ReferenceOption>> {
    let entries = body
        .get(catalog.response_key())
        .or_else(|| body.get("data"))
        .and_then(Value::as_array)
        .or_else(|| body.as_array())
        .ok_or_else(|| {
            AppError::Transport(format!("unrecognized {catalog} response shape"))
        })?;

    Ok(entries.iter().filter_map(option_from_entry).collect())
}

fn option_from_entry(entry: &Value) -> Option<ReferenceOption> {
    match entry {
        Value::String(text) if !text.trim().is_empty() => Some(ReferenceOption {
            id: text.clone(),
            label: text.clone(),
        }),
        Value::Object(object) => {
            let text_at = |keys: &[&str]| {
                keys.iter().find_map(|key| match object.get(*key)? {
                    Value::String(text) => Some(text.clone()),
                    Value::Number(number) => Some(number.to_string()),
                    _ => None,
                })
            };
            let label = text_at(&["name", "label", "title"]);
            let id = text_at(&["_id", "id"]).or_else(|| label.clone())?;
            Some(ReferenceOption {
                label: label.unwrap_or_else(|| id.clone()),
                id,
            })
        }
        _ => None,
    }
}
