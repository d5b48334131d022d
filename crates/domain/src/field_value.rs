use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use frontdesk_core::{AppError, AppResult};
use serde_json::{Map, Number, Value};

/// Timestamp layout dates are sent to the backend in.
pub const WIRE_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// An attached binary file awaiting upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHandle {
    file_name: String,
    content_type: String,
    bytes: Vec<u8>,
}

impl FileHandle {
    /// Creates a file handle.
    #[must_use]
    pub fn new(file_name: impl Into<String>, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    /// Returns the original file name.
    #[must_use]
    pub fn file_name(&self) -> &str {
        self.file_name.as_str()
    }

    /// Returns the MIME type.
    #[must_use]
    pub fn content_type(&self) -> &str {
        self.content_type.as_str()
    }

    /// Returns the file contents.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        self.bytes.as_slice()
    }
}

/// Value held by one form field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// No value entered.
    Empty,
    /// Free text or a selected option.
    Text(String),
    /// Numeric value.
    Number(Number),
    /// Checkbox value.
    Bool(bool),
    /// Calendar timestamp.
    Date(DateTime<Utc>),
    /// Structured object such as a weekly availability map.
    Object(Map<String, Value>),
    /// Ordered list such as education entries.
    List(Vec<Value>),
    /// Binary attachment.
    File(FileHandle),
}

impl FieldValue {
    /// Returns whether the value counts as absent for required checks and omission.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(value) => value.trim().is_empty(),
            Self::Number(_) | Self::Bool(_) | Self::Date(_) | Self::File(_) => false,
            Self::Object(value) => value.is_empty(),
            Self::List(value) => value.is_empty(),
        }
    }

    /// Returns the text content of a `Text` value.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value.as_str()),
            _ => None,
        }
    }

    /// Returns the timestamp of a `Date` value.
    #[must_use]
    pub fn as_date(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Date(value) => Some(*value),
            _ => None,
        }
    }

    /// Converts the value into its JSON wire form. Files have no JSON form.
    #[must_use]
    pub fn to_wire(&self) -> Option<Value> {
        match self {
            Self::Empty => Some(Value::Null),
            Self::Text(value) => Some(Value::String(value.clone())),
            Self::Number(value) => Some(Value::Number(value.clone())),
            Self::Bool(value) => Some(Value::Bool(*value)),
            Self::Date(value) => Some(Value::String(format_wire_date(value))),
            Self::Object(value) => Some(Value::Object(value.clone())),
            Self::List(value) => Some(Value::Array(value.clone())),
            Self::File(_) => None,
        }
    }

    /// Builds a field value from a JSON value read off a record.
    #[must_use]
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => Self::Empty,
            Value::Bool(value) => Self::Bool(*value),
            Value::Number(value) => Self::Number(value.clone()),
            Value::String(value) => Self::Text(value.clone()),
            Value::Array(value) => Self::List(value.clone()),
            Value::Object(value) => Self::Object(value.clone()),
        }
    }
}

/// Formats a timestamp as the backend expects it.
#[must_use]
pub fn format_wire_date(value: &DateTime<Utc>) -> String {
    value.format(WIRE_DATE_FORMAT).to_string()
}

/// Parses a wire timestamp or a plain `YYYY-MM-DD` date at midnight UTC.
pub fn parse_date(value: &str) -> AppResult<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Ok(parsed.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map(|date| date.and_time(NaiveTime::MIN).and_utc())
        .map_err(|_| AppError::Validation(format!("'{value}' is not a valid date")))
}
