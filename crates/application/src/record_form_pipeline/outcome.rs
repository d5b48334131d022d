use frontdesk_core::{AppError, AppResult, FieldError};
use frontdesk_domain::Record;

/// Result of submitting a form. Every failure is reported, never dropped.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionOutcome {
    /// The backend stored the record.
    Success(Record),
    /// Client-side checks failed; nothing was sent.
    ValidationFailure(Vec<FieldError>),
    /// The backend rejected the values.
    ServerValidationFailure(Vec<FieldError>),
    /// The session role may not perform the mutation.
    PermissionDenied(String),
    /// Network failure, timeout, or an unexpected server response.
    TransportFailure(AppError),
}

impl SubmissionOutcome {
    /// Returns whether the record was stored.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Returns the stored record on success.
    #[must_use]
    pub fn record(&self) -> Option<&Record> {
        match self {
            Self::Success(record) => Some(record),
            _ => None,
        }
    }

    /// Returns the field errors of a client or server validation failure.
    #[must_use]
    pub fn field_errors(&self) -> &[FieldError] {
        match self {
            Self::ValidationFailure(errors) | Self::ServerValidationFailure(errors) => errors,
            _ => &[],
        }
    }

    /// Returns a one-line message for toast-style feedback.
    #[must_use]
    pub fn summary(&self) -> String {
        match self {
            Self::Success(record) => format!("{} '{}' saved", record.entity().display_name(), record.label()),
            Self::ValidationFailure(errors) => format!(
                "please fix {} field{}",
                errors.len(),
                if errors.len() == 1 { "" } else { "s" }
            ),
            Self::ServerValidationFailure(errors) => errors
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; "),
            Self::PermissionDenied(message) => message.clone(),
            Self::TransportFailure(error) => error.to_string(),
        }
    }

    /// Converts the outcome into a result, keeping server field errors intact.
    pub fn into_result(self) -> AppResult<Record> {
        match self {
            Self::Success(record) => Ok(record),
            Self::ValidationFailure(errors) => Err(AppError::Validation(
                errors
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("; "),
            )),
            Self::ServerValidationFailure(errors) => Err(AppError::ServerValidation(errors)),
            Self::PermissionDenied(message) => Err(AppError::PermissionDenied(message)),
            Self::TransportFailure(error) => Err(error),
        }
    }
}

impl From<AppError> for SubmissionOutcome {
    fn from(error: AppError) -> Self {
        match error {
            AppError::Validation(message) => {
                Self::ValidationFailure(vec![FieldError::summary(message)])
            }
            AppError::ServerValidation(errors) => Self::ServerValidationFailure(errors),
            AppError::PermissionDenied(message) => Self::PermissionDenied(message),
            other => Self::TransportFailure(other),
        }
    }
}
