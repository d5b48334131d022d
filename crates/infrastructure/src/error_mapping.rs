use reqwest::StatusCode;
use serde_json::Value;

use frontdesk_core::{AppError, AppResult, FieldError};

/// Maps a non-success response to an application error.
///
/// 400, 409 and 422 carry validation messages, 401 and 403 are permission
/// denials, 404 is not-found, anything else is a transport failure.
#[must_use]
pub fn map_error_response(status: StatusCode, body: &Value) -> AppError {
    match status.as_u16() {
        400 | 409 | 422 => {
            let mut errors = field_errors(body);
            if errors.is_empty() {
                errors.push(FieldError::summary(
                    message_of(body).unwrap_or_else(|| format!("request rejected with status {status}")),
                ));
            }
            AppError::ServerValidation(errors)
        }
        401 | 403 => AppError::PermissionDenied(
            message_of(body).unwrap_or_else(|| "not authorized".to_owned()),
        ),
        404 => AppError::NotFound(message_of(body).unwrap_or_else(|| "record not found".to_owned())),
        code if code >= 500 => AppError::Transport(match message_of(body) {
            Some(message) => format!("server error {status}: {message}"),
            None => format!("server error {status}"),
        }),
        _ => AppError::Transport(format!("unexpected response status {status}")),
    }
}

/// Rejects 2xx bodies that still report a failure.
pub(crate) fn ensure_accepted(body: &Value) -> AppResult<()> {
    let refused = body.get("success").and_then(Value::as_bool) == Some(false);
    let errors = field_errors(body);
    if !refused && errors.is_empty() {
        return Ok(());
    }

    if errors.is_empty() {
        return Err(AppError::ServerValidation(vec![FieldError::summary(
            message_of(body).unwrap_or_else(|| "request was not accepted".to_owned()),
        )]));
    }

    Err(AppError::ServerValidation(errors))
}

/// Returns the human-readable message of a response body.
pub(crate) fn message_of(body: &Value) -> Option<String> {
    match body {
        Value::String(message) if !message.trim().is_empty() => Some(message.clone()),
        Value::Array(entries) => entries.first().and_then(message_of),
        Value::Object(object) => ["message", "detail", "error"]
            .iter()
            .find_map(|key| object.get(*key).and_then(message_of)),
        _ => None,
    }
}

fn field_errors(body: &Value) -> Vec<FieldError> {
    let mut errors = body
        .get("details")
        .and_then(Value::as_array)
        .map(|details| details.iter().filter_map(detail_error).collect::<Vec<_>>())
        .unwrap_or_default();

    if let Some(keyed) = body.get("errors").and_then(Value::as_object) {
        errors.extend(keyed.iter().filter_map(|(path, entry)| {
            message_of(entry).map(|message| FieldError::at(path.as_str(), message))
        }));
    }

    errors
}

fn detail_error(detail: &Value) -> Option<FieldError> {
    match detail {
        Value::String(message) => Some(match quoted_path(message) {
            Some(path) => FieldError::at(path, message.as_str()),
            None => FieldError::summary(message.as_str()),
        }),
        Value::Object(object) => {
            let message = ["message", "msg"]
                .iter()
                .find_map(|key| object.get(*key).and_then(Value::as_str))?;
            let path = ["path", "field", "param"]
                .iter()
                .find_map(|key| object.get(*key).and_then(path_text))
                .or_else(|| quoted_path(message));
            Some(match path {
                Some(path) => FieldError::at(path, message),
                None => FieldError::summary(message),
            })
        }
        _ => None,
    }
}

fn path_text(value: &Value) -> Option<String> {
    match value {
        Value::String(path) if !path.is_empty() => Some(path.clone()),
        Value::Array(segments) if !segments.is_empty() => Some(
            segments
                .iter()
                .map(|segment| match segment {
                    Value::String(segment) => segment.clone(),
                    other => other.to_string(),
                })
                .collect::<Vec<_>>()
                .join("."),
        ),
        _ => None,
    }
}

// `"ipd.doctor" is required` names its field in leading quotes.
fn quoted_path(message: &str) -> Option<String> {
    let rest = message.strip_prefix('"')?;
    let (path, _) = rest.split_once('"')?;
    (!path.is_empty()).then(|| path.to_owned())
}

#[cfg(test)]
mod tests {
    use reqwest::StatusCode;
    use serde_json::json;

    use frontdesk_core::{AppError, FieldError};

    use super::{ensure_accepted, map_error_response};

    #[test]
    fn quoted_detail_strings_become_field_errors() {
        let body = json!({
            "message": "Validation failed",
            "details": ["\"ipd.doctor\" is required", "Ward must be selected"]
        });

        let error = map_error_response(StatusCode::UNPROCESSABLE_ENTITY, &body);

        assert_eq!(
            error,
            AppError::ServerValidation(vec![
                FieldError::at("ipd.doctor", "\"ipd.doctor\" is required"),
                FieldError::summary("Ward must be selected"),
            ])
        );
    }

    #[test]
    fn structured_details_and_keyed_errors_keep_paths() {
        let body = json!({
            "details": [{ "message": "must be unique", "path": ["code"] }],
            "errors": { "name": { "message": "Name is required" } }
        });

        let AppError::ServerValidation(errors) = map_error_response(StatusCode::CONFLICT, &body)
        else {
            unreachable!();
        };
        let paths = errors
            .iter()
            .map(|error| error.path.as_deref())
            .collect::<Vec<_>>();
        assert_eq!(paths, vec![Some("code"), Some("name")]);
    }

    #[test]
    fn bad_request_without_details_uses_message() {
        let error = map_error_response(StatusCode::BAD_REQUEST, &json!({ "message": "Invalid date" }));
        assert_eq!(
            error,
            AppError::ServerValidation(vec![FieldError::summary("Invalid date")])
        );
    }

    #[test]
    fn statuses_map_to_error_categories() {
        let body = json!({ "message": "nope" });
        assert!(matches!(
            map_error_response(StatusCode::UNAUTHORIZED, &body),
            AppError::PermissionDenied(_)
        ));
        assert!(matches!(
            map_error_response(StatusCode::FORBIDDEN, &json!(null)),
            AppError::PermissionDenied(message) if message == "not authorized"
        ));
        assert!(matches!(
            map_error_response(StatusCode::NOT_FOUND, &body),
            AppError::NotFound(_)
        ));
        assert!(matches!(
            map_error_response(StatusCode::BAD_GATEWAY, &body),
            AppError::Transport(message) if message.starts_with("server error")
        ));
    }

    #[test]
    fn successful_status_with_failure_flag_is_rejected() {
        assert!(ensure_accepted(&json!({ "success": true, "data": {} })).is_ok());
        assert_eq!(
            ensure_accepted(&json!({ "success": false, "message": "Duplicate phone" })),
            Err(AppError::ServerValidation(vec![FieldError::summary("Duplicate phone")]))
        );
        assert!(matches!(
            ensure_accepted(&json!({ "details": ["\"age\" must be a number"] })),
            Err(AppError::ServerValidation(errors)) if errors[0].path.as_deref() == Some("age")
        ));
    }
}
