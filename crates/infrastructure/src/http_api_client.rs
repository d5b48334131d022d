use std::sync::Arc;
use std::time::Duration;

use reqwest::multipart::{Form, Part};
use reqwest::{Method, RequestBuilder};
use serde_json::Value;
use tracing::debug;
use url::Url;

use frontdesk_core::{AppError, AppResult, SessionContext};
use frontdesk_domain::{BodyEncoding, PayloadValue, SubmissionPayload};

use crate::error_mapping::{ensure_accepted, map_error_response};

/// Shared reqwest client bound to one backend and one session.
#[derive(Debug, Clone)]
pub struct HttpApiClient {
    http_client: reqwest::Client,
    base_url: Url,
    session: Arc<SessionContext>,
}

/// Which bearer token a request carries.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Credential<'a> {
    /// The injected session token, if any.
    Session,
    /// An explicit token, used before a session exists.
    Token(&'a str),
    /// No `Authorization` header.
    Anonymous,
}

/// Request body of a backend call.
pub(crate) enum RequestBody {
    Empty,
    Json(Value),
    Multipart(Form),
}

impl RequestBody {
    /// Encodes a submission the way the collection expects it.
    ///
    /// JSON collections switch to multipart when a file is attached.
    pub(crate) fn for_payload(encoding: BodyEncoding, payload: &SubmissionPayload) -> AppResult<Self> {
        if encoding == BodyEncoding::Json && !payload.has_files() {
            return Ok(Self::Json(payload.to_json()));
        }

        let mut form = Form::new();
        for (name, value) in text_parts(payload) {
            form = form.text(name, value);
        }
        for (name, value) in payload.entries() {
            if let PayloadValue::File(file) = value {
                let part = Part::bytes(file.bytes().to_vec())
                    .file_name(file.file_name().to_owned())
                    .mime_str(file.content_type())
                    .map_err(|error| {
                        AppError::Validation(format!(
                            "invalid content type '{}' for {name}: {error}",
                            file.content_type()
                        ))
                    })?;
                form = form.part(name.clone(), part);
            }
        }

        Ok(Self::Multipart(form))
    }
}

/// Returns the text parts of a multipart submission.
///
/// Objects and arrays are sent as JSON text, null as an empty string.
pub(crate) fn text_parts(payload: &SubmissionPayload) -> Vec<(String, String)> {
    payload
        .entries()
        .iter()
        .filter_map(|(name, value)| {
            let text = match value {
                PayloadValue::Scalar(Value::Null) => String::new(),
                PayloadValue::Scalar(Value::String(text)) => text.clone(),
                PayloadValue::Scalar(other) | PayloadValue::Nested(other) => other.to_string(),
                PayloadValue::File(_) => return None,
            };
            Some((name.clone(), text))
        })
        .collect()
}

impl HttpApiClient {
    /// Creates a client for the backend at `base_url`.
    pub fn new(base_url: &str, timeout: Duration, session: SessionContext) -> AppResult<Self> {
        let mut base_url = Url::parse(base_url.trim()).map_err(|error| {
            AppError::Validation(format!("invalid backend url '{base_url}': {error}"))
        })?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(path.as_str());
        }

        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|error| AppError::Internal(format!("failed to build http client: {error}")))?;

        Ok(Self {
            http_client,
            base_url,
            session: Arc::new(session),
        })
    }

    /// Returns the session attached to requests.
    #[must_use]
    pub fn session(&self) -> &SessionContext {
        self.session.as_ref()
    }

    /// Returns a client sharing the connection pool with another session.
    #[must_use]
    pub fn with_session(&self, session: SessionContext) -> Self {
        Self {
            http_client: self.http_client.clone(),
            base_url: self.base_url.clone(),
            session: Arc::new(session),
        }
    }

    /// Resolves a relative backend path and appends query parameters.
    pub(crate) fn endpoint(&self, path: &str, params: &[(String, String)]) -> AppResult<Url> {
        let mut url = self
            .base_url
            .join(path.trim_start_matches('/'))
            .map_err(|error| AppError::Internal(format!("invalid endpoint '{path}': {error}")))?;
        if !params.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(params.iter().map(|(key, value)| (key.as_str(), value.as_str())));
        }

        Ok(url)
    }

    pub(crate) fn prepare(
        &self,
        method: Method,
        url: Url,
        credential: Credential<'_>,
        body: RequestBody,
    ) -> RequestBuilder {
        let mut builder = self.http_client.request(method, url);

        let token = match credential {
            Credential::Session => self.session.bearer_token(),
            Credential::Token(token) => Some(token),
            Credential::Anonymous => None,
        };
        if let Some(token) = token {
            builder = builder.bearer_auth(token);
        }

        match body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(&value),
            RequestBody::Multipart(form) => builder.multipart(form),
        }
    }

    /// Sends one request and returns the decoded JSON body.
    pub(crate) async fn execute(
        &self,
        method: Method,
        url: Url,
        credential: Credential<'_>,
        body: RequestBody,
    ) -> AppResult<Value> {
        debug!(method = %method, url = %url, "sending backend request");
        let response = self
            .prepare(method, url, credential, body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        let text = response.text().await.map_err(transport_error)?;
        let body = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or(Value::String(text))
        };

        if !status.is_success() {
            debug!(status = %status, "backend rejected request");
            return Err(map_error_response(status, &body));
        }
        ensure_accepted(&body)?;

        Ok(body)
    }
}

fn transport_error(error: reqwest::Error) -> AppError {
    if error.is_timeout() {
        AppError::Transport("request timed out".to_owned())
    } else if error.is_connect() {
        AppError::Transport(format!("cannot reach backend: {error}"))
    } else {
        AppError::Transport(format!("request failed: {error}"))
    }
}
