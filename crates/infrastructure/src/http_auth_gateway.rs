use async_trait::async_trait;
use reqwest::Method;
use serde_json::{Value, json};

use frontdesk_application::{AuthGateway, IssuedToken, LoginCredentials};
use frontdesk_core::{AppError, AppResult, SessionUser, UserRole};

use crate::error_mapping::message_of;
use crate::http_api_client::{Credential, HttpApiClient, RequestBody};

const LOGIN_PATH: &str = "api/auth/login";
const LOGOUT_PATH: &str = "api/auth/logout";
const PROFILE_PATH: &str = "api/auth/me";
const FORGOT_PASSWORD_PATH: &str = "api/auth/forgot-password";
const RESET_PASSWORD_PATH: &str = "api/auth/reset-password";

/// Authentication endpoints over HTTP.
#[derive(Debug, Clone)]
pub struct HttpAuthGateway {
    client: HttpApiClient,
}

impl HttpAuthGateway {
    /// Creates an auth gateway.
    #[must_use]
    pub fn new(client: HttpApiClient) -> Self {
        Self { client }
    }

    async fn post(&self, path: &str, credential: Credential<'_>, body: Value) -> AppResult<Value> {
        let url = self.client.endpoint(path, &[])?;
        self.client
            .execute(Method::POST, url, credential, RequestBody::Json(body))
            .await
    }
}

#[async_trait]
impl AuthGateway for HttpAuthGateway {
    async fn login(&self, credentials: &LoginCredentials) -> AppResult<IssuedToken> {
        let body = self
            .post(
                LOGIN_PATH,
                Credential::Anonymous,
                json!({ "email": credentials.email, "password": credentials.password }),
            )
            .await?;

        issued_token(&body)
    }

    async fn logout(&self, token: &str) -> AppResult<()> {
        self.post(LOGOUT_PATH, Credential::Token(token), json!({}))
            .await
            .map(|_| ())
    }

    async fn current_user(&self, token: &str) -> AppResult<SessionUser> {
        let url = self.client.endpoint(PROFILE_PATH, &[])?;
        let body = self
            .client
            .execute(Method::GET, url, Credential::Token(token), RequestBody::Empty)
            .await?;

        session_user(body.get("user").unwrap_or(&body))
            .ok_or_else(|| AppError::Transport("profile response has no user".to_owned()))
    }

    async fn forgot_password(&self, email: &str) -> AppResult<String> {
        let body = self
            .post(FORGOT_PASSWORD_PATH, Credential::Anonymous, json!({ "email": email }))
            .await?;

        Ok(message_of(&body).unwrap_or_else(|| "reset link sent".to_owned()))
    }

    async fn reset_password(&self, reset_token: &str, password: &str) -> AppResult<String> {
        let body = self
            .post(
                RESET_PASSWORD_PATH,
                Credential::Anonymous,
                json!({ "token": reset_token, "password": password }),
            )
            .await?;

        Ok(message_of(&body).unwrap_or_else(|| "password reset".to_owned()))
    }
}

fn issued_token(body: &Value) -> AppResult<IssuedToken> {
    let token = ["token", "accessToken"]
        .iter()
        .find_map(|key| body.get(*key).and_then(Value::as_str))
        .filter(|token| !token.trim().is_empty())
        .ok_or_else(|| {
            AppError::PermissionDenied(message_of(body).unwrap_or_else(|| "login failed".to_owned()))
        })?;

    Ok(IssuedToken {
        token: token.to_owned(),
        user: body.get("user").and_then(session_user),
    })
}

fn session_user(value: &Value) -> Option<SessionUser> {
    let object = value.as_object()?;
    let text = |key: &str| {
        object
            .get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(str::to_owned)
    };

    let id = text("_id").or_else(|| text("id"))?;
    let email = text("email");
    let name = text("name")
        .or_else(|| {
            let full = [text("firstName"), text("lastName")]
                .into_iter()
                .flatten()
                .collect::<Vec<_>>()
                .join(" ");
            (!full.is_empty()).then_some(full)
        })
        .or_else(|| email.clone())
        .unwrap_or_else(|| id.clone());
    let role = UserRole::from(text("role").unwrap_or_default());

    Some(SessionUser::new(id, name, email, role))
}
