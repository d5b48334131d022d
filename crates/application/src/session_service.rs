//! Sign-in, sign-out and password recovery.

use std::sync::Arc;

use tracing::{info, warn};

use frontdesk_core::{AppError, AppResult, SessionContext};

use crate::{AuthGateway, LoginCredentials};


/// Resolves [`SessionContext`] values through the authentication endpoints.
///
/// The service holds no session itself; callers keep the returned context
/// and hand it to the collection gateways.
#[derive(Clone)]
pub struct SessionService {
    gateway: Arc<dyn AuthGateway>,
}

impl SessionService {
    /// Creates a session service.
    #[must_use]
    pub fn new(gateway: Arc<dyn AuthGateway>) -> Self {
        Self { gateway }
    }

    /// Exchanges credentials for an authenticated session.
    ///
    /// When the login response carries no profile, `/api/auth/me` is asked
    /// for one.
    pub async fn sign_in(&self, email: &str, password: &str) -> AppResult<SessionContext> {
        let email = require_email(email)?;
        if password.is_empty() {
            return Err(AppError::Validation("password is required".to_owned()));
        }

        let issued = self
            .gateway
            .login(&LoginCredentials {
                email: email.to_owned(),
                password: password.to_owned(),
            })
            .await?;

        let user = match issued.user {
            Some(user) => user,
            None => self.gateway.current_user(issued.token.as_str()).await?,
        };
        info!(user_id = %user.id(), role = %user.role(), "signed in");

        Ok(SessionContext::authenticated(issued.token, Some(user)))
    }

    /// Rebuilds a session from a stored bearer token.
    pub async fn resume(&self, token: &str) -> AppResult<SessionContext> {
        let token = token.trim();
        if token.is_empty() {
            return Ok(SessionContext::anonymous());
        }

        let user = self.gateway.current_user(token).await?;
        Ok(SessionContext::authenticated(token, Some(user)))
    }

    /// Ends a session. Backend failures are logged and ignored.
    pub async fn sign_out(&self, session: &SessionContext) -> SessionContext {
        if let Some(token) = session.bearer_token()
            && let Err(error) = self.gateway.logout(token).await
        {
            warn!(error = %error, "logout request failed");
        }

        SessionContext::anonymous()
    }

    /// Asks the backend to mail a reset link and returns its message.
    pub async fn request_password_reset(&self, email: &str) -> AppResult<String> {
        let email = require_email(email)?;
        self.gateway.forgot_password(email).await
    }

    /// Sets a new password from a reset link and returns the backend message.
    pub async fn reset_password(
        &self,
        reset_token: &str,
        password: &str,
        confirmation: &str,
    ) -> AppResult<String> {
        if reset_token.trim().is_empty() {
            return Err(AppError::Validation("reset token is required".to_owned()));
        }
        if password.is_empty() {
            return Err(AppError::Validation("password is required".to_owned()));
        }
        if password != confirmation {
            return Err(AppError::Validation("passwords do not match".to_owned()));
        }

        self.gateway.reset_password(reset_token.trim(), password).await
    }
}

fn require_email(email: &str) -> AppResult<&str> {
    let email = email.trim();
    if email.is_empty() {
        return Err(AppError::Validation("email is required".to_owned()));
    }
    if !email.contains('@') {
        return Err(AppError::Validation(format!(
            "'{email}' is not an email address"
        )));
    }

    Ok(email)
}
