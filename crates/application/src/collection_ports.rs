use async_trait::async_trait;

use frontdesk_core::{AppResult, RecordId, SessionUser};
use frontdesk_domain::{
    EntityKind, ListQuery, ListResult, Record, ReferenceCatalog, ReferenceOption,
    SubmissionPayload,
};

/// Remote CRUD boundary of one record collection.
#[async_trait]
pub trait RemoteCollectionGateway: Send + Sync {
    /// Returns the collection served by this gateway.
    fn entity(&self) -> EntityKind;

    /// Lists one page of records.
    async fn list(&self, query: &ListQuery) -> AppResult<ListResult>;

    /// Fetches one record, failing with `NotFound` when it does not exist.
    async fn get_by_id(&self, record_id: &RecordId) -> AppResult<Record>;

    /// Creates a record.
    async fn create(&self, payload: SubmissionPayload) -> AppResult<Record>;

    /// Updates a record.
    async fn update(&self, record_id: &RecordId, payload: SubmissionPayload) -> AppResult<Record>;

    /// Deletes a record.
    async fn delete(&self, record_id: &RecordId) -> AppResult<()>;
}

/// Email and password submitted at sign-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    /// Account email.
    pub email: String,
    /// Account password.
    pub password: String,
}

/// Bearer token and profile returned by a successful sign-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    /// Bearer token for later requests.
    pub token: String,
    /// Signed-in profile, when the backend returned one.
    pub user: Option<SessionUser>,
}

/// Authentication endpoints.
#[async_trait]
pub trait AuthGateway: Send + Sync {
    /// Exchanges credentials for a bearer token.
    async fn login(&self, credentials: &LoginCredentials) -> AppResult<IssuedToken>;

    /// Invalidates a bearer token on the backend.
    async fn logout(&self, token: &str) -> AppResult<()>;

    /// Returns the profile of the token's owner.
    async fn current_user(&self, token: &str) -> AppResult<SessionUser>;

    /// Requests a password reset link. Sent without credentials.
    async fn forgot_password(&self, email: &str) -> AppResult<String>;

    /// Sets a new password with a reset token. Sent without credentials.
    async fn reset_password(&self, reset_token: &str, password: &str) -> AppResult<String>;
}

/// Option lists for form select fields.
#[async_trait]
pub trait ReferenceDataGateway: Send + Sync {
    /// Lists the options of one catalog.
    async fn options(&self, catalog: ReferenceCatalog) -> AppResult<Vec<ReferenceOption>>;
}
