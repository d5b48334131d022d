use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::{AppError, AppResult};

/// Role claimed by the signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum UserRole {
    /// Full administrative access, the only role allowed to mutate most masters.
    Admin,
    /// Billing staff, allowed to maintain charge codes.
    Accountant,
    /// Treating physician.
    Doctor,
    /// Front-desk staff member.
    Recipient,
    /// Any role the backend issues that this client does not know.
    Other(String),
}

impl UserRole {
    /// Returns the stable transport value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Admin => "admin",
            Self::Accountant => "accountant",
            Self::Doctor => "doctor",
            Self::Recipient => "recipient",
            Self::Other(value) => value.as_str(),
        }
    }
}

impl From<String> for UserRole {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "admin" => Self::Admin,
            "accountant" => Self::Accountant,
            "doctor" => Self::Doctor,
            "recipient" | "receptionist" => Self::Recipient,
            _ => Self::Other(value),
        }
    }
}

impl From<UserRole> for String {
    fn from(value: UserRole) -> Self {
        value.as_str().to_owned()
    }
}

impl Display for UserRole {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Profile of the signed-in user as returned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    id: String,
    name: String,
    email: Option<String>,
    role: UserRole,
}

impl SessionUser {
    /// Creates a session user profile.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        email: Option<String>,
        role: UserRole,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            email,
            role,
        }
    }

    /// Returns the backend user identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        self.id.as_str()
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the email, if the backend returned one.
    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    /// Returns the role claim.
    #[must_use]
    pub fn role(&self) -> &UserRole {
        &self.role
    }
}

/// Read-only authentication state injected into gateways.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionContext {
    token: Option<String>,
    user: Option<SessionUser>,
}

impl SessionContext {
    /// Creates a session with no credential.
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Creates a session from a bearer token and the resolved user profile.
    #[must_use]
    pub fn authenticated(token: impl Into<String>, user: Option<SessionUser>) -> Self {
        let token = token.into();
        Self {
            token: (!token.trim().is_empty()).then_some(token),
            user,
        }
    }

    /// Returns the bearer token to attach to authenticated requests.
    #[must_use]
    pub fn bearer_token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Returns the signed-in user profile.
    #[must_use]
    pub fn user(&self) -> Option<&SessionUser> {
        self.user.as_ref()
    }

    /// Returns the role of the signed-in user.
    #[must_use]
    pub fn role(&self) -> Option<&UserRole> {
        self.user.as_ref().map(SessionUser::role)
    }

    /// Returns whether the signed-in user is an administrator.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role() == Some(&UserRole::Admin)
    }

    /// Fails with `PermissionDenied` unless the user holds one of `allowed`.
    pub fn require_any_role(&self, allowed: &[UserRole], action: &str) -> AppResult<()> {
        match self.role() {
            Some(role) if allowed.contains(role) => Ok(()),
            _ => {
                let allowed = allowed
                    .iter()
                    .map(UserRole::as_str)
                    .collect::<Vec<_>>()
                    .join("/");
                Err(AppError::PermissionDenied(format!(
                    "{action} requires role {allowed}"
                )))
            }
        }
    }
}
