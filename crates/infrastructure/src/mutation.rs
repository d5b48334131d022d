use serde_json::Value;

use frontdesk_core::{AppResult, SessionContext};
use frontdesk_domain::{EntityKind, SubmissionPayload};

/// Kind of change a gateway is about to send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Mutation {
    Create,
    Update,
    Delete,
}

impl Mutation {
    fn verb(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }

    /// Fails with `PermissionDenied` before any request when the session role
    /// may not perform this change.
    pub(crate) fn authorize(self, session: &SessionContext, entity: EntityKind) -> AppResult<()> {
        let allowed = match self {
            Self::Create | Self::Update => entity.write_roles(),
            Self::Delete => entity.delete_roles(),
        };
        session.require_any_role(allowed, &format!("{} {}", self.verb(), entity.display_name()))
    }

    /// Adds the `createdBy` / `updatedBy` stamp for collections that carry one.
    pub(crate) fn stamp(self, session: &SessionContext, entity: EntityKind, payload: &mut SubmissionPayload) {
        let field = match self {
            Self::Create => "createdBy",
            Self::Update => "updatedBy",
            Self::Delete => return,
        };

        if entity.stamps_actor()
            && let Some(user) = session.user()
        {
            payload.insert_scalar(field, Value::String(user.id().to_owned()));
        }
    }
}
