use frontdesk_core::RecordId;
use frontdesk_domain::EntityKind;

/// A delete awaiting explicit confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRemoval {
    entity: EntityKind,
    record_id: RecordId,
    label: String,
}

impl PendingRemoval {
    /// Creates a pending delete of one record.
    #[must_use]
    pub fn new(entity: EntityKind, record_id: RecordId, label: impl Into<String>) -> Self {
        Self {
            entity,
            record_id,
            label: label.into(),
        }
    }

    /// Returns the record to delete.
    #[must_use]
    pub fn record_id(&self) -> &RecordId {
        &self.record_id
    }

    /// Returns the confirmation question shown to the operator.
    #[must_use]
    pub fn prompt(&self) -> String {
        format!(
            "Delete {} '{}'? This cannot be undone.",
            self.entity.display_name(),
            self.label
        )
    }

    /// Confirms the delete.
    #[must_use]
    pub fn confirm(self) -> ConfirmedRemoval {
        ConfirmedRemoval {
            record_id: self.record_id,
        }
    }
}

/// A delete the operator has confirmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmedRemoval {
    record_id: RecordId,
}

impl ConfirmedRemoval {
    /// Returns the record to delete.
    #[must_use]
    pub fn record_id(&self) -> &RecordId {
        &self.record_id
    }
}
