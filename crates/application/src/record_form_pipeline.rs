use std::sync::Arc;

use tracing::{info, warn};

use frontdesk_core::{AppResult, RecordId};
use frontdesk_domain::{
    ActiveBranch, EntityKind, FieldValue, FormDraft, FormMode, FormSchema, SubmissionPayload,
};

use crate::{Clock, RemoteCollectionGateway};

mod outcome;


pub use outcome::SubmissionOutcome;

/// Create-or-edit lifecycle of one record form.
pub struct RecordFormPipeline {
    gateway: Arc<dyn RemoteCollectionGateway>,
    clock: Arc<dyn Clock>,
    schema: FormSchema,
    draft: FormDraft,
}

impl RecordFormPipeline {
    /// Creates a create-mode pipeline with the entity's form and defaults.
    #[must_use]
    pub fn new(gateway: Arc<dyn RemoteCollectionGateway>, clock: Arc<dyn Clock>) -> Self {
        let schema = FormSchema::for_entity(gateway.entity());
        let draft = FormDraft::new(&schema);
        Self {
            gateway,
            clock,
            schema,
            draft,
        }
    }

    /// Returns the edited entity.
    #[must_use]
    pub fn entity(&self) -> EntityKind {
        self.schema.entity()
    }

    /// Returns the form layout.
    #[must_use]
    pub fn schema(&self) -> &FormSchema {
        &self.schema
    }

    /// Returns the current draft.
    #[must_use]
    pub fn draft(&self) -> &FormDraft {
        &self.draft
    }

    /// Returns the active discriminated section.
    #[must_use]
    pub fn active_branch(&self) -> Option<ActiveBranch<'_>> {
        self.draft.active_branch(&self.schema)
    }

    /// Loads a record and switches to edit mode.
    ///
    /// On failure the draft is left as it was.
    pub async fn load_for_edit(&mut self, record_id: &RecordId) -> AppResult<()> {
        let record = self.gateway.get_by_id(record_id).await?;
        self.draft = FormDraft::from_record(&self.schema, &record);
        Ok(())
    }

    /// Updates one field and recomputes derived fields.
    pub fn set_field(&mut self, path: &str, value: FieldValue) -> AppResult<()> {
        self.draft.set(&self.schema, path, value)?;
        self.compute_derived();
        Ok(())
    }

    /// Returns the derived values the current fields imply.
    #[must_use]
    pub fn derived_fields(&self) -> Vec<(String, FieldValue)> {
        self.schema.derive(self.draft.fields(), self.clock.today())
    }

    /// Applies derived values to the draft and returns the updated paths.
    pub fn compute_derived(&mut self) -> Vec<String> {
        self.derived_fields()
            .into_iter()
            .filter_map(|(path, value)| {
                self.draft
                    .set(&self.schema, path.as_str(), value)
                    .ok()
                    .map(|()| path)
            })
            .collect()
    }

    /// Validates, serializes and sends the draft.
    ///
    /// Only the base section and the active branch are checked and sent. The
    /// draft is untouched by failures; on success it is rebased on the stored
    /// record.
    pub async fn submit(&mut self) -> SubmissionOutcome {
        let errors = self.draft.validate(&self.schema);
        if !errors.is_empty() {
            return SubmissionOutcome::ValidationFailure(errors);
        }

        let payload = SubmissionPayload::from_draft(&self.schema, &self.draft);
        let entity = self.entity();
        let result = match self.draft.mode() {
            FormMode::Create => self.gateway.create(payload).await,
            FormMode::Edit { target_id } => self.gateway.update(target_id, payload).await,
        };

        match result {
            Ok(record) => {
                info!(entity = %entity, record_id = %record.id(), "record saved");
                self.draft = FormDraft::from_record(&self.schema, &record);
                SubmissionOutcome::Success(record)
            }
            Err(error) => {
                warn!(entity = %entity, error = %error, "record submission failed");
                SubmissionOutcome::from(error)
            }
        }
    }
}
