use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde_json::Value;

use frontdesk_core::{AppError, AppResult};
use frontdesk_domain::{EntityKind, Record};

/// JSON array file per entity backing the offline gateway.
#[derive(Debug, Clone)]
pub struct RecordFile {
    path: PathBuf,
    entity: EntityKind,
}

impl RecordFile {
    pub fn new(data_dir: &Path, entity: EntityKind) -> Self {
        Self {
            path: data_dir.join(format!("{}.json", entity.as_str())),
            entity,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the stored records, oldest first. A missing file holds none.
    pub async fn load(&self) -> AppResult<Vec<Record>> {
        let contents = match tokio::fs::read(&self.path).await {
            Ok(contents) => contents,
            Err(error) if error.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(error) => return Err(self.io_error("read", &error)),
        };

        let values = serde_json::from_slice::<Vec<Value>>(&contents).map_err(|error| {
            AppError::Internal(format!(
                "'{}' is not a JSON array of records: {error}",
                self.path.display()
            ))
        })?;

        values
            .into_iter()
            .map(|value| Record::from_json(self.entity, value))
            .collect()
    }

    pub async fn save(&self, records: &[Record]) -> AppResult<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|error| self.io_error("create directory for", &error))?;
        }

        let values = records
            .iter()
            .map(|record| Value::Object(record.data().clone()))
            .collect::<Vec<_>>();
        let contents = serde_json::to_vec_pretty(&values).map_err(|error| {
            AppError::Internal(format!("failed to encode {} records: {error}", self.entity))
        })?;

        tokio::fs::write(&self.path, contents)
            .await
            .map_err(|error| self.io_error("write", &error))
    }

    fn io_error(&self, action: &str, error: &std::io::Error) -> AppError {
        AppError::Internal(format!(
            "failed to {action} '{}': {error}",
            self.path.display()
        ))
    }
}
