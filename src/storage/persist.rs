//! Persistence of layer artifacts
//!
//! Every relation is written to `<base>/<Layer>/<relation>.parquet` in the
//! target bucket. A failed upload never stops the run: the relation is written
//! to a local fallback copy instead and the outcome is recorded.

use std::path::PathBuf;
use std::sync::Arc;

use arrow::record_batch::RecordBatch;
use serde::Serialize;

use crate::error::util::ensure_directory;
use crate::error::{Result, WarehouseError};
use crate::schema::{RelationName, validate_identifier};
use crate::storage::{ObjectLocation, ObjectStore};
use crate::utils::io::write_parquet;
use crate::utils::logging::log_warning;

/// Where layer artifacts go
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactLayout {
    pub bucket: String,
    pub base: String,
    /// Directory holding local copies
    pub local_dir: PathBuf,
}

impl ArtifactLayout {
    /// # Errors
    /// Returns a naming error if `base` is not a safe identifier
    pub fn new(
        bucket: impl Into<String>,
        base: impl Into<String>,
        local_dir: impl Into<PathBuf>,
    ) -> Result<Self> {
        let base = base.into();
        validate_identifier(&base)?;
        Ok(Self {
            bucket: bucket.into(),
            base,
            local_dir: local_dir.into(),
        })
    }

    fn file_name(relation: RelationName) -> Result<String> {
        Ok(format!("{}.parquet", validate_identifier(relation.as_str())?))
    }

    /// Destination of a relation in the target bucket
    ///
    /// # Errors
    /// Returns a naming error if the relation name is not a safe identifier
    pub fn destination(&self, relation: RelationName) -> Result<ObjectLocation> {
        Ok(ObjectLocation::new(&self.bucket, self.base.as_str())
            .join(relation.layer().prefix())
            .join(&Self::file_name(relation)?))
    }

    /// Path of the local copy of a relation
    ///
    /// # Errors
    /// Returns a naming error if the relation name is not a safe identifier
    pub fn local_path(&self, relation: RelationName) -> Result<PathBuf> {
        Ok(self
            .local_dir
            .join(relation.layer().prefix())
            .join(Self::file_name(relation)?))
    }
}

/// Result of persisting one relation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PersistStatus {
    /// Written to the object store
    Uploaded,
    /// Written only to a local copy (upload disabled or failed)
    KeptLocally,
    /// Neither the upload nor the local copy succeeded
    Failed,
}

/// What happened to one relation's artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PersistOutcome {
    pub relation: String,
    pub layer: String,
    pub rows: usize,
    pub destination: String,
    pub status: PersistStatus,
    pub local_copy: Option<PathBuf>,
    pub error: Option<String>,
}

/// Writes layer artifacts to an object store with a local fallback
#[derive(Debug, Clone)]
pub struct Persister {
    store: Arc<dyn ObjectStore>,
    layout: ArtifactLayout,
    upload: bool,
}

impl Persister {
    #[must_use]
    pub fn new(store: Arc<dyn ObjectStore>, layout: ArtifactLayout, upload: bool) -> Self {
        Self {
            store,
            layout,
            upload,
        }
    }

    #[must_use]
    pub const fn layout(&self) -> &ArtifactLayout {
        &self.layout
    }

    /// Persist one relation
    ///
    /// Failures are logged and reflected in the returned outcome, never raised.
    #[must_use]
    pub fn persist(&self, relation: RelationName, batch: &RecordBatch) -> PersistOutcome {
        let mut outcome = PersistOutcome {
            relation: relation.to_string(),
            layer: relation.layer().to_string(),
            rows: batch.num_rows(),
            destination: String::new(),
            status: PersistStatus::Failed,
            local_copy: None,
            error: None,
        };

        let destination = match self.layout.destination(relation) {
            Ok(destination) => destination,
            Err(e) => {
                log::error!("Refusing to persist {relation}: {e}");
                outcome.error = Some(e.to_string());
                return outcome;
            }
        };
        outcome.destination = destination.to_string();

        if self.upload {
            match self.store.write(batch, &destination) {
                Ok(()) => {
                    log::info!("Uploaded {relation} ({} rows) to {destination}", batch.num_rows());
                    outcome.status = PersistStatus::Uploaded;
                    return outcome;
                }
                Err(e) => {
                    let err = WarehouseError::persistence(&destination, e);
                    log_warning("Upload failed, keeping a local copy", Some(&err));
                    outcome.error = Some(err.to_string());
                }
            }
        }

        match self.write_local(relation, batch) {
            Ok(path) => {
                log::info!("{relation} is saved locally at {}", path.display());
                outcome.status = PersistStatus::KeptLocally;
                outcome.local_copy = Some(path);
            }
            Err(e) => {
                log::error!("Could not keep a local copy of {relation}: {e}");
                let message = match outcome.error.take() {
                    Some(upload) => format!("{upload}; local copy failed: {e}"),
                    None => format!("local copy failed: {e}"),
                };
                outcome.error = Some(message);
            }
        }
        outcome
    }

    fn write_local(&self, relation: RelationName, batch: &RecordBatch) -> Result<PathBuf> {
        let path = self.layout.local_path(relation)?;
        if let Some(parent) = path.parent() {
            ensure_directory(parent)?;
        }
        write_parquet(&path, batch)?;
        Ok(path)
    }

    /// Persist several relations of one layer
    #[must_use]
    pub fn persist_all<'a>(
        &self,
        relations: impl IntoIterator<Item = (RelationName, &'a RecordBatch)>,
    ) -> Vec<PersistOutcome> {
        relations
            .into_iter()
            .map(|(relation, batch)| self.persist(relation, batch))
            .collect()
    }
}
