//! The in-process session shared by the stages of one run.
//!
//! A [`Session`] holds every relation registered during a run, keyed by
//! [`RelationName`]. Each stage writes only relations of its own [`Layer`];
//! raw data is created once and derived relations are replaced wholesale.

use std::collections::BTreeMap;

use arrow::record_batch::RecordBatch;

use crate::error::{Result, WarehouseError};
use crate::schema::{Layer, RelationName, WriteMode};

/// Relations of one pipeline run
#[derive(Debug)]
pub struct Session {
    id: String,
    relations: BTreeMap<RelationName, RecordBatch>,
    closed: bool,
}

impl Session {
    /// Open an empty session
    #[must_use]
    pub fn open(id: impl Into<String>) -> Self {
        let id = id.into();
        log::debug!("Opened session {id}");
        Self {
            id,
            relations: BTreeMap::new(),
            closed: false,
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.closed
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            return Err(WarehouseError::SessionClosed(self.id.clone()));
        }
        Ok(())
    }

    fn check_write(&self, stage: Layer, relation: RelationName, mode: WriteMode) -> Result<()> {
        self.ensure_open()?;
        if relation.layer() != stage {
            return Err(WarehouseError::OwnershipViolation {
                stage: stage.to_string(),
                relation: relation.to_string(),
                owner: relation.layer().to_string(),
            });
        }
        if relation.write_mode() != mode {
            return Err(WarehouseError::WriteModeMismatch {
                relation: relation.to_string(),
                expected: format!("{:?}", relation.write_mode()),
            });
        }
        Ok(())
    }

    /// Register `batch` unless the relation already exists
    ///
    /// Returns whether the relation was created by this call.
    ///
    /// # Errors
    /// Returns a session error if the session is closed, `stage` does not own
    /// the relation, or the relation is not create-if-absent
    pub fn create_if_absent(
        &mut self,
        stage: Layer,
        relation: RelationName,
        batch: RecordBatch,
    ) -> Result<bool> {
        self.check_write(stage, relation, WriteMode::CreateIfAbsent)?;
        if self.relations.contains_key(&relation) {
            log::debug!("{relation} already exists in session {}, keeping it", self.id);
            return Ok(false);
        }
        log::debug!("Created {relation} with {} rows", batch.num_rows());
        self.relations.insert(relation, batch);
        Ok(true)
    }

    /// Register `batch`, dropping any previous version of the relation
    ///
    /// # Errors
    /// Returns a session error if the session is closed, `stage` does not own
    /// the relation, or the relation is create-if-absent
    pub fn replace(&mut self, stage: Layer, relation: RelationName, batch: RecordBatch) -> Result<()> {
        self.check_write(stage, relation, WriteMode::Replace)?;
        log::debug!("Replaced {relation} with {} rows", batch.num_rows());
        self.relations.insert(relation, batch);
        Ok(())
    }

    /// A registered relation
    ///
    /// # Errors
    /// Returns a session error if the session is closed or the relation is absent
    pub fn table(&self, relation: RelationName) -> Result<&RecordBatch> {
        self.ensure_open()?;
        self.relations
            .get(&relation)
            .ok_or_else(|| WarehouseError::RelationNotFound(relation.to_string()))
    }

    /// Number of rows of a registered relation
    ///
    /// # Errors
    /// Returns a session error if the session is closed or the relation is absent
    pub fn record_count(&self, relation: RelationName) -> Result<usize> {
        self.table(relation).map(RecordBatch::num_rows)
    }

    #[must_use]
    pub fn contains(&self, relation: RelationName) -> bool {
        !self.closed && self.relations.contains_key(&relation)
    }

    /// Registered relations in pipeline order
    #[must_use]
    pub fn relation_names(&self) -> Vec<RelationName> {
        if self.closed {
            return Vec::new();
        }
        self.relations.keys().copied().collect()
    }

    /// Release every relation
    ///
    /// Returns `true` only for the call that actually released the session.
    pub fn close(&mut self) -> bool {
        if self.closed {
            return false;
        }
        self.closed = true;
        self.relations.clear();
        log::debug!("Closed session {}", self.id);
        true
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if self.close() {
            log::debug!("Session {} released on drop", self.id);
        }
    }
}
