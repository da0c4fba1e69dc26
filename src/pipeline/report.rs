//! Summary of one pipeline run

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{ErrorKind, WarehouseError};
use crate::pipeline::{PipelineState, RunMode};
use crate::schema::RelationName;
use crate::stages::{IngestionSummary, QualitySummary};
use crate::storage::{PersistOutcome, PersistStatus};

/// Row count of one relation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelationCount {
    pub relation: String,
    pub rows: usize,
}

impl RelationCount {
    #[must_use]
    pub fn new(relation: RelationName, rows: usize) -> Self {
        Self {
            relation: relation.to_string(),
            rows,
        }
    }
}

/// What a run did, serializable for machine consumption
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub session_id: String,
    pub mode: RunMode,
    pub state: PipelineState,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub duration_ms: u64,
    pub ingestion: Option<IngestionSummary>,
    pub quality: Option<QualitySummary>,
    pub aggregates: Vec<RelationCount>,
    pub persisted: Vec<PersistOutcome>,
    pub exported: Vec<PathBuf>,
    pub error_kind: Option<ErrorKind>,
    pub error: Option<String>,
}

impl RunReport {
    #[must_use]
    pub fn new(session_id: impl Into<String>, mode: RunMode, started_at: DateTime<Utc>) -> Self {
        Self {
            session_id: session_id.into(),
            mode,
            state: PipelineState::Idle,
            started_at,
            finished_at: None,
            duration_ms: 0,
            ingestion: None,
            quality: None,
            aggregates: Vec::new(),
            persisted: Vec::new(),
            exported: Vec::new(),
            error_kind: None,
            error: None,
        }
    }

    /// Stamp the end of the run
    pub fn finish(&mut self, finished_at: DateTime<Utc>) {
        self.duration_ms = u64::try_from(
            (finished_at - self.started_at)
                .num_milliseconds()
                .max(0),
        )
        .unwrap_or(0);
        self.finished_at = Some(finished_at);
    }

    pub fn record_failure(&mut self, error: &WarehouseError) {
        self.error_kind = Some(error.kind());
        self.error = Some(error.to_string());
    }

    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.state == PipelineState::Done && self.error.is_none()
    }

    /// Artifacts that could not be uploaded
    pub fn persistence_failures(&self) -> impl Iterator<Item = &PersistOutcome> {
        self.persisted
            .iter()
            .filter(|o| o.status != PersistStatus::Uploaded)
    }

    /// Pretty-printed JSON rendering
    ///
    /// # Errors
    /// Returns an error if serialization fails
    pub fn to_json(&self) -> crate::error::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Run {} ({:?}): {}", self.session_id, self.mode, self.state)?;
        writeln!(f, "  Duration: {} ms", self.duration_ms)?;
        if let Some(ingestion) = &self.ingestion {
            writeln!(
                f,
                "  Raw records: {} ({} distinct patients)",
                ingestion.total_records, ingestion.distinct_patients
            )?;
        }
        if let Some(quality) = &self.quality {
            writeln!(
                f,
                "  Quality: {} evaluated, {} flagged, {} clean, {} quarantined",
                quality.total, quality.flagged, quality.clean, quality.quarantined
            )?;
        }
        for count in &self.aggregates {
            writeln!(f, "  {}: {} rows", count.relation, count.rows)?;
        }
        for outcome in &self.persisted {
            match &outcome.local_copy {
                Some(path) => writeln!(
                    f,
                    "  {} -> {:?} ({})",
                    outcome.relation,
                    outcome.status,
                    path.display()
                )?,
                None => writeln!(
                    f,
                    "  {} -> {:?} ({})",
                    outcome.relation, outcome.status, outcome.destination
                )?,
            }
        }
        for path in &self.exported {
            writeln!(f, "  Exported {}", path.display())?;
        }
        if let Some(error) = &self.error {
            writeln!(f, "  Error: {error}")?;
        }
        Ok(())
    }
}
