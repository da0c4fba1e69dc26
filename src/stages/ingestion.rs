//! Ingestion: raw source rows into `bronze_heart_disease`
//!
//! Every source row is kept as text, unchanged and unfiltered, with the two
//! provenance columns appended.

use std::sync::Arc;
use std::time::Instant;

use arrow::array::{Array, ArrayRef, StringArray, TimestampMicrosecondArray};
use arrow::compute::min;
use arrow::datatypes::Schema;
use arrow::record_batch::RecordBatch;
use chrono::{DateTime, Utc};
use rustc_hash::FxHashSet;
use serde::Serialize;

use crate::error::{Result, WarehouseError};
use crate::schema::{RelationName, SOURCE_FIELDS};
use crate::schema::relations::{INGESTION_TIMESTAMP, provenance_fields};
use crate::storage::{ObjectLocation, ObjectStore};
use crate::utils::arrow::{downcast_array, find_column, get_column, non_blank, text_column};
use crate::utils::io::DelimitedFormat;
use crate::utils::logging::{log_stage_complete, log_stage_start};

/// Source header holding the patient identifier
pub const SOURCE_ID_COLUMN: &str = "id";

/// Counters describing the raw relation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestionSummary {
    pub total_records: usize,
    /// Distinct non-blank patient identifiers
    pub distinct_patients: usize,
    /// Earliest ingestion instant (all rows share one), `None` for an empty relation
    pub ingested_at: Option<DateTime<Utc>>,
}

/// Output of the ingestion stage
#[derive(Debug, Clone)]
pub struct RawRelation {
    pub batch: RecordBatch,
    pub summary: IngestionSummary,
}

/// What to ingest
#[derive(Debug, Clone)]
pub struct IngestionRequest {
    pub source: ObjectLocation,
    pub format: DelimitedFormat,
    /// Recorded in `source_identifier` on every row
    pub source_identifier: String,
    pub ingested_at: DateTime<Utc>,
}

impl IngestionRequest {
    #[must_use]
    pub fn new(source: ObjectLocation, ingested_at: DateTime<Utc>) -> Self {
        let source_identifier = source.key.clone();
        Self {
            source,
            format: DelimitedFormat::default(),
            source_identifier,
            ingested_at,
        }
    }
}

/// Append the provenance columns to a raw batch
///
/// # Errors
/// Returns an error if the columns cannot be assembled into a batch
pub fn with_provenance(
    raw: &RecordBatch,
    source_identifier: &str,
    ingested_at: DateTime<Utc>,
) -> Result<RecordBatch> {
    let rows = raw.num_rows();
    let micros = ingested_at.timestamp_micros();

    let mut fields: Vec<_> = raw.schema().fields().iter().cloned().collect();
    fields.extend(provenance_fields().into_iter().map(Arc::new));

    let mut columns: Vec<ArrayRef> = raw.columns().to_vec();
    columns.push(Arc::new(
        TimestampMicrosecondArray::from(vec![micros; rows]).with_timezone("UTC"),
    ));
    columns.push(Arc::new(StringArray::from(vec![source_identifier; rows])));

    Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)?)
}

/// Read the source and tag it with provenance
///
/// Existence is checked before the read; a missing or unreadable source fails
/// the stage and nothing is returned.
///
/// # Errors
/// Returns [`WarehouseError::SourceAccess`] if the source is unreachable,
/// unreadable or lacks one of the source headers
pub fn ingest(store: &dyn ObjectStore, request: &IngestionRequest) -> Result<RawRelation> {
    let start = Instant::now();
    log_stage_start("ingestion");
    log::info!("Reading raw data from {}", request.source);

    if !store.exists(&request.source)? {
        return Err(WarehouseError::source_access(
            &request.source,
            "object does not exist",
        ));
    }
    let raw = store.read_table(&request.source, request.format)?;
    check_source_headers(&raw, &request.source)?;
    let batch = with_provenance(&raw, &request.source_identifier, request.ingested_at)?;
    let summary = summarize(&batch)?;

    log::info!(
        "Ingested {} records ({} distinct patients) into {}",
        summary.total_records,
        summary.distinct_patients,
        RelationName::BronzeHeartDisease
    );
    log_stage_complete("ingestion", batch.num_rows(), start.elapsed());
    Ok(RawRelation { batch, summary })
}

/// Fail unless every source header is present, ignoring case
fn check_source_headers(raw: &RecordBatch, source: &ObjectLocation) -> Result<()> {
    if raw.num_columns() == 0 {
        return Err(WarehouseError::source_access(source, "object has no header row"));
    }
    let missing: Vec<&str> = SOURCE_FIELDS
        .iter()
        .map(|field| field.source)
        .filter(|header| find_column(raw, header).is_none())
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(WarehouseError::source_access(
            source,
            format!("missing required columns: {}", missing.join(", ")),
        ))
    }
}

/// Summarize a raw relation
///
/// # Errors
/// Returns an error if the provenance timestamp column is missing or mistyped
pub fn summarize(raw: &RecordBatch) -> Result<IngestionSummary> {
    let relation = RelationName::BronzeHeartDisease.as_str();

    let distinct_patients = match find_column(raw, SOURCE_ID_COLUMN) {
        Some(_) => {
            let ids = text_column(raw, SOURCE_ID_COLUMN, relation)?;
            (0..ids.len())
                .filter_map(|row| non_blank(ids, row).map(str::trim))
                .collect::<FxHashSet<_>>()
                .len()
        }
        None => {
            log::debug!("{relation} has no '{SOURCE_ID_COLUMN}' column");
            0
        }
    };

    let timestamps = get_column(raw, INGESTION_TIMESTAMP, relation)?;
    let timestamps =
        downcast_array::<TimestampMicrosecondArray>(timestamps, INGESTION_TIMESTAMP, "Timestamp")?;
    let ingested_at = min(timestamps).and_then(DateTime::<Utc>::from_timestamp_micros);

    Ok(IngestionSummary {
        total_records: raw.num_rows(),
        distinct_patients,
        ingested_at,
    })
}
