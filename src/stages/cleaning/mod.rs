//! Cleaning: raw relation into the silver relations
//!
//! Three sub-stages run in order, each producing its own relation:
//! type coercion (`silver_stage1_typed`), standardization
//! (`silver_stage2_standardized`) and quality evaluation
//! (`silver_stage3_validated`). The clean relation `silver_heart_disease` is
//! the subset of validated rows without quality issues.

use std::time::Instant;

use arrow::record_batch::RecordBatch;
use rayon::prelude::*;

use crate::config::{CoercionPolicy, QualityThresholds};
use crate::error::Result;
use crate::models::{QuarantinedValue, StandardizedRecord, TableRecord, TypedRecord, ValidatedRecord};
use crate::schema::RelationName;
use crate::utils::logging::{log_stage_complete, log_stage_start};

pub mod coercion;
pub mod quality;
pub mod standardize;

pub use coercion::{CoercionOutput, coerce};
pub use quality::{GuardedField, QualitySummary, evaluate, has_quality_issues, violation_counts};
pub use standardize::standardize;

/// Output of the cleaning stage
#[derive(Debug, Clone)]
pub struct CleaningOutput {
    pub typed: RecordBatch,
    pub standardized: RecordBatch,
    pub validated: RecordBatch,
    pub quarantine: RecordBatch,
    pub clean: RecordBatch,
    /// Rows of `clean`, handed to aggregation
    pub clean_records: Vec<ValidatedRecord>,
    pub summary: QualitySummary,
}

impl CleaningOutput {
    /// Every relation produced, in registration order
    #[must_use]
    pub fn relations(&self) -> [(RelationName, &RecordBatch); 5] {
        [
            (RelationName::SilverTyped, &self.typed),
            (RelationName::SilverStandardized, &self.standardized),
            (RelationName::SilverValidated, &self.validated),
            (RelationName::SilverQuarantine, &self.quarantine),
            (RelationName::SilverHeartDisease, &self.clean),
        ]
    }
}

/// Standardize typed records, preserving order
#[must_use]
pub fn standardize_all(records: Vec<TypedRecord>) -> Vec<StandardizedRecord> {
    records.into_par_iter().map(standardize).collect()
}

/// Evaluate quality of standardized records, preserving order
#[must_use]
pub fn evaluate_all(
    records: Vec<StandardizedRecord>,
    thresholds: &QualityThresholds,
) -> Vec<ValidatedRecord> {
    records
        .into_par_iter()
        .map(|record| evaluate(record, thresholds))
        .collect()
}

/// Rows without quality issues, in order
#[must_use]
pub fn clean_subset(records: &[ValidatedRecord]) -> Vec<ValidatedRecord> {
    records
        .iter()
        .filter(|r| !r.has_quality_issues)
        .cloned()
        .collect()
}

/// Run all cleaning sub-stages over the raw relation
///
/// # Errors
/// Returns a configuration error for invalid thresholds (before any work), a
/// schema error for missing source columns and, under strict coercion, a
/// coercion error for the first non-convertible value
pub fn clean(
    raw: &RecordBatch,
    thresholds: &QualityThresholds,
    policy: CoercionPolicy,
) -> Result<CleaningOutput> {
    thresholds.validate()?;
    let start = Instant::now();
    log_stage_start("cleaning");

    let CoercionOutput {
        records: typed,
        quarantined,
        quarantined_rows,
    } = coerce(raw, policy)?;
    let typed_batch = TypedRecord::to_record_batch(&typed)?;
    log::info!(
        "Type coercion completed: {} rows in {}",
        typed.len(),
        RelationName::SilverTyped
    );
    if quarantined_rows > 0 {
        log::warn!(
            "{quarantined_rows} raw rows quarantined with {} non-convertible values",
            quarantined.len()
        );
    }

    let standardized = standardize_all(typed);
    let standardized_batch = StandardizedRecord::to_record_batch(&standardized)?;
    log::info!(
        "Standardization completed: {} rows in {}",
        standardized.len(),
        RelationName::SilverStandardized
    );

    for (field, rows) in violation_counts(&standardized, thresholds) {
        log::debug!("{rows} rows outside the {field} range");
    }
    let validated = evaluate_all(standardized, thresholds);
    let validated_batch = ValidatedRecord::to_record_batch(&validated)?;
    let summary = QualitySummary::from_validated(&validated, quarantined_rows);
    log::info!(
        "Quality evaluation completed: {} total, {} with quality issues, {} clean",
        summary.total,
        summary.flagged,
        summary.clean
    );

    let clean_records = clean_subset(&validated);
    let clean_batch = ValidatedRecord::to_record_batch(&clean_records)?;
    let quarantine_batch = QuarantinedValue::to_record_batch(&quarantined)?;

    log_stage_complete("cleaning", clean_records.len(), start.elapsed());
    Ok(CleaningOutput {
        typed: typed_batch,
        standardized: standardized_batch,
        validated: validated_batch,
        quarantine: quarantine_batch,
        clean: clean_batch,
        clean_records,
        summary,
    })
}
