//! `gold_severity_distribution`: patients per diagnosis code

use crate::models::{SeverityLevel, SeverityRow, ValidatedRecord};
use crate::stages::aggregation::stats::{as_f64, count, group_by, mean, nulls_last, percentage};

/// Build the severity distribution, ordered by severity with unknown last
#[must_use]
pub fn build(records: &[ValidatedRecord]) -> Vec<SeverityRow> {
    let total = records.len();
    let mut rows: Vec<SeverityRow> = group_by(records, |r| r.heart_disease_severity)
        .into_iter()
        .map(|(severity, group)| SeverityRow {
            heart_disease_severity: severity,
            severity_label: severity
                .and_then(SeverityLevel::from_code)
                .map(|level| level.label().to_string()),
            patient_count: count(group.len()),
            percentage: percentage(group.len(), total),
            avg_age: mean(group.iter().map(|r| as_f64(r.age))),
            avg_cholesterol: mean(group.iter().map(|r| as_f64(r.cholesterol))),
            avg_blood_pressure: mean(group.iter().map(|r| as_f64(r.resting_blood_pressure))),
        })
        .collect();

    rows.sort_by(|a, b| {
        nulls_last(
            a.heart_disease_severity.as_ref(),
            b.heart_disease_severity.as_ref(),
        )
    });
    rows
}
