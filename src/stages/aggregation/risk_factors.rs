//! `gold_risk_factors`: disease rate per combination of clinical indicators
//!
//! Rows are ordered by descending risk percentage. The sort is stable, so
//! combinations with equal risk keep the order in which they first appear in
//! the clean relation.

use crate::models::{RiskFactorRow, ValidatedRecord};
use crate::stages::aggregation::stats::{count, group_by, percentage};

#[must_use]
pub fn build(records: &[ValidatedRecord]) -> Vec<RiskFactorRow> {
    let mut rows: Vec<RiskFactorRow> = group_by(records, |r| {
        (
            r.chest_pain_type,
            r.resting_ecg,
            r.exercise_induced_angina,
            r.st_slope,
            r.thalassemia,
        )
    })
    .into_iter()
    .map(|((chest_pain, ecg, angina, slope, thal), group)| {
        let diseased = group
            .iter()
            .filter(|r| r.has_heart_disease == Some(true))
            .count();
        RiskFactorRow {
            chest_pain_type: chest_pain.label().to_string(),
            resting_ecg: ecg.label().to_string(),
            exercise_induced_angina: angina,
            st_slope: slope.label().to_string(),
            thalassemia: thal.label().to_string(),
            patient_count: count(group.len()),
            heart_disease_count: count(diseased),
            risk_percentage: percentage(diseased, group.len()),
        }
    })
    .collect();

    rows.sort_by(|a, b| b.risk_percentage.total_cmp(&a.risk_percentage));
    rows
}
