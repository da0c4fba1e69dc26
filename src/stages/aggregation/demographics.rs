//! `gold_demographics_summary`: patients by sex and age group

use crate::models::{DemographicsRow, ValidatedRecord};
use crate::stages::aggregation::stats::{as_f64, count, group_by, mean, percentage};

/// Build the demographics summary, ordered by sex then age group label
#[must_use]
pub fn build(records: &[ValidatedRecord]) -> Vec<DemographicsRow> {
    let mut rows: Vec<DemographicsRow> = group_by(records, |r| (r.sex, r.age_group))
        .into_iter()
        .map(|((sex, age_group), group)| {
            let diseased = group
                .iter()
                .filter(|r| r.has_heart_disease == Some(true))
                .count();
            DemographicsRow {
                sex: sex.label().to_string(),
                age_group: age_group.label().to_string(),
                patient_count: count(group.len()),
                avg_age: mean(group.iter().map(|r| as_f64(r.age))),
                heart_disease_count: count(diseased),
                heart_disease_percentage: percentage(diseased, group.len()),
                avg_blood_pressure: mean(group.iter().map(|r| as_f64(r.resting_blood_pressure))),
                avg_cholesterol: mean(group.iter().map(|r| as_f64(r.cholesterol))),
                avg_max_heart_rate: mean(group.iter().map(|r| as_f64(r.max_heart_rate))),
            }
        })
        .collect();

    rows.sort_by(|a, b| (&a.sex, &a.age_group).cmp(&(&b.sex, &b.age_group)));
    rows
}
