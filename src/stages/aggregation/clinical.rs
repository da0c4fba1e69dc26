//! `gold_clinical_metrics`: measurement statistics by dataset and sex

use crate::models::{ClinicalMetricsRow, ValidatedRecord};
use crate::stages::aggregation::stats::{
    as_f64, count, group_by, max_f64, mean, median, nulls_last,
};

/// Min, mean, continuous median and max of one integer measurement
struct Spread {
    min: Option<i32>,
    avg: Option<f64>,
    median: Option<f64>,
    max: Option<i32>,
}

impl Spread {
    fn of(values: &[Option<i32>]) -> Self {
        Self {
            min: values.iter().flatten().min().copied(),
            avg: mean(values.iter().map(|v| as_f64(*v))),
            median: median(values.iter().map(|v| as_f64(*v))),
            max: values.iter().flatten().max().copied(),
        }
    }
}

/// Build clinical metrics, ordered by dataset (unknown last) then sex
#[must_use]
pub fn build(records: &[ValidatedRecord]) -> Vec<ClinicalMetricsRow> {
    let mut rows: Vec<ClinicalMetricsRow> = group_by(records, |r| (r.dataset.clone(), r.sex))
        .into_iter()
        .map(|((dataset, sex), group)| {
            let column = |f: fn(&ValidatedRecord) -> Option<i32>| -> Vec<Option<i32>> {
                group.iter().map(|r| f(r)).collect()
            };
            let bp = Spread::of(&column(|r| r.resting_blood_pressure));
            let chol = Spread::of(&column(|r| r.cholesterol));
            let hr = Spread::of(&column(|r| r.max_heart_rate));

            ClinicalMetricsRow {
                dataset,
                sex: sex.label().to_string(),
                total_patients: count(group.len()),
                avg_resting_bp: bp.avg,
                min_resting_bp: bp.min,
                max_resting_bp: bp.max,
                median_resting_bp: bp.median,
                avg_cholesterol: chol.avg,
                min_cholesterol: chol.min,
                max_cholesterol: chol.max,
                median_cholesterol: chol.median,
                avg_max_heart_rate: hr.avg,
                min_max_heart_rate: hr.min,
                max_max_heart_rate: hr.max,
                median_max_heart_rate: hr.median,
                avg_st_depression: mean(group.iter().map(|r| r.st_depression)),
                max_st_depression: max_f64(group.iter().map(|r| r.st_depression)),
                high_fasting_sugar_count: count(
                    group
                        .iter()
                        .filter(|r| r.fasting_blood_sugar_high == Some(true))
                        .count(),
                ),
                exercise_angina_count: count(
                    group
                        .iter()
                        .filter(|r| r.exercise_induced_angina == Some(true))
                        .count(),
                ),
            }
        })
        .collect();

    rows.sort_by(|a, b| {
        nulls_last(a.dataset.as_ref(), b.dataset.as_ref()).then_with(|| a.sex.cmp(&b.sex))
    });
    rows
}
