//! `gold_powerbi_fact_table`: one row per clean patient with a risk score

use crate::models::{ChestPainType, FactRow, Sex, ValidatedRecord};

/// Highest attainable risk score
pub const MAX_RISK_SCORE: i32 = 18;

/// Additive clinical risk score in `0..=18`
///
/// Each present factor adds its weight; missing values add nothing.
#[must_use]
pub fn risk_score(record: &ValidatedRecord) -> i32 {
    let factors = [
        (record.age.is_some_and(|v| v > 60), 2),
        (record.sex == Sex::Male, 1),
        (record.chest_pain_type == ChestPainType::Asymptomatic, 2),
        (record.resting_blood_pressure.is_some_and(|v| v > 140), 2),
        (record.cholesterol.is_some_and(|v| v > 240), 2),
        (record.fasting_blood_sugar_high == Some(true), 1),
        (record.max_heart_rate.is_some_and(|v| v < 120), 2),
        (record.exercise_induced_angina == Some(true), 2),
        (record.st_depression.is_some_and(|v| v > 2.0), 2),
        (record.num_major_vessels.is_some_and(|v| v >= 2), 2),
    ];
    factors
        .iter()
        .filter(|(present, _)| *present)
        .map(|(_, weight)| weight)
        .sum()
}

/// Flatten one clean record into a fact row
#[must_use]
pub fn fact_row(record: &ValidatedRecord) -> FactRow {
    FactRow {
        patient_id: record.patient_id,
        age: record.age,
        sex: record.sex,
        age_group: record.age_group,
        dataset: record.dataset.clone(),
        chest_pain_type: record.chest_pain_type,
        resting_blood_pressure: record.resting_blood_pressure,
        cholesterol: record.cholesterol,
        fasting_blood_sugar_high: record.fasting_blood_sugar_high,
        resting_ecg: record.resting_ecg,
        max_heart_rate: record.max_heart_rate,
        max_heart_rate_category: record.max_heart_rate_category,
        exercise_induced_angina: record.exercise_induced_angina,
        st_depression: record.st_depression,
        st_slope: record.st_slope,
        num_major_vessels: record.num_major_vessels,
        thalassemia: record.thalassemia,
        heart_disease_severity: record.heart_disease_severity,
        has_heart_disease: record.has_heart_disease,
        calculated_risk_score: risk_score(record),
    }
}

/// Build the fact table in clean-relation order
#[must_use]
pub fn build(records: &[ValidatedRecord]) -> Vec<FactRow> {
    records.iter().map(fact_row).collect()
}
