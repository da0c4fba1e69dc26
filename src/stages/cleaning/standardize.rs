//! Sub-stage B: canonical categorical values
//!
//! Matching is case-insensitive and the first matching rule wins. Rules are
//! substring matches except for sex, which compares the trimmed value. The
//! rule order is significant: `"atypical"` contains `"typical"` and
//! `"abnormal"` contains `"normal"`, so those inputs resolve to the earlier
//! rule.

use crate::models::{
    ChestPainType, RestingEcg, Sex, StSlope, StandardizedRecord, Thalassemia, TypedRecord,
};

/// Ordered `(needles, value)` rules; a value matches a rule if it contains any needle
type Rules<T> = &'static [(&'static [&'static str], T)];

const CHEST_PAIN_RULES: Rules<ChestPainType> = &[
    (&["typical"], ChestPainType::TypicalAngina),
    (&["atypical"], ChestPainType::AtypicalAngina),
    (&["non"], ChestPainType::NonAnginalPain),
    (&["asymp"], ChestPainType::Asymptomatic),
];

const RESTING_ECG_RULES: Rules<RestingEcg> = &[
    (&["normal"], RestingEcg::Normal),
    (&["hypertrophy"], RestingEcg::LvHypertrophy),
    (&["abnormal", "wave"], RestingEcg::StTAbnormality),
];

const ST_SLOPE_RULES: Rules<StSlope> = &[
    (&["up"], StSlope::Upsloping),
    (&["flat"], StSlope::Flat),
    (&["down"], StSlope::Downsloping),
];

const THALASSEMIA_RULES: Rules<Thalassemia> = &[
    (&["normal"], Thalassemia::Normal),
    (&["fixed"], Thalassemia::FixedDefect),
    (&["revers"], Thalassemia::ReversibleDefect),
];

/// Map a raw value through ordered substring rules
fn first_match<T: Copy>(raw: Option<&str>, rules: Rules<T>, fallback: T) -> T {
    let Some(value) = raw.map(str::to_lowercase) else {
        return fallback;
    };
    rules
        .iter()
        .find(|(needles, _)| needles.iter().any(|n| value.contains(n)))
        .map_or(fallback, |(_, v)| *v)
}

#[must_use]
pub fn standardize_sex(raw: Option<&str>) -> Sex {
    match raw.map(|s| s.trim().to_lowercase()).as_deref() {
        Some("male" | "m" | "1") => Sex::Male,
        Some("female" | "f" | "0") => Sex::Female,
        _ => Sex::Unknown,
    }
}

#[must_use]
pub fn standardize_chest_pain(raw: Option<&str>) -> ChestPainType {
    first_match(raw, CHEST_PAIN_RULES, ChestPainType::Unknown)
}

#[must_use]
pub fn standardize_resting_ecg(raw: Option<&str>) -> RestingEcg {
    first_match(raw, RESTING_ECG_RULES, RestingEcg::Unknown)
}

#[must_use]
pub fn standardize_st_slope(raw: Option<&str>) -> StSlope {
    first_match(raw, ST_SLOPE_RULES, StSlope::Unknown)
}

#[must_use]
pub fn standardize_thalassemia(raw: Option<&str>) -> Thalassemia {
    first_match(raw, THALASSEMIA_RULES, Thalassemia::Unknown)
}

/// `false` for severity 0, `true` above 0, unknown otherwise
#[must_use]
pub const fn has_heart_disease(severity: Option<i32>) -> Option<bool> {
    match severity {
        Some(0) => Some(false),
        Some(s) if s > 0 => Some(true),
        _ => None,
    }
}

/// Standardize one typed record; never rejects
#[must_use]
pub fn standardize(record: TypedRecord) -> StandardizedRecord {
    StandardizedRecord {
        patient_id: record.patient_id,
        age: record.age,
        sex: standardize_sex(record.sex.as_deref()),
        dataset: record.dataset.map(|d| d.trim().to_string()),
        chest_pain_type: standardize_chest_pain(record.chest_pain_type.as_deref()),
        resting_blood_pressure: record.resting_blood_pressure,
        cholesterol: record.cholesterol,
        fasting_blood_sugar_high: record.fasting_blood_sugar_high,
        resting_ecg: standardize_resting_ecg(record.resting_ecg.as_deref()),
        max_heart_rate: record.max_heart_rate,
        exercise_induced_angina: record.exercise_induced_angina,
        st_depression: record.st_depression,
        st_slope: standardize_st_slope(record.st_slope.as_deref()),
        num_major_vessels: record.num_major_vessels,
        thalassemia: standardize_thalassemia(record.thalassemia.as_deref()),
        heart_disease_severity: record.heart_disease_severity,
        has_heart_disease: has_heart_disease(record.heart_disease_severity),
        ingestion_timestamp: record.ingestion_timestamp,
        source_identifier: record.source_identifier,
    }
}
