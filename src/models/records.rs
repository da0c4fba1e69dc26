//! Row types of the silver relations
//!
//! Field order matches the Arrow schemas in [`crate::schema::relations`].

use arrow::datatypes::{FieldRef, SchemaRef};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::TableRecord;
use crate::models::types::{
    AgeGroup, ChestPainType, HeartRateCategory, RestingEcg, Sex, StSlope, Thalassemia,
};
use crate::schema::relations::{
    field_refs, quarantine_schema, standardized_schema, typed_schema, validated_schema,
};

/// A source row after type coercion
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TypedRecord {
    pub patient_id: Option<i32>,
    pub age: Option<i32>,
    pub sex: Option<String>,
    pub dataset: Option<String>,
    pub chest_pain_type: Option<String>,
    pub resting_blood_pressure: Option<i32>,
    pub cholesterol: Option<i32>,
    pub fasting_blood_sugar_high: Option<bool>,
    pub resting_ecg: Option<String>,
    pub max_heart_rate: Option<i32>,
    pub exercise_induced_angina: Option<bool>,
    pub st_depression: Option<f64>,
    pub st_slope: Option<String>,
    pub num_major_vessels: Option<i32>,
    pub thalassemia: Option<String>,
    pub heart_disease_severity: Option<i32>,
    /// Ingestion instant in microseconds since the epoch (UTC)
    pub ingestion_timestamp: i64,
    pub source_identifier: String,
}

/// A typed row with canonical categorical values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardizedRecord {
    pub patient_id: Option<i32>,
    pub age: Option<i32>,
    pub sex: Sex,
    pub dataset: Option<String>,
    pub chest_pain_type: ChestPainType,
    pub resting_blood_pressure: Option<i32>,
    pub cholesterol: Option<i32>,
    pub fasting_blood_sugar_high: Option<bool>,
    pub resting_ecg: RestingEcg,
    pub max_heart_rate: Option<i32>,
    pub exercise_induced_angina: Option<bool>,
    pub st_depression: Option<f64>,
    pub st_slope: StSlope,
    pub num_major_vessels: Option<i32>,
    pub thalassemia: Thalassemia,
    pub heart_disease_severity: Option<i32>,
    pub has_heart_disease: Option<bool>,
    pub ingestion_timestamp: i64,
    pub source_identifier: String,
}

/// A standardized row with quality flag and derived buckets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatedRecord {
    pub patient_id: Option<i32>,
    pub age: Option<i32>,
    pub sex: Sex,
    pub dataset: Option<String>,
    pub chest_pain_type: ChestPainType,
    pub resting_blood_pressure: Option<i32>,
    pub cholesterol: Option<i32>,
    pub fasting_blood_sugar_high: Option<bool>,
    pub resting_ecg: RestingEcg,
    pub max_heart_rate: Option<i32>,
    pub exercise_induced_angina: Option<bool>,
    pub st_depression: Option<f64>,
    pub st_slope: StSlope,
    pub num_major_vessels: Option<i32>,
    pub thalassemia: Thalassemia,
    pub heart_disease_severity: Option<i32>,
    pub has_heart_disease: Option<bool>,
    pub ingestion_timestamp: i64,
    pub source_identifier: String,
    pub has_quality_issues: bool,
    pub age_group: AgeGroup,
    pub max_heart_rate_category: HeartRateCategory,
}

impl ValidatedRecord {
    /// Attach the quality verdict and buckets to a standardized row
    #[must_use]
    pub fn from_standardized(
        record: StandardizedRecord,
        has_quality_issues: bool,
    ) -> Self {
        let age_group: AgeGroup = record.age.into();
        let max_heart_rate_category: HeartRateCategory = record.max_heart_rate.into();
        Self {
            patient_id: record.patient_id,
            age: record.age,
            sex: record.sex,
            dataset: record.dataset,
            chest_pain_type: record.chest_pain_type,
            resting_blood_pressure: record.resting_blood_pressure,
            cholesterol: record.cholesterol,
            fasting_blood_sugar_high: record.fasting_blood_sugar_high,
            resting_ecg: record.resting_ecg,
            max_heart_rate: record.max_heart_rate,
            exercise_induced_angina: record.exercise_induced_angina,
            st_depression: record.st_depression,
            st_slope: record.st_slope,
            num_major_vessels: record.num_major_vessels,
            thalassemia: record.thalassemia,
            heart_disease_severity: record.heart_disease_severity,
            has_heart_disease: record.has_heart_disease,
            ingestion_timestamp: record.ingestion_timestamp,
            source_identifier: record.source_identifier,
            has_quality_issues,
            age_group,
            max_heart_rate_category,
        }
    }
}

/// A raw value that could not be coerced, kept for inspection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuarantinedValue {
    /// Zero-based row index in the raw relation
    pub source_row: u64,
    /// Raw patient identifier text of that row, if any
    pub raw_patient_id: Option<String>,
    /// Semantic column the value was destined for
    pub column_name: String,
    pub raw_value: String,
    pub target_type: String,
}

fn explicit(schema: &SchemaRef) -> Result<Vec<FieldRef>> {
    Ok(field_refs(schema))
}

impl TableRecord for TypedRecord {
    fn fields() -> Result<Vec<FieldRef>> {
        explicit(&typed_schema())
    }
}

impl TableRecord for StandardizedRecord {
    fn fields() -> Result<Vec<FieldRef>> {
        explicit(&standardized_schema())
    }
}

impl TableRecord for ValidatedRecord {
    fn fields() -> Result<Vec<FieldRef>> {
        explicit(&validated_schema())
    }
}

impl TableRecord for QuarantinedValue {
    fn fields() -> Result<Vec<FieldRef>> {
        explicit(&quarantine_schema())
    }
}
