//! Row types of the gold relations
//!
//! The four summary tables trace their Arrow layout from the row type. The fact
//! table uses an explicit schema so that it shares column types with silver.

use arrow::datatypes::FieldRef;
use serde::{Deserialize, Serialize};
use serde_arrow::schema::{SchemaLike, TracingOptions};

use crate::error::Result;
use crate::models::TableRecord;
use crate::models::types::{
    AgeGroup, ChestPainType, HeartRateCategory, RestingEcg, Sex, StSlope, Thalassemia,
};
use crate::schema::relations::{fact_table_schema, field_refs};

/// Fields traced from a row type, with text as `Utf8`
pub(crate) fn traced<'de, T: Deserialize<'de>>() -> Result<Vec<FieldRef>> {
    Ok(Vec::<FieldRef>::from_type::<T>(
        TracingOptions::default()
            .allow_null_fields(true)
            .strings_as_large_utf8(false),
    )?)
}

/// One `sex` x `age_group` cell of `gold_demographics_summary`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemographicsRow {
    pub sex: String,
    pub age_group: String,
    pub patient_count: i64,
    pub avg_age: Option<f64>,
    pub heart_disease_count: i64,
    pub heart_disease_percentage: f64,
    pub avg_blood_pressure: Option<f64>,
    pub avg_cholesterol: Option<f64>,
    pub avg_max_heart_rate: Option<f64>,
}

/// One combination of clinical indicators in `gold_risk_factors`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskFactorRow {
    pub chest_pain_type: String,
    pub resting_ecg: String,
    pub exercise_induced_angina: Option<bool>,
    pub st_slope: String,
    pub thalassemia: String,
    pub patient_count: i64,
    pub heart_disease_count: i64,
    pub risk_percentage: f64,
}

/// One severity level of `gold_severity_distribution`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeverityRow {
    pub heart_disease_severity: Option<i32>,
    pub severity_label: Option<String>,
    pub patient_count: i64,
    pub percentage: f64,
    pub avg_age: Option<f64>,
    pub avg_cholesterol: Option<f64>,
    pub avg_blood_pressure: Option<f64>,
}

/// One `dataset` x `sex` cell of `gold_clinical_metrics`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClinicalMetricsRow {
    pub dataset: Option<String>,
    pub sex: String,
    pub total_patients: i64,
    pub avg_resting_bp: Option<f64>,
    pub min_resting_bp: Option<i32>,
    pub max_resting_bp: Option<i32>,
    pub median_resting_bp: Option<f64>,
    pub avg_cholesterol: Option<f64>,
    pub min_cholesterol: Option<i32>,
    pub max_cholesterol: Option<i32>,
    pub median_cholesterol: Option<f64>,
    pub avg_max_heart_rate: Option<f64>,
    pub min_max_heart_rate: Option<i32>,
    pub max_max_heart_rate: Option<i32>,
    pub median_max_heart_rate: Option<f64>,
    pub avg_st_depression: Option<f64>,
    pub max_st_depression: Option<f64>,
    pub high_fasting_sugar_count: i64,
    pub exercise_angina_count: i64,
}

/// One patient of `gold_powerbi_fact_table`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactRow {
    pub patient_id: Option<i32>,
    pub age: Option<i32>,
    pub sex: Sex,
    pub age_group: AgeGroup,
    pub dataset: Option<String>,
    pub chest_pain_type: ChestPainType,
    pub resting_blood_pressure: Option<i32>,
    pub cholesterol: Option<i32>,
    pub fasting_blood_sugar_high: Option<bool>,
    pub resting_ecg: RestingEcg,
    pub max_heart_rate: Option<i32>,
    pub max_heart_rate_category: HeartRateCategory,
    pub exercise_induced_angina: Option<bool>,
    pub st_depression: Option<f64>,
    pub st_slope: StSlope,
    pub num_major_vessels: Option<i32>,
    pub thalassemia: Thalassemia,
    pub heart_disease_severity: Option<i32>,
    pub has_heart_disease: Option<bool>,
    pub calculated_risk_score: i32,
}

impl TableRecord for DemographicsRow {
    fn fields() -> Result<Vec<FieldRef>> {
        traced::<Self>()
    }
}

impl TableRecord for RiskFactorRow {
    fn fields() -> Result<Vec<FieldRef>> {
        traced::<Self>()
    }
}

impl TableRecord for SeverityRow {
    fn fields() -> Result<Vec<FieldRef>> {
        traced::<Self>()
    }
}

impl TableRecord for ClinicalMetricsRow {
    fn fields() -> Result<Vec<FieldRef>> {
        traced::<Self>()
    }
}

impl TableRecord for FactRow {
    fn fields() -> Result<Vec<FieldRef>> {
        Ok(field_refs(&fact_table_schema()))
    }
}
