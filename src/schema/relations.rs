//! Arrow schemas of the bronze and silver relations and the fact table.
//!
//! These are declared explicitly rather than traced from the record types so
//! that column order, nullability and the timestamp type stay stable across
//! runs and releases.

use std::sync::Arc;

use arrow::datatypes::{DataType, Field, FieldRef, Schema, SchemaRef, TimeUnit};

/// Name of the ingestion instant column added to every raw row
pub const INGESTION_TIMESTAMP: &str = "ingestion_timestamp";
/// Name of the provenance column added to every raw row
pub const SOURCE_IDENTIFIER: &str = "source_identifier";

/// Arrow type of the ingestion instant (microseconds, UTC)
#[must_use]
pub fn timestamp_type() -> DataType {
    DataType::Timestamp(TimeUnit::Microsecond, Some("UTC".into()))
}

/// The two provenance columns appended by ingestion
#[must_use]
pub fn provenance_fields() -> Vec<Field> {
    vec![
        Field::new(INGESTION_TIMESTAMP, timestamp_type(), false),
        Field::new(SOURCE_IDENTIFIER, DataType::Utf8, false),
    ]
}

fn typed_fields(standardized: bool) -> Vec<Field> {
    // Standardized categoricals always carry a label, `Unknown` included
    let categorical_nullable = !standardized;
    vec![
        Field::new("patient_id", DataType::Int32, true),
        Field::new("age", DataType::Int32, true),
        Field::new("sex", DataType::Utf8, categorical_nullable),
        Field::new("dataset", DataType::Utf8, true),
        Field::new("chest_pain_type", DataType::Utf8, categorical_nullable),
        Field::new("resting_blood_pressure", DataType::Int32, true),
        Field::new("cholesterol", DataType::Int32, true),
        Field::new("fasting_blood_sugar_high", DataType::Boolean, true),
        Field::new("resting_ecg", DataType::Utf8, categorical_nullable),
        Field::new("max_heart_rate", DataType::Int32, true),
        Field::new("exercise_induced_angina", DataType::Boolean, true),
        Field::new("st_depression", DataType::Float64, true),
        Field::new("st_slope", DataType::Utf8, categorical_nullable),
        Field::new("num_major_vessels", DataType::Int32, true),
        Field::new("thalassemia", DataType::Utf8, categorical_nullable),
        Field::new("heart_disease_severity", DataType::Int32, true),
    ]
}

fn with_provenance(mut fields: Vec<Field>) -> Vec<Field> {
    fields.extend(provenance_fields());
    fields
}

fn to_schema(fields: Vec<Field>) -> SchemaRef {
    Arc::new(Schema::new(fields))
}

/// Schema of `silver_stage1_typed`
#[must_use]
pub fn typed_schema() -> SchemaRef {
    to_schema(with_provenance(typed_fields(false)))
}

fn standardized_fields() -> Vec<Field> {
    let mut fields = typed_fields(true);
    fields.push(Field::new("has_heart_disease", DataType::Boolean, true));
    fields
}

/// Schema of `silver_stage2_standardized`
#[must_use]
pub fn standardized_schema() -> SchemaRef {
    to_schema(with_provenance(standardized_fields()))
}

/// Schema of `silver_stage3_validated` and `silver_heart_disease`
#[must_use]
pub fn validated_schema() -> SchemaRef {
    let mut fields = with_provenance(standardized_fields());
    fields.extend([
        Field::new("has_quality_issues", DataType::Boolean, false),
        Field::new("age_group", DataType::Utf8, false),
        Field::new("max_heart_rate_category", DataType::Utf8, false),
    ]);
    to_schema(fields)
}

/// Schema of `silver_quarantine`
#[must_use]
pub fn quarantine_schema() -> SchemaRef {
    to_schema(vec![
        Field::new("source_row", DataType::UInt64, false),
        Field::new("raw_patient_id", DataType::Utf8, true),
        Field::new("column_name", DataType::Utf8, false),
        Field::new("raw_value", DataType::Utf8, false),
        Field::new("target_type", DataType::Utf8, false),
    ])
}

/// Schema of `gold_powerbi_fact_table`
#[must_use]
pub fn fact_table_schema() -> SchemaRef {
    to_schema(vec![
        Field::new("patient_id", DataType::Int32, true),
        Field::new("age", DataType::Int32, true),
        Field::new("sex", DataType::Utf8, false),
        Field::new("age_group", DataType::Utf8, false),
        Field::new("dataset", DataType::Utf8, true),
        Field::new("chest_pain_type", DataType::Utf8, false),
        Field::new("resting_blood_pressure", DataType::Int32, true),
        Field::new("cholesterol", DataType::Int32, true),
        Field::new("fasting_blood_sugar_high", DataType::Boolean, true),
        Field::new("resting_ecg", DataType::Utf8, false),
        Field::new("max_heart_rate", DataType::Int32, true),
        Field::new("max_heart_rate_category", DataType::Utf8, false),
        Field::new("exercise_induced_angina", DataType::Boolean, true),
        Field::new("st_depression", DataType::Float64, true),
        Field::new("st_slope", DataType::Utf8, false),
        Field::new("num_major_vessels", DataType::Int32, true),
        Field::new("thalassemia", DataType::Utf8, false),
        Field::new("heart_disease_severity", DataType::Int32, true),
        Field::new("has_heart_disease", DataType::Boolean, true),
        Field::new("calculated_risk_score", DataType::Int32, false),
    ])
}

/// Field list of a schema in the form `serde_arrow` expects
#[must_use]
pub fn field_refs(schema: &SchemaRef) -> Vec<FieldRef> {
    schema.fields().iter().map(Arc::clone).collect()
}
