//! Sub-stage A: coerce raw text into semantic types
//!
//! Blank text is null. Integers accept integer text or finite decimal text
//! rounded half away from zero, decimals accept any finite number, booleans
//! accept `true/false/t/f/yes/no/y/n/1/0` in any case. Range checks happen
//! later, during quality evaluation.

use arrow::array::{Array, StringArray, TimestampMicrosecondArray};
use arrow::record_batch::RecordBatch;

use crate::config::CoercionPolicy;
use crate::error::{Result, WarehouseError};
use crate::models::{QuarantinedValue, TypedRecord};
use crate::schema::relations::{INGESTION_TIMESTAMP, SOURCE_IDENTIFIER};
use crate::schema::{FieldKind, RelationName, SOURCE_FIELDS, SourceField};
use crate::stages::ingestion::SOURCE_ID_COLUMN;
use crate::utils::arrow::{downcast_array, get_column, non_blank, text_column};

/// A successfully coerced value
#[derive(Debug, Clone, PartialEq)]
pub enum CoercedValue {
    Integer(Option<i32>),
    Decimal(Option<f64>),
    Boolean(Option<bool>),
    Text(Option<String>),
}

/// Parse integer text, accepting decimals rounded half away from zero
#[must_use]
pub fn parse_integer(text: &str) -> Option<i32> {
    let text = text.trim();
    if let Ok(v) = text.parse::<i64>() {
        return i32::try_from(v).ok();
    }
    let v = parse_decimal(text)?.round();
    if v < f64::from(i32::MIN) || v > f64::from(i32::MAX) {
        return None;
    }
    // Range checked above
    #[allow(clippy::cast_possible_truncation)]
    Some(v as i32)
}

/// Parse finite decimal text
#[must_use]
pub fn parse_decimal(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse boolean text
#[must_use]
pub fn parse_boolean(text: &str) -> Option<bool> {
    match text.trim().to_ascii_lowercase().as_str() {
        "true" | "t" | "yes" | "y" | "1" => Some(true),
        "false" | "f" | "no" | "n" | "0" => Some(false),
        _ => None,
    }
}

/// Coerce one raw value; `None` means the text is not convertible
#[must_use]
pub fn coerce_value(kind: FieldKind, raw: Option<&str>) -> Option<CoercedValue> {
    let Some(text) = raw.filter(|t| !t.trim().is_empty()) else {
        return Some(match kind {
            FieldKind::Integer => CoercedValue::Integer(None),
            FieldKind::Decimal => CoercedValue::Decimal(None),
            FieldKind::Boolean => CoercedValue::Boolean(None),
            FieldKind::Text => CoercedValue::Text(None),
        });
    };
    match kind {
        FieldKind::Integer => parse_integer(text).map(|v| CoercedValue::Integer(Some(v))),
        FieldKind::Decimal => parse_decimal(text).map(|v| CoercedValue::Decimal(Some(v))),
        FieldKind::Boolean => parse_boolean(text).map(|v| CoercedValue::Boolean(Some(v))),
        FieldKind::Text => Some(CoercedValue::Text(Some(text.to_string()))),
    }
}

fn assign(record: &mut TypedRecord, field: &SourceField, value: CoercedValue) -> Result<()> {
    use CoercedValue::{Boolean, Decimal, Integer, Text};
    match (field.target, value) {
        ("patient_id", Integer(v)) => record.patient_id = v,
        ("age", Integer(v)) => record.age = v,
        ("sex", Text(v)) => record.sex = v,
        ("dataset", Text(v)) => record.dataset = v,
        ("chest_pain_type", Text(v)) => record.chest_pain_type = v,
        ("resting_blood_pressure", Integer(v)) => record.resting_blood_pressure = v,
        ("cholesterol", Integer(v)) => record.cholesterol = v,
        ("fasting_blood_sugar_high", Boolean(v)) => record.fasting_blood_sugar_high = v,
        ("resting_ecg", Text(v)) => record.resting_ecg = v,
        ("max_heart_rate", Integer(v)) => record.max_heart_rate = v,
        ("exercise_induced_angina", Boolean(v)) => record.exercise_induced_angina = v,
        ("st_depression", Decimal(v)) => record.st_depression = v,
        ("st_slope", Text(v)) => record.st_slope = v,
        ("num_major_vessels", Integer(v)) => record.num_major_vessels = v,
        ("thalassemia", Text(v)) => record.thalassemia = v,
        ("heart_disease_severity", Integer(v)) => record.heart_disease_severity = v,
        (target, value) => {
            return Err(WarehouseError::InvalidDataType {
                column: target.to_string(),
                expected: field.kind.target_name().to_string(),
                actual: format!("{value:?}"),
            });
        }
    }
    Ok(())
}

/// Output of type coercion
#[derive(Debug, Clone, Default)]
pub struct CoercionOutput {
    /// Typed rows, in raw order
    pub records: Vec<TypedRecord>,
    /// Every non-convertible value of quarantined rows
    pub quarantined: Vec<QuarantinedValue>,
    /// Number of raw rows withheld from `records`
    pub quarantined_rows: usize,
}

/// Coerce the raw relation into typed records
///
/// Source columns are looked up by header name, ignoring case.
///
/// # Errors
/// Returns [`WarehouseError::ColumnNotFound`] if a source column is missing and,
/// under [`CoercionPolicy::Strict`], [`WarehouseError::Coercion`] for the first
/// non-convertible value
pub fn coerce(raw: &RecordBatch, policy: CoercionPolicy) -> Result<CoercionOutput> {
    let relation = RelationName::BronzeHeartDisease.as_str();

    let columns = SOURCE_FIELDS
        .iter()
        .map(|field| text_column(raw, field.source, relation).map(|c| (field, c)))
        .collect::<Result<Vec<(&SourceField, &StringArray)>>>()?;
    let ids = text_column(raw, SOURCE_ID_COLUMN, relation)?;
    let timestamps = downcast_array::<TimestampMicrosecondArray>(
        get_column(raw, INGESTION_TIMESTAMP, relation)?,
        INGESTION_TIMESTAMP,
        "Timestamp",
    )?;
    let sources = text_column(raw, SOURCE_IDENTIFIER, relation)?;

    let mut output = CoercionOutput {
        records: Vec::with_capacity(raw.num_rows()),
        ..CoercionOutput::default()
    };

    for row in 0..raw.num_rows() {
        let mut record = TypedRecord {
            ingestion_timestamp: timestamps.value(row),
            source_identifier: sources.value(row).to_string(),
            ..TypedRecord::default()
        };
        let mut rejected = Vec::new();

        for (field, column) in &columns {
            let raw_value = (!column.is_null(row)).then(|| column.value(row));
            match coerce_value(field.kind, raw_value) {
                Some(value) => assign(&mut record, field, value)?,
                None => {
                    let value = raw_value.unwrap_or_default().to_string();
                    if policy == CoercionPolicy::Strict {
                        return Err(WarehouseError::Coercion {
                            row,
                            column: field.source.to_string(),
                            value,
                            target: field.kind.target_name(),
                        });
                    }
                    rejected.push(QuarantinedValue {
                        source_row: row as u64,
                        raw_patient_id: non_blank(ids, row).map(str::to_string),
                        column_name: field.source.to_string(),
                        raw_value: value,
                        target_type: field.kind.target_name().to_string(),
                    });
                }
            }
        }

        if rejected.is_empty() {
            output.records.push(record);
        } else {
            log::warn!(
                "Quarantined raw row {row}: {} non-convertible value(s)",
                rejected.len()
            );
            output.quarantined_rows += 1;
            output.quarantined.extend(rejected);
        }
    }

    Ok(output)
}
