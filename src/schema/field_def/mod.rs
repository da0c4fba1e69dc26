//! Source field definitions
//!
//! The heart disease source is a delimited file whose header uses the short
//! UCI column names. Each [`SourceField`] ties one of those columns to the
//! semantic column it becomes after type coercion.

use std::fmt;

/// Semantic type a source column is coerced to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Whole number (identifiers, measurements, codes)
    Integer,
    /// Floating-point measurement
    Decimal,
    /// Boolean flag
    Boolean,
    /// Free-form text, standardized later
    Text,
}

impl FieldKind {
    /// Short name used in coercion error messages
    #[must_use]
    pub const fn target_name(self) -> &'static str {
        match self {
            Self::Integer => "INTEGER",
            Self::Decimal => "DOUBLE",
            Self::Boolean => "BOOLEAN",
            Self::Text => "VARCHAR",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.target_name())
    }
}

/// Definition of one source column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceField {
    /// Header name in the source file
    pub source: &'static str,
    /// Column name after coercion
    pub target: &'static str,
    /// Semantic type after coercion
    pub kind: FieldKind,
    /// Human readable description
    pub description: &'static str,
}

impl SourceField {
    const fn new(
        source: &'static str,
        target: &'static str,
        kind: FieldKind,
        description: &'static str,
    ) -> Self {
        Self {
            source,
            target,
            kind,
            description,
        }
    }
}

/// All source columns, in source order
pub const SOURCE_FIELDS: [SourceField; 16] = [
    SourceField::new("id", "patient_id", FieldKind::Integer, "Patient unique identifier"),
    SourceField::new("age", "age", FieldKind::Integer, "Age of the patient in years"),
    SourceField::new("sex", "sex", FieldKind::Text, "Gender of the patient"),
    SourceField::new("dataset", "dataset", FieldKind::Text, "Location the data was sourced from"),
    SourceField::new("cp", "chest_pain_type", FieldKind::Text, "Chest pain type"),
    SourceField::new(
        "trestbps",
        "resting_blood_pressure",
        FieldKind::Integer,
        "Resting blood pressure (mmHg)",
    ),
    SourceField::new("chol", "cholesterol", FieldKind::Integer, "Serum cholesterol (mg/dl)"),
    SourceField::new(
        "fbs",
        "fasting_blood_sugar_high",
        FieldKind::Boolean,
        "Fasting blood sugar > 120 mg/dl",
    ),
    SourceField::new(
        "restecg",
        "resting_ecg",
        FieldKind::Text,
        "Resting electrocardiographic results",
    ),
    SourceField::new("thalch", "max_heart_rate", FieldKind::Integer, "Maximum heart rate achieved"),
    SourceField::new(
        "exang",
        "exercise_induced_angina",
        FieldKind::Boolean,
        "Exercise induced angina",
    ),
    SourceField::new(
        "oldpeak",
        "st_depression",
        FieldKind::Decimal,
        "ST depression induced by exercise relative to rest",
    ),
    SourceField::new("slope", "st_slope", FieldKind::Text, "Slope of the peak exercise ST segment"),
    SourceField::new("ca", "num_major_vessels", FieldKind::Integer, "Number of major vessels (0-3)"),
    SourceField::new("thal", "thalassemia", FieldKind::Text, "Thalassemia type"),
    SourceField::new(
        "num",
        "heart_disease_severity",
        FieldKind::Integer,
        "Diagnosis of heart disease (0 = no disease, 1-4 = severity)",
    ),
];
