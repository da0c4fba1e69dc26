//! Sub-stage C: quality evaluation
//!
//! A record has quality issues when any guarded measurement is present and lies
//! strictly outside its configured range. Missing measurements are never
//! flagged.

use std::fmt;

use itertools::Itertools;
use serde::Serialize;
use smallvec::SmallVec;

use crate::config::{Bounds, QualityThresholds};
use crate::models::{StandardizedRecord, ValidatedRecord};

/// The measurement a quality rule guards
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GuardedField {
    Age,
    RestingBloodPressure,
    Cholesterol,
    MaxHeartRate,
    StDepression,
}

impl GuardedField {
    pub const ALL: [Self; 5] = [
        Self::Age,
        Self::RestingBloodPressure,
        Self::Cholesterol,
        Self::MaxHeartRate,
        Self::StDepression,
    ];

    /// Column name of the guarded measurement
    #[must_use]
    pub const fn column(self) -> &'static str {
        match self {
            Self::Age => "age",
            Self::RestingBloodPressure => "resting_blood_pressure",
            Self::Cholesterol => "cholesterol",
            Self::MaxHeartRate => "max_heart_rate",
            Self::StDepression => "st_depression",
        }
    }

    fn value(self, record: &StandardizedRecord) -> Option<f64> {
        match self {
            Self::Age => record.age.map(f64::from),
            Self::RestingBloodPressure => record.resting_blood_pressure.map(f64::from),
            Self::Cholesterol => record.cholesterol.map(f64::from),
            Self::MaxHeartRate => record.max_heart_rate.map(f64::from),
            Self::StDepression => record.st_depression,
        }
    }

    const fn bounds(self, thresholds: &QualityThresholds) -> Bounds {
        match self {
            Self::Age => thresholds.age,
            Self::RestingBloodPressure => thresholds.blood_pressure,
            Self::Cholesterol => thresholds.cholesterol,
            Self::MaxHeartRate => thresholds.heart_rate,
            Self::StDepression => thresholds.st_depression,
        }
    }

    /// Present and outside its range
    fn is_violated(self, record: &StandardizedRecord, thresholds: &QualityThresholds) -> bool {
        self.value(record)
            .is_some_and(|v| !self.bounds(thresholds).contains(v))
    }
}

impl fmt::Display for GuardedField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

/// Guarded fields of `record` whose value lies outside its range
#[must_use]
pub fn violations(
    record: &StandardizedRecord,
    thresholds: &QualityThresholds,
) -> SmallVec<[GuardedField; 5]> {
    GuardedField::ALL
        .into_iter()
        .filter(|field| field.is_violated(record, thresholds))
        .collect()
}

/// Whether `record` fails any quality rule
#[must_use]
pub fn has_quality_issues(record: &StandardizedRecord, thresholds: &QualityThresholds) -> bool {
    GuardedField::ALL
        .into_iter()
        .any(|field| field.is_violated(record, thresholds))
}

/// Number of records violating each guarded field, in [`GuardedField::ALL`]
/// order; fields without violations are left out
#[must_use]
pub fn violation_counts(
    records: &[StandardizedRecord],
    thresholds: &QualityThresholds,
) -> Vec<(GuardedField, usize)> {
    let counts = records
        .iter()
        .flat_map(|record| violations(record, thresholds))
        .counts();
    GuardedField::ALL
        .into_iter()
        .filter_map(|field| counts.get(&field).map(|n| (field, *n)))
        .collect()
}

/// Flag and bucket one standardized record
#[must_use]
pub fn evaluate(record: StandardizedRecord, thresholds: &QualityThresholds) -> ValidatedRecord {
    let flagged = has_quality_issues(&record, thresholds);
    ValidatedRecord::from_standardized(record, flagged)
}

/// Counters of the cleaning stage
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct QualitySummary {
    /// Rows evaluated (standardized rows)
    pub total: usize,
    /// Rows with quality issues
    pub flagged: usize,
    /// Rows in the clean relation
    pub clean: usize,
    /// Raw rows withheld by coercion quarantine
    pub quarantined: usize,
}

impl QualitySummary {
    /// Count flagged and clean rows of a validated relation
    #[must_use]
    pub fn from_validated(records: &[ValidatedRecord], quarantined: usize) -> Self {
        let flagged = records.iter().filter(|r| r.has_quality_issues).count();
        Self {
            total: records.len(),
            flagged,
            clean: records.len() - flagged,
            quarantined,
        }
    }
}
