//! Read-only views over a session
//!
//! Every accessor takes the session by shared reference and returns a new
//! batch; nothing here registers or changes a relation.

use arrow::array::{BooleanArray, Int32Array};
use arrow::datatypes::FieldRef;
use arrow::record_batch::RecordBatch;
use serde::{Deserialize, Serialize};

use crate::error::{Result, WarehouseError};
use crate::filter::{AnyMissingFilter, BatchFilter, MinValueFilter};
use crate::models::aggregates::traced;
use crate::models::{DemographicsRow, RiskFactorRow, SeverityRow, TableRecord};
use crate::schema::RelationName;
use crate::session::Session;
use crate::stages::aggregation::stats::{count, group_by, nulls_last, round1};
use crate::stages::ingestion::{IngestionSummary, summarize};
use crate::utils::arrow::{downcast_array, find_column, get_column};

pub mod console;

pub use console::ConsoleReporter;

/// Columns shown by [`standardization_sample`]
pub const STANDARDIZATION_SAMPLE_COLUMNS: [&str; 5] = [
    "sex",
    "chest_pain_type",
    "resting_ecg",
    "thalassemia",
    "has_heart_disease",
];

/// Raw columns whose absence counts against data quality
pub const CRITICAL_SOURCE_COLUMNS: [&str; 4] = ["age", "sex", "trestbps", "chol"];

/// Smallest group considered by [`top_risk_factors`]
pub const MIN_RISK_GROUP_SIZE: i64 = 10;

const STANDARDIZATION_SAMPLE_ROWS: usize = 5;
const TOP_ROWS: usize = 10;

/// One line of the data quality report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityMetricRow {
    pub metric: String,
    pub value: i64,
}

/// Clean patients in one coarse age range
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgeBucketRow {
    pub age_group: Option<String>,
    pub count: i64,
}

/// Display projection of `gold_demographics_summary`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemographicsSampleRow {
    pub sex: String,
    pub age_group: String,
    pub patient_count: i64,
    pub heart_disease_percentage: f64,
    pub avg_cholesterol: Option<f64>,
    pub avg_bp: Option<f64>,
}

/// Display projection of `gold_risk_factors`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopRiskRow {
    pub chest_pain_type: String,
    pub exercise_induced_angina: Option<bool>,
    pub patient_count: i64,
    pub heart_disease_count: i64,
    pub risk_percentage: f64,
}

/// Display projection of `gold_severity_distribution`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeverityDisplayRow {
    pub severity_label: Option<String>,
    pub patient_count: i64,
    pub percentage: f64,
    pub avg_age: Option<f64>,
}

/// Row count of one registered relation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordCountRow {
    pub table_name: String,
    pub record_count: i64,
}

macro_rules! traced_record {
    ($($row:ty),+ $(,)?) => {
        $(impl TableRecord for $row {
            fn fields() -> Result<Vec<FieldRef>> {
                traced::<Self>()
            }
        })+
    };
}

traced_record!(
    QualityMetricRow,
    AgeBucketRow,
    DemographicsSampleRow,
    TopRiskRow,
    SeverityDisplayRow,
    RecordCountRow,
);

fn head(batch: &RecordBatch, rows: usize) -> RecordBatch {
    batch.slice(0, rows.min(batch.num_rows()))
}

fn project(batch: &RecordBatch, columns: &[&str], relation: RelationName) -> Result<RecordBatch> {
    let indices = columns
        .iter()
        .map(|column| {
            find_column(batch, column).ok_or_else(|| WarehouseError::ColumnNotFound {
                column: (*column).to_string(),
                relation: relation.to_string(),
            })
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(batch.project(&indices)?)
}

/// Counters of the raw relation
///
/// # Errors
/// Returns an error if the raw relation is not registered
pub fn ingestion_summary(session: &Session) -> Result<IngestionSummary> {
    summarize(session.table(RelationName::BronzeHeartDisease)?)
}

/// The first standardized rows, restricted to the canonicalized columns
///
/// # Errors
/// Returns an error if the standardized relation is not registered
pub fn standardization_sample(session: &Session) -> Result<RecordBatch> {
    let relation = RelationName::SilverStandardized;
    let sample = project(
        session.table(relation)?,
        &STANDARDIZATION_SAMPLE_COLUMNS,
        relation,
    )?;
    Ok(head(&sample, STANDARDIZATION_SAMPLE_ROWS))
}

/// Row-level quality counters
///
/// Reports raw records, flagged records, clean records and raw records
/// missing any of [`CRITICAL_SOURCE_COLUMNS`].
///
/// # Errors
/// Returns an error if the raw, validated or clean relation is not registered
pub fn data_quality_report(session: &Session) -> Result<RecordBatch> {
    let raw = session.table(RelationName::BronzeHeartDisease)?;
    let validated = session.table(RelationName::SilverValidated)?;
    let flags = downcast_array::<BooleanArray>(
        get_column(
            validated,
            "has_quality_issues",
            RelationName::SilverValidated.as_str(),
        )?,
        "has_quality_issues",
        "Boolean",
    )?;
    let missing_critical = AnyMissingFilter::new(CRITICAL_SOURCE_COLUMNS).count(raw)?;

    let rows = [
        ("Total Records", raw.num_rows()),
        ("Records with Quality Issues", flags.true_count()),
        (
            "Clean Records in Silver",
            session.record_count(RelationName::SilverHeartDisease)?,
        ),
        ("Null Values in Critical Fields", missing_critical),
    ]
    .into_iter()
    .map(|(metric, value)| QualityMetricRow {
        metric: metric.to_string(),
        value: count(value),
    })
    .collect::<Vec<_>>();
    QualityMetricRow::to_record_batch(&rows)
}

/// Coarse age range used by the distribution report; `None` for a missing age
#[must_use]
pub const fn age_range(age: Option<i32>) -> Option<&'static str> {
    match age {
        None => None,
        Some(a) if a < 30 => Some("<30"),
        Some(a) if a < 40 => Some("30-39"),
        Some(a) if a < 50 => Some("40-49"),
        Some(a) if a < 60 => Some("50-59"),
        Some(_) => Some("60+"),
    }
}

/// Clean patients per coarse age range, ordered by label with missing ages last
///
/// # Errors
/// Returns an error if the clean relation is not registered
pub fn age_distribution(session: &Session) -> Result<RecordBatch> {
    let relation = RelationName::SilverHeartDisease;
    let clean = session.table(relation)?;
    let ages = downcast_array::<Int32Array>(
        get_column(clean, "age", relation.as_str())?,
        "age",
        "Int32",
    )?;

    let labels: Vec<Option<&str>> = ages.iter().map(age_range).collect();
    let mut rows: Vec<AgeBucketRow> = group_by(&labels, |label| *label)
        .into_iter()
        .map(|(label, group)| AgeBucketRow {
            age_group: label.map(str::to_string),
            count: count(group.len()),
        })
        .collect();
    rows.sort_by(|a, b| nulls_last(a.age_group.as_ref(), b.age_group.as_ref()));
    AgeBucketRow::to_record_batch(&rows)
}

/// The first demographics rows with averages rounded for display
///
/// # Errors
/// Returns an error if the demographics relation is not registered
pub fn demographics_sample(session: &Session) -> Result<RecordBatch> {
    let rows = DemographicsRow::from_record_batch(
        session.table(RelationName::GoldDemographicsSummary)?,
    )?;
    let sample: Vec<DemographicsSampleRow> = rows
        .into_iter()
        .take(TOP_ROWS)
        .map(|row| DemographicsSampleRow {
            sex: row.sex,
            age_group: row.age_group,
            patient_count: row.patient_count,
            heart_disease_percentage: row.heart_disease_percentage,
            avg_cholesterol: row.avg_cholesterol.map(round1),
            avg_bp: row.avg_blood_pressure.map(round1),
        })
        .collect();
    DemographicsSampleRow::to_record_batch(&sample)
}

/// Riskiest indicator combinations among groups of at least
/// [`MIN_RISK_GROUP_SIZE`] patients
///
/// # Errors
/// Returns an error if the risk-factor relation is not registered
pub fn top_risk_factors(session: &Session) -> Result<RecordBatch> {
    let large_groups = MinValueFilter::new("patient_count", MIN_RISK_GROUP_SIZE)
        .filter(session.table(RelationName::GoldRiskFactors)?)?;
    let top: Vec<TopRiskRow> = RiskFactorRow::from_record_batch(&large_groups)?
        .into_iter()
        .take(TOP_ROWS)
        .map(|row| TopRiskRow {
            chest_pain_type: row.chest_pain_type,
            exercise_induced_angina: row.exercise_induced_angina,
            patient_count: row.patient_count,
            heart_disease_count: row.heart_disease_count,
            risk_percentage: row.risk_percentage,
        })
        .collect();
    TopRiskRow::to_record_batch(&top)
}

/// Severity distribution with the mean age rounded for display
///
/// # Errors
/// Returns an error if the severity relation is not registered
pub fn severity_distribution(session: &Session) -> Result<RecordBatch> {
    let rows: Vec<SeverityDisplayRow> = SeverityRow::from_record_batch(
        session.table(RelationName::GoldSeverityDistribution)?,
    )?
    .into_iter()
    .map(|row| SeverityDisplayRow {
        severity_label: row.severity_label,
        patient_count: row.patient_count,
        percentage: row.percentage,
        avg_age: row.avg_age.map(round1),
    })
    .collect();
    SeverityDisplayRow::to_record_batch(&rows)
}

/// Row counts of the raw, clean and gold relations that are registered, in
/// pipeline order
///
/// A closed session has no registered relations and yields an empty batch.
///
/// # Errors
/// Returns an error if the rows cannot be converted to a record batch
pub fn record_counts(session: &Session) -> Result<RecordBatch> {
    let rows = std::iter::once(RelationName::BronzeHeartDisease)
        .chain(std::iter::once(RelationName::SilverHeartDisease))
        .chain(RelationName::GOLD)
        .filter(|relation| session.contains(*relation))
        .map(|relation| {
            Ok(RecordCountRow {
                table_name: relation.to_string(),
                record_count: count(session.record_count(relation)?),
            })
        })
        .collect::<Result<Vec<_>>>()?;
    RecordCountRow::to_record_batch(&rows)
}
