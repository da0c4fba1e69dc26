//! Domain models for the warehouse
//!
//! Row types for every relation the pipeline builds, plus the canonical
//! categorical values they carry. Conversion between rows and Arrow record
//! batches goes through `serde_arrow`.

use arrow::datatypes::FieldRef;
use arrow::record_batch::RecordBatch;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::Result;

pub mod aggregates;
pub mod records;
pub mod types;

pub use aggregates::{
    ClinicalMetricsRow, DemographicsRow, FactRow, RiskFactorRow, SeverityRow,
};
pub use records::{QuarantinedValue, StandardizedRecord, TypedRecord, ValidatedRecord};
pub use types::{
    AgeGroup, ChestPainType, HeartRateCategory, RestingEcg, SeverityLevel, Sex, StSlope,
    Thalassemia,
};

/// A row type that maps onto one relation
pub trait TableRecord: Serialize + Sized {
    /// Arrow fields of the relation, in column order
    fn fields() -> Result<Vec<FieldRef>>;

    /// Convert rows into a record batch
    ///
    /// An empty slice produces an empty batch with the full schema.
    fn to_record_batch(rows: &[Self]) -> Result<RecordBatch> {
        let fields = Self::fields()?;
        Ok(serde_arrow::to_record_batch(&fields, &rows)?)
    }

    /// Read rows back from a record batch
    fn from_record_batch(batch: &RecordBatch) -> Result<Vec<Self>>
    where
        Self: DeserializeOwned,
    {
        Ok(serde_arrow::from_record_batch(batch)?)
    }
}
