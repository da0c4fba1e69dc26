//! Row filtering over record batches
//!
//! Filters compute a boolean mask and hand it to [`filter_record_batch`]. They
//! are used by read-only reports; stages filter typed records instead.

use arrow::array::{Array, ArrayRef, BooleanArray, Int64Array, StringArray};
use arrow::compute::filter as arrow_filter;
use arrow::record_batch::RecordBatch;

use crate::error::{Result, WarehouseError};
use crate::utils::arrow::{downcast_array, get_column, non_blank};

/// Filter a record batch based on a boolean mask
///
/// # Arguments
/// * `batch` - The record batch to filter
/// * `mask` - The boolean mask indicating which rows to keep
///
/// # Returns
/// A new record batch with only rows where mask is true
///
/// # Errors
/// Returns an error if the mask length differs from the row count or filtering fails
pub fn filter_record_batch(batch: &RecordBatch, mask: &BooleanArray) -> Result<RecordBatch> {
    if batch.num_rows() != mask.len() {
        return Err(WarehouseError::InvalidDataType {
            column: "<mask>".to_string(),
            expected: format!("{} rows", batch.num_rows()),
            actual: format!("{} rows", mask.len()),
        });
    }

    let filtered_columns: Vec<ArrayRef> = batch
        .columns()
        .iter()
        .map(|col| arrow_filter(col, mask))
        .collect::<std::result::Result<_, _>>()?;

    Ok(RecordBatch::try_new(batch.schema(), filtered_columns)?)
}

/// Trait for objects that can filter record batches
pub trait BatchFilter: std::fmt::Debug {
    /// Mask of the rows to keep
    ///
    /// # Errors
    /// Returns an error if a required column is missing or has the wrong type
    fn mask(&self, batch: &RecordBatch) -> Result<BooleanArray>;

    /// Filter a record batch
    ///
    /// # Errors
    /// Returns an error if the mask cannot be computed or applied
    fn filter(&self, batch: &RecordBatch) -> Result<RecordBatch> {
        filter_record_batch(batch, &self.mask(batch)?)
    }

    /// Number of rows the filter keeps
    ///
    /// # Errors
    /// Returns an error if the mask cannot be computed
    fn count(&self, batch: &RecordBatch) -> Result<usize> {
        Ok(self.mask(batch)?.true_count())
    }
}

/// Keeps rows whose `Int64` column is at least `min` (nulls are dropped)
#[derive(Debug, Clone)]
pub struct MinValueFilter {
    pub column: String,
    pub min: i64,
}

impl MinValueFilter {
    #[must_use]
    pub fn new(column: impl Into<String>, min: i64) -> Self {
        Self {
            column: column.into(),
            min,
        }
    }
}

impl BatchFilter for MinValueFilter {
    fn mask(&self, batch: &RecordBatch) -> Result<BooleanArray> {
        let column = get_column(batch, &self.column, "batch")?;
        let values = downcast_array::<Int64Array>(column, &self.column, "Int64")?;
        Ok(values
            .iter()
            .map(|v| Some(v.is_some_and(|v| v >= self.min)))
            .collect())
    }
}

/// Keeps rows where any of the listed text columns is null or blank
#[derive(Debug, Clone)]
pub struct AnyMissingFilter {
    pub columns: Vec<String>,
}

impl AnyMissingFilter {
    #[must_use]
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }
}

impl BatchFilter for AnyMissingFilter {
    fn mask(&self, batch: &RecordBatch) -> Result<BooleanArray> {
        let arrays = self
            .columns
            .iter()
            .map(|name| {
                let column = get_column(batch, name, "batch")?;
                downcast_array::<StringArray>(column, name, "Utf8")
            })
            .collect::<Result<Vec<_>>>()?;

        Ok((0..batch.num_rows())
            .map(|row| Some(arrays.iter().any(|a| non_blank(a, row).is_none())))
            .collect())
    }
}
