//! Utilities for working with Arrow arrays.
//!
//! Column lookup and typed downcasts with errors that name the column and the
//! relation it was expected in.

use arrow::array::{Array, ArrayRef, StringArray};
use arrow::record_batch::RecordBatch;

use crate::error::{Result, WarehouseError};

/// Find a column index by name, ignoring ASCII case
///
/// An exact match wins over a case-insensitive one.
#[must_use]
pub fn find_column(batch: &RecordBatch, column_name: &str) -> Option<usize> {
    let schema = batch.schema();
    schema.index_of(column_name).ok().or_else(|| {
        schema
            .fields()
            .iter()
            .position(|f| f.name().eq_ignore_ascii_case(column_name))
    })
}

/// Get a required column by name (case-insensitive)
///
/// # Arguments
///
/// * `batch` - The record batch containing the column
/// * `column_name` - The name of the column to extract
/// * `relation` - Name of the relation, used in the error
///
/// # Errors
///
/// Returns [`WarehouseError::ColumnNotFound`] if no column matches
pub fn get_column<'a>(
    batch: &'a RecordBatch,
    column_name: &str,
    relation: &str,
) -> Result<&'a ArrayRef> {
    find_column(batch, column_name)
        .map(|idx| batch.column(idx))
        .ok_or_else(|| WarehouseError::ColumnNotFound {
            column: column_name.to_string(),
            relation: relation.to_string(),
        })
}

/// Downcast an array reference to a specific array type
///
/// # Arguments
///
/// * `array` - The array reference to downcast
/// * `column_name` - The name of the column (for error reporting)
/// * `expected_type_name` - The expected type name (for error reporting)
///
/// # Errors
///
/// Returns [`WarehouseError::InvalidDataType`] if the downcast fails
pub fn downcast_array<'a, A: Array + 'static>(
    array: &'a ArrayRef,
    column_name: &str,
    expected_type_name: &str,
) -> Result<&'a A> {
    array
        .as_any()
        .downcast_ref::<A>()
        .ok_or_else(|| WarehouseError::InvalidDataType {
            column: column_name.to_string(),
            expected: expected_type_name.to_string(),
            actual: array.data_type().to_string(),
        })
}

/// Get a required text column
///
/// # Errors
///
/// Returns an error if the column is missing or is not `Utf8`
pub fn text_column<'a>(
    batch: &'a RecordBatch,
    column_name: &str,
    relation: &str,
) -> Result<&'a StringArray> {
    let array = get_column(batch, column_name, relation)?;
    downcast_array::<StringArray>(array, column_name, "Utf8")
}

/// Text value at `row`, treating nulls and blank strings alike
#[must_use]
pub fn non_blank(array: &StringArray, row: usize) -> Option<&str> {
    if array.is_null(row) {
        return None;
    }
    let value = array.value(row);
    (!value.trim().is_empty()).then_some(value)
}
