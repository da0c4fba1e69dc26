//! Console output utilities
//!
//! This module provides utilities for formatted console output.

use arrow::record_batch::RecordBatch;
use arrow::util::pretty::pretty_format_batches;

use crate::error::Result;

/// Render a batch as a text table under a title
///
/// # Errors
/// Returns an error if a column type cannot be displayed
pub fn format_titled_batch(title: &str, batch: &RecordBatch) -> Result<String> {
    let table = pretty_format_batches(std::slice::from_ref(batch))?;
    Ok(format!("\n{title}\n{table}"))
}

/// Print a batch as a text table under a title
///
/// # Errors
/// Returns an error if a column type cannot be displayed
pub fn print_titled_batch(title: &str, batch: &RecordBatch) -> Result<()> {
    println!("{}", format_titled_batch(title, batch)?);
    Ok(())
}

/// Print a section banner
pub fn print_section(title: &str) {
    println!("\n== {title} ==");
}
