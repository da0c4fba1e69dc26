//! Utility functions for working with Parquet files

use std::fs::File;
use std::path::Path;

use arrow::compute::concat_batches;
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;

use crate::error::Result;
use crate::error::util::{IoResultExt, safe_open_file};
use crate::utils::logging::{log_operation_complete, log_operation_start};

/// Writer properties for warehouse artifacts (Snappy compression)
#[must_use]
pub fn snappy_properties() -> WriterProperties {
    WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build()
}

/// Write a record batch to a Parquet file, replacing any existing file
///
/// # Arguments
/// * `path` - Destination file
/// * `batch` - The batch to write
///
/// # Errors
/// Returns an error if the file cannot be created or the batch cannot be encoded
pub fn write_parquet(path: &Path, batch: &RecordBatch) -> Result<()> {
    let start = std::time::Instant::now();
    log_operation_start("Writing parquet file", path);

    let file = File::create(path).at_path(path)?;
    let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(snappy_properties()))?;
    writer.write(batch)?;
    writer.close()?;

    log_operation_complete("wrote", path, batch.num_rows(), Some(start.elapsed()));
    Ok(())
}

/// Read a whole Parquet file into a single record batch
///
/// # Errors
/// Returns an error if the file cannot be opened or if the Parquet file is invalid
pub fn read_parquet(path: &Path) -> Result<RecordBatch> {
    let start = std::time::Instant::now();
    log_operation_start("Reading parquet file", path);

    let file = safe_open_file(path, "parquet read")?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
    let schema = builder.schema().clone();
    let batches = builder
        .build()?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    let batch = concat_batches(&schema, &batches)?;

    log_operation_complete("read", path, batch.num_rows(), Some(start.elapsed()));
    Ok(batch)
}
