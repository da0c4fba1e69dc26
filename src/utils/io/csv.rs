//! Delimited text input and output

use std::fs::File;
use std::io::{BufReader, Seek, SeekFrom};
use std::path::Path;
use std::sync::Arc;

use arrow::compute::concat_batches;
use arrow::csv::reader::Format;
use arrow::csv::{ReaderBuilder, WriterBuilder};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use arrow::record_batch::RecordBatch;

use crate::error::Result;
use crate::error::util::{IoResultExt, safe_open_file};
use crate::utils::logging::{log_operation_complete, log_operation_start};

/// Layout of a delimited text file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelimitedFormat {
    pub delimiter: u8,
    pub has_header: bool,
}

impl Default for DelimitedFormat {
    fn default() -> Self {
        Self {
            delimiter: b',',
            has_header: true,
        }
    }
}

impl DelimitedFormat {
    fn to_arrow(self) -> Format {
        Format::default()
            .with_header(self.has_header)
            .with_delimiter(self.delimiter)
    }
}

/// Schema of `schema` with every column turned into nullable text
fn as_text_schema(schema: &Schema) -> SchemaRef {
    Arc::new(Schema::new(
        schema
            .fields()
            .iter()
            .map(|f| Field::new(f.name(), DataType::Utf8, true))
            .collect::<Vec<_>>(),
    ))
}

/// Read a delimited file with every column as text
///
/// Column names come from the header; no value is interpreted, so type
/// handling stays with the caller.
///
/// # Errors
/// Returns a source-access error if the file is missing and an Arrow error if
/// it cannot be parsed
pub fn read_delimited_as_text(path: &Path, format: DelimitedFormat) -> Result<RecordBatch> {
    let start = std::time::Instant::now();
    log_operation_start("Reading delimited file", path);

    let mut file = safe_open_file(path, "source data")?;
    let arrow_format = format.to_arrow();
    let (inferred, _) = arrow_format.infer_schema(BufReader::new(&mut file), None)?;
    file.seek(SeekFrom::Start(0)).at_path(path)?;

    let schema = as_text_schema(&inferred);
    let reader = ReaderBuilder::new(Arc::clone(&schema))
        .with_format(arrow_format)
        .build(BufReader::new(file))?;
    let batches = reader.collect::<std::result::Result<Vec<_>, _>>()?;
    let batch = concat_batches(&schema, &batches)?;

    log_operation_complete("read", path, batch.num_rows(), Some(start.elapsed()));
    Ok(batch)
}

/// Write a record batch as comma-separated text with a header row
///
/// # Errors
/// Returns an error if the file cannot be created or written
pub fn write_csv(path: &Path, batch: &RecordBatch) -> Result<()> {
    let file = File::create(path).at_path(path)?;
    let mut writer = WriterBuilder::new().with_header(true).build(file);
    writer.write(batch)?;
    log::debug!("Wrote {} rows to {}", batch.num_rows(), path.display());
    Ok(())
}
