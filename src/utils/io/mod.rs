//! IO utilities for file operations
//!
//! Delimited text for sources and exports, Parquet for layer artifacts.

pub mod csv;
pub mod parquet;

pub use csv::{DelimitedFormat, read_delimited_as_text, write_csv};
pub use parquet::{read_parquet, write_parquet};
