//! A bronze/silver/gold warehouse pipeline for heart disease records, built
//! on Arrow record batches and Snappy-compressed Parquet artifacts.

pub mod config;
pub mod error;
pub mod filter;
pub mod models;
pub mod pipeline;
pub mod report;
pub mod schema;
pub mod session;
pub mod stages;
pub mod storage;
pub mod utils;

// Re-export the most common types for easier use
// Core types
pub use config::{CoercionPolicy, QualityThresholds, WarehouseConfig};
pub use error::{ErrorKind, Result, WarehouseError};
pub use schema::{Layer, RelationName};
pub use session::Session;

// Arrow types
pub use arrow::record_batch::RecordBatch;

// Orchestration
pub use pipeline::{Pipeline, PipelineState, RunMode, RunObserver, RunOptions, RunReport};
pub use report::ConsoleReporter;

// Storage
pub use storage::{LocalObjectStore, ObjectLocation, ObjectStore};
