//! The three pipeline stages
//!
//! Stages are plain functions: they take the relations they read and return
//! the relations they produce. Registering results in the session is left to
//! the orchestrator.

pub mod aggregation;
pub mod cleaning;
pub mod ingestion;

pub use aggregation::{AggregateKind, AggregationOutput, aggregate};
pub use cleaning::{CleaningOutput, QualitySummary, clean};
pub use ingestion::{IngestionRequest, IngestionSummary, RawRelation, ingest};
