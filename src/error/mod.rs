//! Error handling for the warehouse pipeline.
//!
//! Every fallible operation in the crate returns [`Result`]. The variants follow
//! the failure taxonomy of the pipeline: configuration and naming problems are
//! raised before any stage does work, source-access and coercion errors abort
//! the stage that hit them, and persistence errors are reported but never stop
//! a run.

use std::io;
use std::path::PathBuf;

use arrow_schema::ArrowError;
use parquet::errors::ParquetError;
use serde::Serialize;
use thiserror::Error;

pub mod util;

/// Coarse classification of a [`WarehouseError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Missing or invalid configuration
    Config,
    /// Unreachable or unreadable source data
    SourceAccess,
    /// A raw value that cannot be converted to its semantic type
    Coercion,
    /// Failure writing an artifact to object storage
    Persistence,
    /// An identifier that is not safe to use as a relation or artifact name
    NamingSafety,
    /// Source or relation layout does not match what a stage expects
    Schema,
    /// Misuse of the session or the run state machine
    Session,
    /// Errors bubbling up from Arrow, Parquet, IO or serialization
    Internal,
}

/// Specialized error type for the warehouse pipeline
#[derive(Debug, Error)]
pub enum WarehouseError {
    /// A configuration value is missing
    #[error("Configuration error: '{key}' is not set")]
    MissingConfig { key: String },

    /// A configuration value is present but unusable
    #[error("Configuration error: '{key}' = {value:?} is invalid: {reason}")]
    InvalidConfig {
        key: String,
        value: String,
        reason: String,
    },

    /// The source location does not exist or cannot be read
    #[error("Source not accessible at {location}: {reason}")]
    SourceAccess { location: String, reason: String },

    /// A raw value could not be coerced to its semantic type
    #[error(
        "Type coercion failed at row {row}, column '{column}': cannot convert {value:?} to {target}"
    )]
    Coercion {
        row: usize,
        column: String,
        value: String,
        target: &'static str,
    },

    /// Writing an artifact failed
    #[error("Failed to persist {artifact}: {reason}")]
    Persistence { artifact: String, reason: String },

    /// An identifier contains unsafe characters or is too long
    #[error("Unsafe identifier '{name}': {reason}")]
    UnsafeName { name: String, reason: String },

    /// A column required by a stage is absent
    #[error("Column '{column}' not found in {relation}")]
    ColumnNotFound { column: String, relation: String },

    /// A column has an unexpected Arrow type
    #[error("Column '{column}' has type {actual}, expected {expected}")]
    InvalidDataType {
        column: String,
        expected: String,
        actual: String,
    },

    /// A relation was requested that the session does not hold
    #[error("Relation '{0}' is not registered in the session")]
    RelationNotFound(String),

    /// A stage tried to write a relation owned by another layer
    #[error("Stage {stage} may not write relation '{relation}' owned by layer {owner}")]
    OwnershipViolation {
        stage: String,
        relation: String,
        owner: String,
    },

    /// A relation was written with the wrong write mode
    #[error("Relation '{relation}' must be written with {expected}")]
    WriteModeMismatch {
        relation: String,
        expected: String,
    },

    /// The session has been released
    #[error("Session {0} has already been closed")]
    SessionClosed(String),

    /// The pipeline state machine rejected a transition
    #[error("Invalid pipeline transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("IO error at {path}: {source}")]
    IoAt {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Arrow error: {0}")]
    Arrow(#[from] ArrowError),

    #[error("Parquet error: {0}")]
    Parquet(#[from] ParquetError),

    #[error("Serialization error: {0}")]
    SerdeArrow(#[from] serde_arrow::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl WarehouseError {
    /// Classify this error
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingConfig { .. } | Self::InvalidConfig { .. } => ErrorKind::Config,
            Self::SourceAccess { .. } => ErrorKind::SourceAccess,
            Self::Coercion { .. } => ErrorKind::Coercion,
            Self::Persistence { .. } => ErrorKind::Persistence,
            Self::UnsafeName { .. } => ErrorKind::NamingSafety,
            Self::ColumnNotFound { .. } | Self::InvalidDataType { .. } => ErrorKind::Schema,
            Self::RelationNotFound(_)
            | Self::OwnershipViolation { .. }
            | Self::WriteModeMismatch { .. }
            | Self::SessionClosed(_)
            | Self::InvalidTransition { .. } => ErrorKind::Session,
            Self::IoAt { .. }
            | Self::Io(_)
            | Self::Arrow(_)
            | Self::Parquet(_)
            | Self::SerdeArrow(_)
            | Self::Json(_) => ErrorKind::Internal,
        }
    }

    /// Whether this error must abort the current run
    ///
    /// Only persistence failures are recoverable; the data they failed to upload
    /// is still held by the session or a local copy.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        !matches!(self.kind(), ErrorKind::Persistence)
    }

    pub(crate) fn invalid_config(
        key: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidConfig {
            key: key.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn source_access(location: impl ToString, reason: impl ToString) -> Self {
        Self::SourceAccess {
            location: location.to_string(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn persistence(artifact: impl ToString, reason: impl ToString) -> Self {
        Self::Persistence {
            artifact: artifact.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Result type for warehouse operations
pub type Result<T> = std::result::Result<T, WarehouseError>;
