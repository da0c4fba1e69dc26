//! Object storage seam
//!
//! The pipeline reads its source and writes layer artifacts through
//! [`ObjectStore`]. [`LocalObjectStore`] backs buckets with directories, which
//! is what the binary and the tests use.

use arrow::record_batch::RecordBatch;

use crate::error::Result;
use crate::utils::io::DelimitedFormat;

pub mod local;
pub mod location;
pub mod persist;

pub use local::LocalObjectStore;
pub use location::ObjectLocation;
pub use persist::{ArtifactLayout, PersistOutcome, PersistStatus, Persister};

/// Read and write access to bucketed objects
pub trait ObjectStore: Send + Sync + std::fmt::Debug {
    /// Whether an object exists at `location`
    ///
    /// # Errors
    /// Returns a source-access error if the store itself cannot be queried
    fn exists(&self, location: &ObjectLocation) -> Result<bool>;

    /// Read a delimited text object into a relation with all-text columns
    ///
    /// # Errors
    /// Returns [`crate::error::WarehouseError::SourceAccess`] if the object is
    /// missing or unreadable
    fn read_table(&self, location: &ObjectLocation, format: DelimitedFormat)
    -> Result<RecordBatch>;

    /// Write a relation as a Snappy-compressed Parquet object
    ///
    /// # Errors
    /// Returns an error if the object cannot be written
    fn write(&self, batch: &RecordBatch, destination: &ObjectLocation) -> Result<()>;
}
