//! Directory-backed object store

use std::fs;
use std::path::{Component, Path, PathBuf};

use arrow::record_batch::RecordBatch;

use crate::error::util::{IoResultExt, ensure_directory};
use crate::error::{Result, WarehouseError};
use crate::storage::{ObjectLocation, ObjectStore};
use crate::utils::io::{DelimitedFormat, read_delimited_as_text, write_parquet};

/// Maps `bucket/key` to `<root>/<bucket>/<key>`
#[derive(Debug, Clone)]
pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File path backing `location`
    ///
    /// # Errors
    /// Returns a naming error if the bucket or key would escape the root
    pub fn path_for(&self, location: &ObjectLocation) -> Result<PathBuf> {
        let mut path = self.root.clone();
        for part in std::iter::once(location.bucket.as_str()).chain(location.segments()) {
            let mut components = Path::new(part).components();
            match (components.next(), components.next()) {
                (Some(Component::Normal(_)), None) => path.push(part),
                _ => {
                    return Err(WarehouseError::UnsafeName {
                        name: location.to_string(),
                        reason: format!("segment {part:?} is not a plain name"),
                    });
                }
            }
        }
        Ok(path)
    }
}

impl ObjectStore for LocalObjectStore {
    fn exists(&self, location: &ObjectLocation) -> Result<bool> {
        Ok(self.path_for(location)?.is_file())
    }

    fn read_table(
        &self,
        location: &ObjectLocation,
        format: DelimitedFormat,
    ) -> Result<RecordBatch> {
        let path = self.path_for(location)?;
        if !path.is_file() {
            return Err(WarehouseError::source_access(location, "object does not exist"));
        }
        read_delimited_as_text(&path, format).map_err(|e| match e {
            WarehouseError::SourceAccess { reason, .. } => {
                WarehouseError::source_access(location, reason)
            }
            other => WarehouseError::source_access(location, other),
        })
    }

    fn write(&self, batch: &RecordBatch, destination: &ObjectLocation) -> Result<()> {
        let path = self.path_for(destination)?;
        if let Some(parent) = path.parent() {
            ensure_directory(parent)?;
        }

        // Write next to the target and rename so readers never see a partial file
        let staging = path.with_extension("parquet.partial");
        if let Err(e) = write_parquet(&staging, batch) {
            let _ = fs::remove_file(&staging);
            return Err(e);
        }
        fs::rename(&staging, &path).at_path(&path)
    }
}
