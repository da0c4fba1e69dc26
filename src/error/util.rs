//! Utility functions for error handling
//!
//! Helpers that attach the offending path to IO failures.

use std::fs;
use std::io;
use std::path::Path;

use crate::error::{Result, WarehouseError};

/// Attach a path to IO errors
pub trait IoResultExt<T> {
    /// Convert an IO error into [`WarehouseError::IoAt`] carrying `path`
    fn at_path(self, path: &Path) -> Result<T>;
}

impl<T> IoResultExt<T> for io::Result<T> {
    fn at_path(self, path: &Path) -> Result<T> {
        self.map_err(|source| WarehouseError::IoAt {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Open a file for reading, reporting why it was needed when it cannot be opened
///
/// A missing file is reported as a source-access error so that callers can
/// distinguish "not there" from "broken".
pub fn safe_open_file(path: &Path, purpose: &str) -> Result<fs::File> {
    if !path.exists() {
        return Err(WarehouseError::source_access(
            path.display(),
            format!("file not found (needed for {purpose})"),
        ));
    }
    if !path.is_file() {
        return Err(WarehouseError::source_access(
            path.display(),
            format!("path is not a file (needed for {purpose})"),
        ));
    }

    fs::File::open(path).map_err(|e| {
        let reason = match e.kind() {
            io::ErrorKind::PermissionDenied => "permission denied".to_string(),
            io::ErrorKind::NotFound => "file disappeared while opening".to_string(),
            _ => format!("failed to open file for {purpose}: {e}"),
        };
        WarehouseError::source_access(path.display(), reason)
    })
}

/// Create a directory (and parents) if it does not exist yet
pub fn ensure_directory(path: &Path) -> Result<()> {
    if path.is_dir() {
        return Ok(());
    }
    fs::create_dir_all(path).at_path(path)
}
