//! Logging utilities
//!
//! This module provides standardized logging functions for file operations and
//! pipeline stages.

use std::fmt::Display;
use std::path::Path;
use std::time::Duration;

/// Log an operation start with consistent format
///
/// # Arguments
/// * `operation` - Description of the operation
/// * `path` - Path of the file or directory being operated on
pub fn log_operation_start(operation: &str, path: &Path) {
    log::debug!("{} {}", operation, path.display());
}

/// Log an operation completion with consistent format
///
/// # Arguments
/// * `operation` - Description of the operation
/// * `path` - Path of the file or directory that was operated on
/// * `items` - Number of rows processed
/// * `elapsed` - Optional elapsed time
pub fn log_operation_complete(
    operation: &str,
    path: &Path,
    items: usize,
    elapsed: Option<Duration>,
) {
    if let Some(duration) = elapsed {
        log::debug!(
            "Successfully {} {} rows at {} in {:?}",
            operation,
            items,
            path.display(),
            duration
        );
    } else {
        log::debug!("Successfully {} {} rows at {}", operation, items, path.display());
    }
}

/// Log a warning with an optional subject (a path, a location, a relation)
pub fn log_warning(message: &str, subject: Option<&dyn Display>) {
    if let Some(subject) = subject {
        log::warn!("{message}: {subject}");
    } else {
        log::warn!("{message}");
    }
}

/// Log the start of a pipeline stage
pub fn log_stage_start(stage: &str) {
    log::info!("Stage {stage}: starting");
}

/// Log the completion of a pipeline stage with the rows it produced
pub fn log_stage_complete(stage: &str, rows: usize, elapsed: Duration) {
    log::info!("Stage {stage}: completed with {rows} rows in {elapsed:?}");
}
