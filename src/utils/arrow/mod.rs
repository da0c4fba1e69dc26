//! Arrow data handling utilities
//!
//! This module contains utilities for looking up and downcasting columns of
//! record batches.

pub mod array_utils;

// Re-export commonly used functions for convenience
pub use array_utils::{downcast_array, find_column, get_column, non_blank, text_column};
