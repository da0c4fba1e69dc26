//! Utility modules
//!
//! Arrow helpers, file IO and logging shared by the stages and the binary.

pub mod arrow;
pub mod io;
pub mod logging;

pub use io::{read_parquet, write_parquet};
pub use logging::{log_operation_complete, log_operation_start, log_warning};
