//! Progress reporting for pipeline runs
//!
//! Spinners are only drawn when enabled; otherwise a hidden bar is returned so
//! callers never branch on whether progress is shown.

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Template of the stage spinner
pub const SPINNER_TEMPLATE: &str = "{spinner:.green} [{elapsed_precise}] {msg}";

/// Create a stage spinner
///
/// # Arguments
/// * `message` - Message shown next to the spinner
/// * `visible` - Whether to draw anything at all
///
/// # Returns
/// A configured spinner `ProgressBar`, hidden when `visible` is false
#[must_use]
pub fn create_spinner(message: &str, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new_spinner();
    match ProgressStyle::default_spinner().template(SPINNER_TEMPLATE) {
        Ok(style) => pb.set_style(style),
        Err(e) => log::debug!("Falling back to default spinner style: {e}"),
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Finish a progress bar with a completion message
///
/// # Arguments
/// * `pb` - The `ProgressBar` to finish
/// * `message` - Optional completion message
pub fn finish_progress_bar(pb: &ProgressBar, message: Option<&str>) {
    if let Some(msg) = message {
        pb.finish_with_message(msg.to_string());
    } else {
        pb.finish();
    }
}

