//! Helpers shared by the fetch, convert and rewrite flows.

use crate::error::{Result, SweepError};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;

/// Fail with `DirectoryNotFound` unless `path` is an existing directory.
pub fn require_directory(path: &Path) -> Result<()> {
    if !path.is_dir() {
        return Err(SweepError::DirectoryNotFound(path.to_path_buf()));
    }
    Ok(())
}

/// Create a progress spinner with consistent styling
pub fn create_progress_spinner(message: &str) -> ProgressBar {
    let pb = if crate::logger::is_quiet() {
        ProgressBar::hidden()
    } else {
        ProgressBar::new_spinner()
    };
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb
}

/// Create a bounded progress bar, hidden in quiet mode
pub fn create_progress_bar(len: u64) -> ProgressBar {
    if crate::logger::is_quiet() {
        ProgressBar::hidden()
    } else {
        ProgressBar::new(len)
    }
}

/// Format file size in human-readable format
///
/// # Arguments
/// * `bytes` - Size in bytes
///
/// # Returns
/// * Human-readable size string (e.g., "1.2 MB", "512 B")
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    const THRESHOLD: f64 = 1024.0;

    if bytes == 0 {
        return "0 B".to_string();
    }

    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= THRESHOLD && unit_index < UNITS.len() - 1 {
        size /= THRESHOLD;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS[unit_index])
    } else {
        format!("{:.1} {}", size, UNITS[unit_index])
    }
}

/// Percentage saved going from `original_size` to `new_size`.
/// Negative when the file grew.
pub fn calculate_savings_ratio(original_size: u64, new_size: u64) -> f64 {
    if original_size == 0 {
        return 0.0;
    }
    ((original_size as f64 - new_size as f64) / original_size as f64) * 100.0
}

pub fn rule(width: usize) -> String {
    "=".repeat(width)
}
