//! Utility functions for text cleanup, log formatting, and file system checks.
//!
//! This module provides helper functions used throughout the application:
//! - Text normalization for names scraped out of markup
//! - String truncation for logging response bodies
//! - File system validation for the output directory

use once_cell::sync::Lazy;
use regex::Regex;
use std::fs as stdfs;
use tokio::fs;
use tracing::{info, instrument};

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static CURLY_QUOTES: Lazy<Regex> = Lazy::new(|| Regex::new(r"[“”]").unwrap());

/// Collapse runs of whitespace (including newlines from nested markup) into
/// single spaces and trim both ends.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(clean_text("  Black \n  Country,\tNew Road "), "Black Country, New Road");
/// ```
pub fn clean_text(s: &str) -> String {
    WHITESPACE.replace_all(s, " ").trim().to_string()
}

/// Strip the curly quotes the review site wraps track titles in, then
/// normalize whitespace.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(clean_title("“Vampire Empire”"), "Vampire Empire");
/// ```
pub fn clean_title(s: &str) -> String {
    clean_text(&CURLY_QUOTES.replace_all(s, ""))
}

/// Truncate a string for logging purposes.
///
/// Long strings are truncated to at most `max` bytes (backing off to a
/// character boundary) with an ellipsis and byte count indicator appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log("a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…(+{} bytes)", &s[..end], s.len() - end)
}

/// Ensure a directory exists and is writable.
///
/// Creates the directory if needed, then creates and removes a probe file.
/// Called before any network traffic so a bad output path fails fast.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or is not writable.
#[instrument(level = "info", skip_all, fields(path = %path))]
pub async fn ensure_writable_dir(path: &str) -> std::io::Result<()> {
    fs::create_dir_all(path).await?;
    // Try a small sync write using std fs (simpler error surface)
    let probe_path = format!("{}/..__probe_write__", path.trim_end_matches('/'));
    stdfs::File::create(&probe_path)?;
    let _ = stdfs::remove_file(&probe_path);
    info!("Output directory is writable");
    Ok(())
}
