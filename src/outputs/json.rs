//! JSON output for the front end.
//!
//! Charts are organized by run date, one file per listing kind:
//! ```text
//! output_dir/
//! └── 2026-10-16/
//!     ├── albums.json
//!     └── tracks.json
//! ```
//!
//! A second run on the same day overwrites that day's file.

use crate::error::Result;
use crate::models::Chart;
use std::io::Write;
use std::path::PathBuf;
use tokio::fs;
use tracing::{error, info, instrument};

/// Write a [`Chart`] to `{output_dir}/{local_date}/{kind}.json`.
///
/// # Returns
///
/// The path written.
#[instrument(level = "info", skip_all, fields(output_dir = %output_dir))]
pub async fn write_chart(chart: &Chart, output_dir: &str) -> Result<PathBuf> {
    let json = serde_json::to_string_pretty(chart)?;

    let dated_dir = PathBuf::from(output_dir).join(&chart.local_date);
    info!(dir = %dated_dir.display(), "Ensuring JSON directory exists");
    if let Err(e) = fs::create_dir_all(&dated_dir).await {
        error!(dir = %dated_dir.display(), error = %e, "Failed to create JSON dir");
        return Err(e.into());
    }

    let path = dated_dir.join(format!("{}.json", chart.kind));
    fs::write(&path, json).await?;
    info!(path = %path.display(), entries = chart.entries.len(), "Wrote chart JSON");

    Ok(path)
}

/// Pretty-print a [`Chart`] to `out` (stdout in the binary).
pub fn print_chart(chart: &Chart, mut out: impl Write) -> Result<()> {
    serde_json::to_writer_pretty(&mut out, chart)?;
    writeln!(out)?;
    Ok(())
}
