//! # Album Pulse
//!
//! Lists newly reviewed albums scraped from Pitchfork and ranks them by the
//! popularity Spotify reports for each one.
//!
//! ## Usage
//!
//! ```sh
//! album_pulse -c credentials.json -o ./site/data
//! ```
//!
//! ## Architecture
//!
//! The application is a linear pipeline, each stage awaited before the next:
//! 1. **Fetching**: Download the review listing pages
//! 2. **Parsing**: Extract artist, title, date and link per listing entry
//! 3. **Annotating**: Look up each release's Spotify popularity
//! 4. **Ranking**: Sort by popularity and emit a JSON chart

use clap::Parser;
use std::error::Error;
use std::process::ExitCode;
use tracing::{debug, error, info};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod aggregate;
mod cli;
mod config;
mod error;
mod models;
mod outputs;
mod pipeline;
mod popularity;
mod scrapers;
mod utils;

#[cfg(test)]
mod test_support;

use cli::Cli;
use outputs::json;
use pipeline::Settings;
use utils::ensure_writable_dir;

#[tokio::main]
async fn main() -> ExitCode {
    // --- Tracing init (stderr, so stdout stays clean for JSON) ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    exit_status(run(args).await)
}

/// Logs a fatal error exactly once and maps the run outcome to an exit code.
fn exit_status(outcome: Result<(), Box<dyn Error>>) -> ExitCode {
    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Run aborted");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Cli) -> Result<(), Box<dyn Error>> {
    let start_time = std::time::Instant::now();
    info!("album_pulse starting up");

    // Early check: a bad output path should fail before any network traffic
    if let Some(dir) = &args.output_dir {
        ensure_writable_dir(dir).await.map_err(|e| {
            format!("output directory {dir} is not writable (fix perms or choose a different path): {e}")
        })?;
    }

    let settings = Settings::from(&args);
    let chart = pipeline::run(&settings).await?;

    match &args.output_dir {
        Some(dir) => {
            let path = json::write_chart(&chart, dir).await?;
            info!(path = %path.display(), "Chart written");
        }
        None => json::print_chart(&chart, std::io::stdout().lock())?,
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        entries = chart.entries.len(),
        "Execution complete"
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TrackerError;

    #[test]
    fn test_exit_status_success() {
        assert_eq!(exit_status(Ok(())), ExitCode::SUCCESS);
    }

    #[test]
    fn test_exit_status_fatal_error_fails() {
        let err = TrackerError::Authentication("invalid_client".to_string());
        assert_eq!(exit_status(Err(err.into())), ExitCode::FAILURE);
    }

    #[tokio::test]
    async fn test_unwritable_output_dir_aborts_run() {
        let dir = std::env::temp_dir().join(format!("album_pulse_main_{}", std::process::id()));
        std::fs::write(&dir, b"not a directory").unwrap();

        let args = Cli::parse_from(["album_pulse", "-o", dir.to_str().unwrap()]);
        let err = run(args).await.unwrap_err();
        assert!(err.to_string().contains("not writable"));

        std::fs::remove_file(&dir).unwrap();
    }
}
