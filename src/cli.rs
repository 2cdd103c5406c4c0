//! Command-line interface definitions for Album Pulse.
//!
//! All options have sensible defaults; only the credentials file must exist
//! on disk. Options that carry secrets or paths can also be provided via
//! environment variables.

use crate::models::ReleaseKind;
use crate::popularity::spotify::{DEFAULT_ACCOUNTS_URL, DEFAULT_API_URL};
use crate::popularity::{DEFAULT_BASE_DELAY, DEFAULT_MAX_RETRIES};
use clap::Parser;

/// Command-line arguments for the Album Pulse application.
///
/// # Examples
///
/// ```sh
/// # Rank the first three pages of album reviews, print JSON to stdout
/// album_pulse -c credentials.json
///
/// # Rank track reviews and write JSON to ./site/data
/// album_pulse -c credentials.json -k tracks -o ./site/data
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Path to the JSON credentials file
    #[arg(short, long, env = "ALBUM_PULSE_CREDENTIALS", default_value = "credentials.json")]
    pub credentials: String,

    /// Output directory for the JSON chart; prints to stdout when omitted
    #[arg(short, long)]
    pub output_dir: Option<String>,

    /// Which review listing to scan
    #[arg(short, long, value_enum, default_value_t = ReleaseKind::Album)]
    pub kind: ReleaseKind,

    /// Number of listing pages to scan, starting at page 1
    #[arg(short, long, default_value_t = 3, value_parser = clap::value_parser!(u32).range(1..))]
    pub pages: u32,

    /// Base URL of the review site
    #[arg(long, default_value = "https://pitchfork.com")]
    pub base_url: String,

    /// Base URL of the Spotify Web API
    #[arg(long, default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// Base URL of the Spotify accounts service
    #[arg(long, default_value = DEFAULT_ACCOUNTS_URL)]
    pub accounts_url: String,

    /// Retries per lookup after a rate-limit or server error
    #[arg(long, default_value_t = DEFAULT_MAX_RETRIES)]
    pub max_retries: usize,

    /// Initial backoff delay in milliseconds (doubles per retry)
    #[arg(long, default_value_t = DEFAULT_BASE_DELAY.as_millis() as u64)]
    pub retry_base_ms: u64,

    /// Per-request timeout in seconds (client default when omitted)
    #[arg(long)]
    pub timeout_secs: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["album_pulse"]);

        assert_eq!(cli.credentials, "credentials.json");
        assert_eq!(cli.output_dir, None);
        assert_eq!(cli.kind, ReleaseKind::Album);
        assert_eq!(cli.pages, 3);
        assert_eq!(cli.base_url, "https://pitchfork.com");
        assert_eq!(cli.max_retries, 3);
        assert_eq!(cli.retry_base_ms, 1000);
        assert_eq!(cli.timeout_secs, None);
    }

    #[test]
    fn test_cli_short_flags() {
        let cli = Cli::parse_from([
            "album_pulse",
            "-c",
            "/etc/pulse/creds.json",
            "-o",
            "/tmp/charts",
            "-k",
            "tracks",
            "-p",
            "1",
        ]);

        assert_eq!(cli.credentials, "/etc/pulse/creds.json");
        assert_eq!(cli.output_dir.as_deref(), Some("/tmp/charts"));
        assert_eq!(cli.kind, ReleaseKind::Track);
        assert_eq!(cli.pages, 1);
    }

    #[test]
    fn test_cli_rejects_zero_pages() {
        assert!(Cli::try_parse_from(["album_pulse", "--pages", "0"]).is_err());
    }
}
