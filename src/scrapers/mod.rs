//! Review site scrapers.
//!
//! Scraping follows a two-phase pattern:
//!
//! 1. **Fetching**: [`fetch_page`] downloads one listing page as text
//! 2. **Parsing**: the site module turns that markup into [`Review`] records
//!
//! # Supported Sources
//!
//! | Source | Module | Listings |
//! |--------|--------|----------|
//! | Pitchfork | [`pitchfork`] | `/reviews/albums/`, `/reviews/tracks/` |
//!
//! Fetch failures are fatal for the run. A malformed listing entry is
//! logged and skipped.
//!
//! [`Review`]: crate::models::Review

pub mod pitchfork;

use crate::error::{Result, TrackerError};
use crate::utils::truncate_for_log;
use reqwest::Client;
use tracing::{debug, error, instrument};

/// Fetch a page with a single GET and return its body.
///
/// # Errors
///
/// Returns [`TrackerError::Network`] on transport failure, timeout, or a
/// non-success status. There are no retries.
#[instrument(level = "info", skip(client))]
pub async fn fetch_page(client: &Client, url: &str) -> Result<String> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| TrackerError::network(url, e))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        error!(%status, body = %truncate_for_log(&body, 200), "Listing fetch returned an error status");
        return Err(TrackerError::network(url, format!("HTTP {status}")));
    }

    let body = response
        .text()
        .await
        .map_err(|e| TrackerError::network(url, e))?;
    debug!(bytes = body.len(), "Fetched page");
    Ok(body)
}
