//! The end-to-end run: credentials → token → listings → lookups → ranking.
//!
//! Every stage finishes before the next starts. Credentials are loaded
//! before any network call, and the token exchange happens before the
//! listing is scraped, so bad credentials never cost a scrape.

use crate::aggregate::rank;
use crate::cli::Cli;
use crate::config::Credentials;
use crate::error::{Result, TrackerError};
use crate::models::{Chart, ReleaseKind};
use crate::popularity::spotify::{SpotifyClient, SpotifyEndpoints};
use crate::popularity::{PopularitySource, RetryLookup, annotate};
use crate::scrapers::pitchfork::index_reviews;
use chrono::Local;
use reqwest::Client;
use std::time::Duration;
use tracing::{info, instrument};

/// Everything a run needs, resolved from the command line.
#[derive(Debug, Clone)]
pub struct Settings {
    pub credentials_path: String,
    pub base_url: String,
    pub kind: ReleaseKind,
    pub pages: u32,
    pub endpoints: SpotifyEndpoints,
    pub max_retries: usize,
    pub retry_base_delay: Duration,
    pub timeout: Option<Duration>,
}

impl From<&Cli> for Settings {
    fn from(cli: &Cli) -> Self {
        Self {
            credentials_path: cli.credentials.clone(),
            base_url: cli.base_url.clone(),
            kind: cli.kind,
            pages: cli.pages,
            endpoints: SpotifyEndpoints {
                api_url: cli.api_url.clone(),
                accounts_url: cli.accounts_url.clone(),
            },
            max_retries: cli.max_retries,
            retry_base_delay: Duration::from_millis(cli.retry_base_ms),
            timeout: cli.timeout_secs.map(Duration::from_secs),
        }
    }
}

/// Build the single HTTP client shared by every stage.
pub fn build_client(timeout: Option<Duration>) -> Result<Client> {
    let mut builder = Client::builder().user_agent(concat!(
        env!("CARGO_PKG_NAME"),
        "/",
        env!("CARGO_PKG_VERSION")
    ));
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    builder
        .build()
        .map_err(|e| TrackerError::Configuration(format!("cannot build HTTP client: {e}")))
}

/// Run the whole pipeline against Spotify.
#[instrument(level = "info", skip_all, fields(kind = %settings.kind, pages = settings.pages))]
pub async fn run(settings: &Settings) -> Result<Chart> {
    let credentials = Credentials::load(&settings.credentials_path)?;
    let http = build_client(settings.timeout)?;

    let spotify = SpotifyClient::connect(http.clone(), &credentials.spotify, &settings.endpoints).await?;
    let source = RetryLookup::new(spotify, settings.max_retries, settings.retry_base_delay);

    build_chart(&http, &source, settings).await
}

/// Scrape, score and rank with an already-authenticated `source`.
pub async fn build_chart<S>(http: &Client, source: &S, settings: &Settings) -> Result<Chart>
where
    S: PopularitySource,
{
    let reviews = index_reviews(http, &settings.base_url, settings.kind, settings.pages).await?;
    let annotated = annotate(source, reviews).await?;
    let entries = rank(annotated);

    let now = Local::now();
    let chart = Chart {
        local_date: now.date_naive().to_string(),
        local_time: now.time().format("%H:%M:%S").to_string(),
        source: settings.base_url.clone(),
        kind: settings.kind,
        entries,
    };
    info!(
        entries = chart.entries.len(),
        local_date = %chart.local_date,
        "Chart assembled"
    );
    Ok(chart)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LookupError;
    use crate::popularity::tests::FakeSource;
    use crate::test_support::{http_response, serve, test_client};
    use clap::Parser;

    const PAGE: &str = r#"
<div class="review"><a href="/reviews/albums/a/"><ul class="artist-list"><li>Artist W</li></ul><h2>Album W</h2></a></div>
<div class="review"><a href="/reviews/albums/y/"><ul class="artist-list"><li>Artist X</li></ul><h2>Album Y</h2></a></div>
<div class="review"><a href="/reviews/albums/z/"><ul class="artist-list"><li>Artist Z</li></ul><h2>Album Z</h2></a></div>
"#;

    fn settings(base_url: &str) -> Settings {
        let mut settings = Settings::from(&Cli::parse_from(["album_pulse", "--pages", "1"]));
        settings.base_url = base_url.to_string();
        settings
    }

    #[test]
    fn test_settings_from_cli() {
        let cli = Cli::parse_from(["album_pulse", "--retry-base-ms", "250", "--timeout-secs", "10"]);
        let settings = Settings::from(&cli);
        assert_eq!(settings.retry_base_delay, Duration::from_millis(250));
        assert_eq!(settings.timeout, Some(Duration::from_secs(10)));
        assert_eq!(settings.endpoints.api_url, "https://api.spotify.com/v1");
    }

    #[tokio::test]
    async fn test_build_chart_ranks_and_keeps_misses() {
        let (base, server) = serve(vec![http_response(200, &[], PAGE)]).await;
        let source = FakeSource::default()
            .with("Album W", vec![Ok(20)])
            .with("Album Y", vec![Err(LookupError::NotFound)])
            .with("Album Z", vec![Ok(75)]);

        let chart = build_chart(&test_client(), &source, &settings(&base)).await.unwrap();

        let order = chart
            .entries
            .iter()
            .map(|e| (e.review.album.as_str(), e.score()))
            .collect::<Vec<_>>();
        assert_eq!(
            order,
            vec![("Album Z", Some(75)), ("Album W", Some(20)), ("Album Y", None)]
        );
        assert_eq!(source.calls.borrow().len(), 3);
        assert_eq!(chart.kind, ReleaseKind::Album);
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_build_chart_fetch_failure_skips_lookups() {
        let (base, server) = serve(vec![http_response(404, &[], "gone")]).await;
        let source = FakeSource::default();

        let err = build_chart(&test_client(), &source, &settings(&base)).await.unwrap_err();

        assert!(matches!(err, TrackerError::Network { .. }));
        assert!(source.calls.borrow().is_empty());
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_run_missing_credentials_is_configuration_error() {
        let mut settings = settings("http://127.0.0.1:9");
        settings.credentials_path = "/nonexistent/album_pulse/credentials.json".into();

        let err = run(&settings).await.unwrap_err();
        assert!(matches!(err, TrackerError::Configuration(_)));
    }
}
