//! Spotify Web API client.
//!
//! Authenticates once with the OAuth client-credentials grant, then scores
//! reviews with the `popularity` field (0-100) Spotify reports for albums
//! and tracks.
//!
//! # API Reference
//! - Token: `POST https://accounts.spotify.com/api/token`
//! - Search: `GET https://api.spotify.com/v1/search?q=…&type=album&limit=1`
//! - Album: `GET https://api.spotify.com/v1/albums/{id}`
//!
//! Album search results omit `popularity`, so albums take a second request.
//! Track search results carry it directly.

use crate::config::SpotifyCredentials;
use crate::error::{LookupError, Result, TrackerError};
use crate::models::{PopularityScore, ReleaseKind, Review};
use crate::popularity::PopularitySource;
use crate::utils::truncate_for_log;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, error, info, instrument};

/// Spotify Web API base URL
pub const DEFAULT_API_URL: &str = "https://api.spotify.com/v1";

/// Spotify accounts service base URL
pub const DEFAULT_ACCOUNTS_URL: &str = "https://accounts.spotify.com";

/// Where to reach the two Spotify services.
#[derive(Debug, Clone)]
pub struct SpotifyEndpoints {
    pub api_url: String,
    pub accounts_url: String,
}

impl Default for SpotifyEndpoints {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            accounts_url: DEFAULT_ACCOUNTS_URL.to_string(),
        }
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: u64,
}

#[derive(Deserialize)]
struct SearchResponse {
    albums: Option<Paging<AlbumSummary>>,
    tracks: Option<Paging<TrackObject>>,
}

#[derive(Deserialize)]
#[serde(bound = "T: Deserialize<'de>")]
struct Paging<T> {
    // Spotify occasionally returns null entries in search pages.
    #[serde(default)]
    items: Vec<Option<T>>,
}

impl<T> Paging<T> {
    fn first(self) -> Option<T> {
        self.items.into_iter().flatten().next()
    }
}

#[derive(Deserialize)]
struct AlbumSummary {
    id: String,
    name: String,
}

#[derive(Deserialize)]
struct AlbumObject {
    id: String,
    popularity: u32,
    #[serde(default)]
    external_urls: ExternalUrls,
}

#[derive(Deserialize)]
struct TrackObject {
    id: String,
    name: String,
    popularity: u32,
    #[serde(default)]
    external_urls: ExternalUrls,
}

#[derive(Deserialize, Default)]
struct ExternalUrls {
    spotify: Option<String>,
}

/// Authenticated Spotify client.
///
/// Holds the bearer token obtained in [`SpotifyClient::connect`]. Tokens
/// last an hour, longer than any run; a 401 mid-run surfaces as
/// [`LookupError::Unauthorized`].
pub struct SpotifyClient {
    http: Client,
    api_url: String,
    access_token: String,
}

impl SpotifyClient {
    /// Exchange the app credentials for an access token.
    ///
    /// # Errors
    ///
    /// - [`TrackerError::Authentication`] if the accounts service rejects the
    ///   credentials (HTTP 400/401/403) or returns no usable token
    /// - [`TrackerError::Network`] on transport failure or any other status
    #[instrument(level = "info", skip_all, fields(accounts_url = %endpoints.accounts_url))]
    pub async fn connect(
        http: Client,
        credentials: &SpotifyCredentials,
        endpoints: &SpotifyEndpoints,
    ) -> Result<Self> {
        let token_url = format!("{}/api/token", endpoints.accounts_url.trim_end_matches('/'));
        let response = http
            .post(&token_url)
            .basic_auth(&credentials.client_id, Some(&credentials.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(|e| TrackerError::network(&token_url, e))?;

        let status = response.status();
        if matches!(
            status,
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN
        ) {
            let body = response.text().await.unwrap_or_default();
            error!(%status, body = %truncate_for_log(&body, 200), "Spotify rejected the client credentials");
            return Err(TrackerError::Authentication(format!(
                "token request rejected with HTTP {status}"
            )));
        }
        if !status.is_success() {
            return Err(TrackerError::network(&token_url, format!("HTTP {status}")));
        }

        let token: TokenResponse = response.json().await.map_err(|e| {
            TrackerError::Authentication(format!("malformed token response: {e}"))
        })?;
        if token.access_token.is_empty() {
            return Err(TrackerError::Authentication("empty access token".into()));
        }

        info!(expires_in = token.expires_in, "Obtained Spotify access token");
        Ok(Self {
            http,
            api_url: endpoints.api_url.trim_end_matches('/').to_string(),
            access_token: token.access_token,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> std::result::Result<T, LookupError> {
        let response = self
            .http
            .get(url)
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|e| LookupError::Failed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = parse_retry_after(response.headers());
            let body = response.text().await.unwrap_or_default();
            debug!(%status, body = %truncate_for_log(&body, 200), "Spotify request failed");
            return Err(classify_status(status, retry_after));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| LookupError::Failed(format!("decoding response: {e}")))
    }

    async fn lookup_album(&self, review: &Review) -> std::result::Result<PopularityScore, LookupError> {
        let search: SearchResponse = self.get_json(&self.search_url(review)).await?;
        let hit = search
            .albums
            .and_then(Paging::first)
            .ok_or(LookupError::NotFound)?;
        debug!(id = %hit.id, matched = %hit.name, "Album search hit");

        let album: AlbumObject = self
            .get_json(&format!(
                "{}/albums/{}",
                self.api_url,
                urlencoding::encode(&hit.id)
            ))
            .await?;
        Ok(to_score(review, album.id, album.popularity, album.external_urls))
    }

    async fn lookup_track(&self, review: &Review) -> std::result::Result<PopularityScore, LookupError> {
        let search: SearchResponse = self.get_json(&self.search_url(review)).await?;
        let hit = search
            .tracks
            .and_then(Paging::first)
            .ok_or(LookupError::NotFound)?;
        debug!(id = %hit.id, matched = %hit.name, "Track search hit");
        Ok(to_score(review, hit.id, hit.popularity, hit.external_urls))
    }

    fn search_url(&self, review: &Review) -> String {
        format!(
            "{}/search?q={}&type={}&limit=1",
            self.api_url,
            urlencoding::encode(&search_query(review)),
            review.kind.search_type()
        )
    }
}

impl PopularitySource for SpotifyClient {
    #[instrument(level = "info", skip_all, fields(artist = %review.artist, album = %review.album))]
    async fn lookup(&self, review: &Review) -> std::result::Result<PopularityScore, LookupError> {
        match review.kind {
            ReleaseKind::Album => self.lookup_album(review).await,
            ReleaseKind::Track => self.lookup_track(review).await,
        }
    }
}

/// Field-filtered search query, e.g. `album:Ants From Up There artist:Black Country, New Road`.
/// Only the first credited artist is used; Spotify matches collaborations on any of them.
fn search_query(review: &Review) -> String {
    let artist = review.artists.first().unwrap_or(&review.artist);
    format!("{}:{} artist:{}", review.kind.search_type(), review.album, artist)
}

fn to_score(review: &Review, id: String, popularity: u32, urls: ExternalUrls) -> PopularityScore {
    PopularityScore {
        album_key: review.key(),
        score: popularity.min(100) as u8,
        spotify_id: id,
        spotify_url: urls.spotify,
    }
}

/// Map a non-success API status onto a lookup error.
pub fn classify_status(status: StatusCode, retry_after: Option<Duration>) -> LookupError {
    match status.as_u16() {
        401 | 403 => LookupError::Unauthorized(format!("HTTP {status}")),
        404 => LookupError::NotFound,
        429 => LookupError::RateLimited { retry_after },
        code @ 500..=599 => LookupError::Server(code),
        _ => LookupError::Failed(format!("unexpected HTTP {status}")),
    }
}

/// `Retry-After` in its delay-seconds form. HTTP-date values are ignored.
fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}
