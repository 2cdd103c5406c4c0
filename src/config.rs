//! Credentials loading.
//!
//! The credentials file is read once at startup and the resulting value is
//! passed explicitly to the Spotify client. The file layout is:
//!
//! ```json
//! {
//!   "spotify_credentials": {
//!     "CLIENT_ID": "…",
//!     "CLIENT_SECRET": "…"
//!   }
//! }
//! ```

use crate::error::{Result, TrackerError};
use serde::Deserialize;
use std::fmt;
use std::path::Path;
use tracing::{info, instrument};

/// Top-level contents of the credentials file.
#[derive(Deserialize)]
pub struct Credentials {
    #[serde(rename = "spotify_credentials")]
    pub spotify: SpotifyCredentials,
}

/// Client-credentials pair of a Spotify developer app.
#[derive(Deserialize, Clone)]
pub struct SpotifyCredentials {
    #[serde(rename = "CLIENT_ID")]
    pub client_id: String,
    #[serde(rename = "CLIENT_SECRET")]
    pub client_secret: String,
}

// Never print the secret.
impl fmt::Debug for SpotifyCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpotifyCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    /// Load and validate the credentials file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::Configuration`] if the file is missing,
    /// unreadable, malformed, or has an empty client id or secret.
    #[instrument(level = "info", skip_all, fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            TrackerError::Configuration(format!(
                "cannot read credentials file {}: {e}",
                path.display()
            ))
        })?;
        let credentials = Self::from_json(&content)?;
        info!(client_id = %credentials.spotify.client_id, "Loaded Spotify credentials");
        Ok(credentials)
    }

    /// Parse and validate credentials from JSON text.
    pub fn from_json(content: &str) -> Result<Self> {
        let credentials: Credentials = serde_json::from_str(content).map_err(|e| {
            TrackerError::Configuration(format!("invalid credentials file: {e}"))
        })?;

        if credentials.spotify.client_id.trim().is_empty() {
            return Err(TrackerError::Configuration("CLIENT_ID is empty".into()));
        }
        if credentials.spotify.client_secret.trim().is_empty() {
            return Err(TrackerError::Configuration("CLIENT_SECRET is empty".into()));
        }
        Ok(credentials)
    }
}
