//! Data models for scraped reviews and their ranked representations.
//!
//! This module defines the core data structures used throughout the application:
//! - [`Review`]: One listing entry scraped from the review site
//! - [`PopularityScore`]: The streaming service's popularity for a review
//! - [`RankedEntry`]: A review paired with its (possibly absent) score
//! - [`Chart`]: The ordered collection emitted at the end of a run

use chrono::NaiveDate;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which review listing an entry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
pub enum ReleaseKind {
    #[serde(rename = "albums")]
    #[value(name = "albums")]
    Album,
    #[serde(rename = "tracks")]
    #[value(name = "tracks")]
    Track,
}

impl ReleaseKind {
    /// Path segment of the listing on the review site (`albums` / `tracks`).
    pub fn listing_segment(&self) -> &'static str {
        match self {
            ReleaseKind::Album => "albums",
            ReleaseKind::Track => "tracks",
        }
    }

    /// Item type understood by the Spotify search endpoint.
    pub fn search_type(&self) -> &'static str {
        match self {
            ReleaseKind::Album => "album",
            ReleaseKind::Track => "track",
        }
    }
}

impl fmt::Display for ReleaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.listing_segment())
    }
}

/// A single review entry extracted from a listing page.
///
/// `artist` is the display credit (all `artists` joined with `", "`); the
/// parser guarantees both it and `album` are non-empty. For track listings
/// `album` holds the track title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub artist: String,
    pub artists: Vec<String>,
    pub album: String,
    /// Publication date of the review, when the listing shows one.
    pub published: Option<NaiveDate>,
    pub source_url: String,
    pub kind: ReleaseKind,
}

impl Review {
    /// Key identifying this release within a run.
    pub fn key(&self) -> AlbumKey {
        AlbumKey {
            artist: self.artist.clone(),
            album: self.album.clone(),
        }
    }
}

/// `(artist, album)` pair used to tie a score back to its review.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AlbumKey {
    pub artist: String,
    pub album: String,
}

/// Popularity of a release as reported by Spotify.
///
/// # Fields
///
/// * `score` - Spotify popularity, 0 (obscure) to 100 (most popular)
/// * `spotify_id` - The matched album or track id
/// * `spotify_url` - Public link to the match, when provided
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopularityScore {
    pub album_key: AlbumKey,
    pub score: u8,
    pub spotify_id: String,
    pub spotify_url: Option<String>,
}

/// A review plus its popularity. `popularity` is `None` when the lookup
/// missed, was rate limited past its retry budget, or otherwise failed
/// non-fatally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedEntry {
    pub review: Review,
    pub popularity: Option<PopularityScore>,
}

impl RankedEntry {
    pub fn score(&self) -> Option<u8> {
        self.popularity.as_ref().map(|p| p.score)
    }
}

/// The document emitted by one run, consumed by the front end.
#[derive(Debug, Serialize, Deserialize)]
pub struct Chart {
    /// The date of the run in `YYYY-MM-DD` format.
    pub local_date: String,
    /// The local time of the run in `HH:MM:SS` format.
    pub local_time: String,
    /// Base URL of the scraped review site.
    pub source: String,
    pub kind: ReleaseKind,
    /// Entries ordered by popularity, most popular first.
    pub entries: Vec<RankedEntry>,
}
