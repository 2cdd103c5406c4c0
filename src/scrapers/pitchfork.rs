//! Pitchfork review listing scraper.
//!
//! Scrapes the paginated review listings at
//! [`/reviews/albums/`](https://pitchfork.com/reviews/albums/) and
//! [`/reviews/tracks/`](https://pitchfork.com/reviews/tracks/).
//!
//! # Markup
//!
//! Album listings wrap each entry in a `.review` element:
//!
//! ```html
//! <div class="review">
//!   <a href="/reviews/albums/slug/" class="review__link">
//!     <ul class="artist-list review__title-artist"><li>Artist</li></ul>
//!     <h2 class="review__title-album">Album</h2>
//!   </a>
//!   <div class="review__meta">
//!     <ul class="genre-list"><li>Rock</li></ul>
//!     <time class="pub-date" datetime="2019-05-06T05:00:00">May 6 2019</time>
//!   </div>
//! </div>
//! ```
//!
//! On track listings each `.artist-list` is an entry and the title is the
//! `h2` that follows it. Link and date come from the entry's
//! `.track-collection-item` wrapper, or the nearest ancestor holding both.

use crate::error::{Result, TrackerError};
use crate::models::{ReleaseKind, Review};
use crate::scrapers::fetch_page;
use crate::utils::{clean_text, clean_title};
use chrono::{DateTime, NaiveDate};
use futures::stream::{self, StreamExt, TryStreamExt};
use itertools::Itertools;
use once_cell::sync::Lazy;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info, instrument, warn};
use url::Url;

static REVIEW: Lazy<Selector> = Lazy::new(|| Selector::parse(".review").unwrap());
static ARTIST_LIST: Lazy<Selector> = Lazy::new(|| Selector::parse(".artist-list").unwrap());
static ARTIST_ITEM: Lazy<Selector> = Lazy::new(|| Selector::parse(".artist-list li").unwrap());
static LIST_ITEM: Lazy<Selector> = Lazy::new(|| Selector::parse("li").unwrap());
static TITLE: Lazy<Selector> = Lazy::new(|| Selector::parse("h2").unwrap());
static TIME: Lazy<Selector> = Lazy::new(|| Selector::parse("time").unwrap());
static TRACK_ITEM: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".track-collection-item").unwrap());
static LINK: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").unwrap());

const TEXT_DATE_FORMATS: [&str; 2] = ["%B %d %Y", "%B %d, %Y"];

/// Build the URL of one listing page, e.g.
/// `https://pitchfork.com/reviews/albums/?page=2`.
pub fn listing_url(base: &Url, kind: ReleaseKind, page: u32) -> Result<Url> {
    let mut url = base
        .join(&format!("/reviews/{}/", kind.listing_segment()))
        .map_err(|e| TrackerError::Configuration(format!("invalid base URL {base}: {e}")))?;
    url.query_pairs_mut().append_pair("page", &page.to_string());
    Ok(url)
}

/// Fetch and parse `pages` listing pages (1..=pages) one after another.
///
/// Entries repeated across pages (same artist and title) are kept once, at
/// their first position.
///
/// # Errors
///
/// Fails on an unparsable base URL or on the first page that cannot be
/// fetched; nothing from earlier pages is returned in that case.
#[instrument(level = "info", skip(client))]
pub async fn index_reviews(
    client: &Client,
    base_url: &str,
    kind: ReleaseKind,
    pages: u32,
) -> Result<Vec<Review>> {
    let base = Url::parse(base_url)
        .map_err(|e| TrackerError::Configuration(format!("invalid base URL {base_url}: {e}")))?;
    let base = &base;

    let per_page: Vec<Vec<Review>> = stream::iter(1..=pages)
        .then(move |page| async move {
            let url = listing_url(base, kind, page)?;
            let html = fetch_page(client, url.as_str()).await?;
            let reviews = parse_reviews(&html, base, kind);
            info!(page, count = reviews.len(), "Parsed listing page");
            Ok::<_, TrackerError>(reviews)
        })
        .try_collect()
        .await?;

    let total: usize = per_page.iter().map(Vec::len).sum();
    let reviews = per_page
        .into_iter()
        .flatten()
        .unique_by(Review::key)
        .collect::<Vec<_>>();

    info!(
        count = reviews.len(),
        duplicates = total - reviews.len(),
        source = base_url,
        "Indexed reviews"
    );
    Ok(reviews)
}

/// Parse a listing page into reviews, in page order.
///
/// Entries without an artist or a title are skipped with a warning. `base`
/// resolves relative review links.
pub fn parse_reviews(html: &str, base: &Url, kind: ReleaseKind) -> Vec<Review> {
    let document = Html::parse_document(html);
    match kind {
        ReleaseKind::Album => parse_album_listing(&document, base),
        ReleaseKind::Track => parse_track_listing(&document, base),
    }
}

fn parse_album_listing(document: &Html, base: &Url) -> Vec<Review> {
    document
        .select(&REVIEW)
        .enumerate()
        .filter_map(|(index, entry)| {
            let artists = entry
                .select(&ARTIST_ITEM)
                .map(|li| clean_text(&li.text().collect::<String>()))
                .filter(|name| !name.is_empty())
                .collect::<Vec<_>>();
            let title = entry
                .select(&TITLE)
                .next()
                .map(|h2| clean_title(&h2.text().collect::<String>()))
                .unwrap_or_default();

            build_review(index, artists, title, entry, base, ReleaseKind::Album)
        })
        .collect()
}

fn parse_track_listing(document: &Html, base: &Url) -> Vec<Review> {
    document
        .select(&ARTIST_LIST)
        .enumerate()
        .filter_map(|(index, list)| {
            let artists = list
                .select(&LIST_ITEM)
                .map(|li| clean_text(&li.text().collect::<String>()))
                .filter(|name| !name.is_empty())
                .collect::<Vec<_>>();
            let title = list
                .next_siblings()
                .filter_map(ElementRef::wrap)
                .find(|sibling| sibling.value().name() == "h2")
                .map(|h2| clean_title(&h2.text().collect::<String>()))
                .unwrap_or_default();

            build_review(index, artists, title, entry_scope(list), base, ReleaseKind::Track)
        })
        .collect()
}

/// Enclosing element of a track entry: the `.track-collection-item`
/// wrapper, else the nearest ancestor holding both a link and a date.
/// Never climbs into `<body>` or past an element holding another entry's
/// artist list, so page chrome cannot lend its link or date.
fn entry_scope(list: ElementRef<'_>) -> ElementRef<'_> {
    let mut scope = list;
    for node in list.ancestors() {
        let Some(element) = ElementRef::wrap(node) else {
            break;
        };
        if matches!(element.value().name(), "body" | "html")
            || element.select(&ARTIST_LIST).nth(1).is_some()
        {
            break;
        }
        scope = element;
        let has_link = LINK.matches(&scope) || scope.select(&LINK).next().is_some();
        if TRACK_ITEM.matches(&scope) || (has_link && scope.select(&TIME).next().is_some()) {
            break;
        }
    }
    scope
}

fn build_review(
    index: usize,
    artists: Vec<String>,
    title: String,
    scope: ElementRef<'_>,
    base: &Url,
    kind: ReleaseKind,
) -> Option<Review> {
    if artists.is_empty() {
        warn!(index, %title, "Skipping listing without an artist");
        return None;
    }
    if title.is_empty() {
        warn!(index, artists = ?artists, "Skipping listing without a title");
        return None;
    }

    let link = if LINK.matches(&scope) {
        Some(scope)
    } else {
        scope.select(&LINK).next()
    };
    let source_url = link
        .and_then(|a| a.value().attr("href"))
        .and_then(|href| base.join(href).ok())
        .map(|url| url.to_string())
        .unwrap_or_else(|| base.to_string());

    let published = scope.select(&TIME).next().and_then(|time| {
        time.value()
            .attr("datetime")
            .and_then(parse_date)
            .or_else(|| parse_date(&clean_text(&time.text().collect::<String>())))
    });
    if published.is_none() {
        debug!(index, %title, "Listing has no readable publish date");
    }

    Some(Review {
        artist: artists.join(", "),
        artists,
        album: title,
        published,
        source_url,
        kind,
    })
}

/// Parse the date forms the listing uses: RFC 3339, a bare
/// `YYYY-MM-DDThh:mm:ss` timestamp, or text like `May 6 2019`.
fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(datetime) = DateTime::parse_from_rfc3339(raw) {
        return Some(datetime.date_naive());
    }
    if let Some(date) = raw
        .get(..10)
        .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
    {
        return Some(date);
    }
    TEXT_DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
}
