//! Popularity lookups with bounded retry.
//!
//! # Architecture
//!
//! - [`PopularitySource`]: core trait, one lookup per review
//! - [`spotify::SpotifyClient`]: the Spotify Web API implementation
//! - [`RetryLookup`]: decorator that retries rate-limited and server errors
//! - [`annotate`]: walks the reviews sequentially and pairs each with its score
//!
//! # Retry Strategy
//!
//! - 3 retries by default
//! - Exponential backoff starting at 1 second, capped at 30 seconds
//! - A `Retry-After` hint replaces the computed delay (still capped)
//! - Random jitter (0-250ms) added to every delay

pub mod spotify;

use crate::error::{LookupError, Result, TrackerError};
use crate::models::{PopularityScore, Review};
use rand::{Rng, rng};
use std::fmt;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn};

/// Default number of retries after a retryable failure.
pub const DEFAULT_MAX_RETRIES: usize = 3;
/// Default initial backoff delay.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);
const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(30);
const DEFAULT_MAX_JITTER: Duration = Duration::from_millis(250);

/// A service that can score a review's popularity.
pub trait PopularitySource {
    /// Look up the popularity of `review`.
    ///
    /// # Errors
    ///
    /// [`LookupError::NotFound`] when the service has no match; other
    /// variants per the failure.
    async fn lookup(&self, review: &Review) -> std::result::Result<PopularityScore, LookupError>;
}

/// Wrapper that adds exponential backoff retry logic to any [`PopularitySource`].
///
/// Only errors for which [`LookupError::is_retryable`] holds are retried.
/// The delay between retries follows:
/// ```text
/// delay = min(retry_after or base_delay * 2^(attempt-1), max_delay) + random_jitter
/// ```
pub struct RetryLookup<T> {
    inner: T,
    max_retries: usize,
    base_delay: Duration,
    max_delay: Duration,
    max_jitter: Duration,
}

impl<T> RetryLookup<T>
where
    T: PopularitySource,
{
    /// Wrap `inner`, retrying up to `max_retries` times.
    pub fn new(inner: T, max_retries: usize, base_delay: Duration) -> Self {
        Self {
            inner,
            max_retries,
            base_delay,
            max_delay: DEFAULT_MAX_DELAY,
            max_jitter: DEFAULT_MAX_JITTER,
        }
    }

    #[cfg(test)]
    pub fn with_max_jitter(mut self, max_jitter: Duration) -> Self {
        self.max_jitter = max_jitter;
        self
    }

    fn backoff(&self, attempt: usize, error: &LookupError) -> Duration {
        let computed = match error {
            LookupError::RateLimited {
                retry_after: Some(hint),
            } => *hint,
            _ => self
                .base_delay
                .saturating_mul(1u32 << (attempt - 1).min(16)),
        };
        let delay = computed.min(self.max_delay);
        let jitter_ms = self.max_jitter.as_millis() as u64;
        let jitter = if jitter_ms == 0 {
            Duration::ZERO
        } else {
            Duration::from_millis(rng().random_range(0..=jitter_ms))
        };
        delay + jitter
    }
}

impl<T> fmt::Debug for RetryLookup<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryLookup")
            .field("max_retries", &self.max_retries)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .finish()
    }
}

impl<T> PopularitySource for RetryLookup<T>
where
    T: PopularitySource,
{
    async fn lookup(&self, review: &Review) -> std::result::Result<PopularityScore, LookupError> {
        let total_t0 = Instant::now();
        let mut attempt = 0usize;

        loop {
            match self.inner.lookup(review).await {
                Ok(score) => return Ok(score),
                Err(e) if !e.is_retryable() => return Err(e),
                Err(e) => {
                    attempt += 1;
                    if attempt > self.max_retries {
                        warn!(
                            attempt,
                            max = self.max_retries,
                            elapsed_ms_total = total_t0.elapsed().as_millis() as u64,
                            error = %e,
                            "lookup exhausted retries"
                        );
                        return Err(e);
                    }

                    let delay = self.backoff(attempt, &e);
                    warn!(
                        attempt,
                        max = self.max_retries,
                        ?delay,
                        error = %e,
                        "lookup attempt failed; backing off"
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}

/// Look up every review in order, one request at a time.
///
/// Misses and non-fatal failures yield `None` for that review and the walk
/// continues; the output has one pair per input review, in input order.
///
/// # Errors
///
/// Returns [`TrackerError::Authentication`] on the first
/// [`LookupError::Unauthorized`]; no further lookups are made.
#[instrument(level = "info", skip_all, fields(count = reviews.len()))]
pub async fn annotate<S>(
    source: &S,
    reviews: Vec<Review>,
) -> Result<Vec<(Review, Option<PopularityScore>)>>
where
    S: PopularitySource,
{
    let t0 = Instant::now();
    let mut annotated = Vec::with_capacity(reviews.len());

    for (index, review) in reviews.into_iter().enumerate() {
        let score = match source.lookup(&review).await {
            Ok(score) => {
                debug!(index, artist = %review.artist, album = %review.album, score = score.score, "Scored review");
                Some(score)
            }
            Err(LookupError::Unauthorized(message)) => {
                error!(index, %message, "Spotify rejected our token; aborting lookups");
                return Err(TrackerError::Authentication(message));
            }
            Err(LookupError::NotFound) => {
                info!(index, artist = %review.artist, album = %review.album, "No popularity data; score absent");
                None
            }
            Err(e) => {
                warn!(index, artist = %review.artist, album = %review.album, error = %e, "Lookup failed; score absent");
                None
            }
        };
        annotated.push((review, score));
    }

    let scored = annotated.iter().filter(|(_, s)| s.is_some()).count();
    info!(
        total = annotated.len(),
        scored,
        absent = annotated.len() - scored,
        elapsed_ms = t0.elapsed().as_millis() as u64,
        "Completed popularity lookups"
    );
    Ok(annotated)
}
