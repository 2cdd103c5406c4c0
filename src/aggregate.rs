//! Ranking of annotated reviews.

use crate::models::{PopularityScore, RankedEntry, Review};
use std::cmp::Ordering;
use tracing::{debug, instrument};

/// Pair each review with its score and order the result.
///
/// Order: score descending, entries without a score last. Equal scores go
/// newest review first, undated after dated. Anything still tied keeps its
/// input order.
#[instrument(level = "info", skip_all, fields(count = annotated.len()))]
pub fn rank(annotated: Vec<(Review, Option<PopularityScore>)>) -> Vec<RankedEntry> {
    let mut entries = annotated
        .into_iter()
        .map(|(review, popularity)| RankedEntry { review, popularity })
        .collect::<Vec<_>>();

    // `sort_by` is stable.
    entries.sort_by(compare);

    debug!(
        top = entries.first().map(|e| e.review.album.as_str()).unwrap_or(""),
        "Ranked entries"
    );
    entries
}

fn compare(a: &RankedEntry, b: &RankedEntry) -> Ordering {
    // `None < Some(_)` for Option, so comparing b against a puts absent last.
    b.score()
        .cmp(&a.score())
        .then_with(|| b.review.published.cmp(&a.review.published))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::popularity::tests::{review, score_for};
    use chrono::NaiveDate;

    fn scored(artist: &str, album: &str, score: Option<u8>) -> (Review, Option<PopularityScore>) {
        let r = review(artist, album);
        let s = score.map(|value| score_for(&r, value));
        (r, s)
    }

    fn albums(entries: &[RankedEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.review.album.as_str()).collect()
    }

    #[test]
    fn test_scores_descending_absent_last() {
        let ranked = rank(vec![
            scored("A", "Low", Some(12)),
            scored("B", "Missing", None),
            scored("C", "High", Some(90)),
            scored("D", "Mid", Some(50)),
        ]);
        assert_eq!(albums(&ranked), vec!["High", "Mid", "Low", "Missing"]);
    }

    #[test]
    fn test_sorting_law() {
        let inputs = [Some(3), None, Some(77), Some(77), None, Some(0), Some(100), Some(41)];
        let ranked = rank(
            inputs
                .iter()
                .enumerate()
                .map(|(i, s)| scored(&format!("Artist {i}"), &format!("Album {i}"), *s))
                .collect(),
        );

        for pair in ranked.windows(2) {
            match (pair[0].score(), pair[1].score()) {
                (Some(a), Some(b)) => assert!(a >= b),
                (None, Some(_)) => panic!("absent score sorted before a present one"),
                _ => {}
            }
        }
        assert_eq!(ranked.len(), inputs.len());
    }

    #[test]
    fn test_ties_break_on_publish_date_then_input_order() {
        let mut old = scored("A", "Old", Some(60));
        old.0.published = NaiveDate::from_ymd_opt(2024, 1, 5);
        let mut new = scored("B", "New", Some(60));
        new.0.published = NaiveDate::from_ymd_opt(2024, 3, 1);
        let undated = scored("C", "Undated", Some(60));
        let absent_first = scored("D", "AbsentFirst", None);
        let absent_second = scored("E", "AbsentSecond", None);

        let ranked = rank(vec![absent_first, undated, old, absent_second, new]);
        assert_eq!(
            albums(&ranked),
            vec!["New", "Old", "Undated", "AbsentFirst", "AbsentSecond"]
        );
    }

    #[test]
    fn test_every_entry_maps_to_an_input_review() {
        let inputs = vec![scored("A", "One", Some(1)), scored("B", "Two", None)];
        let reviews = inputs.iter().map(|(r, _)| r.clone()).collect::<Vec<_>>();
        let ranked = rank(inputs);
        assert!(ranked.iter().all(|e| reviews.contains(&e.review)));
        assert!(ranked.iter().all(|e| {
            e.popularity
                .as_ref()
                .is_none_or(|p| p.album_key == e.review.key())
        }));
    }

    #[test]
    fn test_empty_input() {
        assert!(rank(Vec::new()).is_empty());
    }
}
