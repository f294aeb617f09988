//! Anchoring questions that name a point in the video.
//!
//! "What happens at 2:30?" or "at 10 seconds" should surface the chunk
//! covering that moment even when its wording shares nothing with the
//! question.

use crate::index::SearchHit;
use crate::transcript::{find_timestamps, parse_timestamp};
use regex::Regex;
use std::sync::LazyLock;

static CLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{1,2}:\d{2}(?::\d{2})?)\b").expect("valid clock regex"));

static SPOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?ix)
        (?:(\d+)\s*(?:hours?|hrs?)\b)?\s*(?:and\s+)?
        (?:(\d+)\s*(?:minutes?|mins?)\b)?\s*(?:and\s+)?
        (?:(\d+)\s*(?:seconds?|secs?)\b)?
    ",
    )
    .expect("valid spoken time regex")
});

/// Seconds referenced by `question`, if it names a time.
///
/// Clock notation (`MM:SS`, `HH:MM:SS`) wins over spoken durations. A
/// duration too large to represent in seconds is not a time reference.
pub fn parse_time_reference(question: &str) -> Option<u32> {
    if let Some(secs) = CLOCK
        .captures_iter(question)
        .find_map(|c| c.get(1).and_then(|m| parse_timestamp(m.as_str())))
    {
        return Some(secs);
    }

    for caps in SPOKEN.captures_iter(question) {
        let part = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<u32>().ok());
        let (hours, minutes, seconds) = (part(1), part(2), part(3));
        if hours.is_none() && minutes.is_none() && seconds.is_none() {
            continue;
        }
        return hours
            .unwrap_or(0)
            .checked_mul(3600)
            .zip(minutes.unwrap_or(0).checked_mul(60))
            .and_then(|(h, m)| h.checked_add(m))
            .and_then(|hm| hm.checked_add(seconds.unwrap_or(0)));
    }

    None
}

/// Chunks holding the latest timestamp marker at or before `target`, in
/// chunk order. Empty when every marker is later than `target`.
pub fn chunks_at(chunks: &[SearchHit], target: u32) -> Vec<SearchHit> {
    let marker_seconds = |hit: &SearchHit| -> Vec<u32> {
        find_timestamps(&hit.text)
            .iter()
            .filter_map(|t| parse_timestamp(t))
            .collect()
    };

    let best = chunks
        .iter()
        .flat_map(marker_seconds)
        .filter(|&s| s <= target)
        .max();

    match best {
        Some(best) => chunks
            .iter()
            .filter(|hit| marker_seconds(hit).contains(&best))
            .cloned()
            .collect(),
        None => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunking::ChunkMetadata;

    fn hit(index: usize, text: &str) -> SearchHit {
        SearchHit {
            chunk_index: index,
            text: text.to_string(),
            metadata: ChunkMetadata::from_text(text),
            score: 0.0,
        }
    }

    #[test]
    fn test_parse_time_reference() {
        assert_eq!(parse_time_reference("what happens at 10 seconds"), Some(10));
        assert_eq!(parse_time_reference("around 2 minutes 30 seconds in"), Some(150));
        assert_eq!(parse_time_reference("at 3 mins and 5 secs"), Some(185));
        assert_eq!(parse_time_reference("at 1 hour"), Some(3600));
        assert_eq!(parse_time_reference("what is said at 01:05?"), Some(65));
        assert_eq!(parse_time_reference("at 1:02:03"), Some(3723));
        assert_eq!(parse_time_reference("what is this video about"), None);
        assert_eq!(parse_time_reference("top 10 tips"), None);
    }

    #[test]
    fn test_huge_spoken_duration_is_ignored() {
        assert_eq!(parse_time_reference("what happens at 2000000 hours?"), None);
        assert_eq!(parse_time_reference("at 4294967295 seconds"), Some(u32::MAX));
        assert_eq!(parse_time_reference("at 1 minute and 4294967295 seconds"), None);
        assert_eq!(parse_time_reference("at 99999999999 seconds"), None);
    }

    #[test]
    fn test_chunks_at_picks_latest_preceding_marker() {
        let chunks = vec![
            hit(0, "[00:00] intro"),
            hit(1, "[00:10] middle part"),
            hit(2, "[00:20] ending"),
        ];
        let at = |t| chunks_at(&chunks, t).iter().map(|h| h.chunk_index).collect::<Vec<_>>();
        assert_eq!(at(10), vec![1]);
        assert_eq!(at(15), vec![1]);
        assert_eq!(at(25), vec![2]);
        assert_eq!(at(0), vec![0]);
    }

    #[test]
    fn test_chunks_at_includes_overlapping_chunks() {
        let chunks = vec![
            hit(0, "[00:00] a [00:05] b"),
            hit(1, "[00:05] b [00:09] c"),
        ];
        let found: Vec<usize> = chunks_at(&chunks, 6).iter().map(|h| h.chunk_index).collect();
        assert_eq!(found, vec![0, 1]);
    }

    #[test]
    fn test_chunks_at_before_first_marker() {
        let chunks = vec![hit(0, "[00:30] late start")];
        assert!(chunks_at(&chunks, 10).is_empty());
    }
}
