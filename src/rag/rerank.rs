//! Candidate deduplication and heuristic reranking.

use crate::index::SearchHit;
use std::cmp::Ordering;
use std::collections::HashSet;

const KEYWORD_WEIGHT: f32 = 2.0;
const TIMESTAMP_BONUS: f32 = 1.0;
const LENGTH_BONUS: f32 = 0.5;
const PREFERRED_WORDS: std::ops::RangeInclusive<usize> = 50..=200;

/// A retrieved chunk with its rerank score.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedChunk {
    pub hit: SearchHit,
    pub score: f32,
}

/// Drop hits whose text was already seen, keeping the first occurrence.
pub fn dedup_hits(hits: Vec<SearchHit>) -> Vec<SearchHit> {
    let mut seen = HashSet::new();
    hits.into_iter()
        .filter(|hit| seen.insert(hit.text.clone()))
        .collect()
}

fn word_set(text: &str) -> HashSet<String> {
    text.split_whitespace().map(|w| w.to_lowercase()).collect()
}

/// Distinct lowercase whitespace tokens shared by question and text.
pub fn keyword_overlap(question: &str, text: &str) -> usize {
    word_set(question).intersection(&word_set(text)).count()
}

/// Heuristic relevance of `hit` to a question with the given word set.
fn score(question_words: &HashSet<String>, hit: &SearchHit) -> f32 {
    let overlap = word_set(&hit.text).intersection(question_words).count();
    let mut score = overlap as f32 * KEYWORD_WEIGHT;
    if hit.metadata.has_timestamp() {
        score += TIMESTAMP_BONUS;
    }
    if PREFERRED_WORDS.contains(&hit.metadata.word_count) {
        score += LENGTH_BONUS;
    }
    score
}

/// Score and order candidates, keeping the best `top_k`.
///
/// The sort is stable, so equal scores keep their incoming order.
pub fn rerank(question: &str, candidates: Vec<SearchHit>, top_k: usize) -> Vec<RankedChunk> {
    let question_words = word_set(question);

    let mut ranked: Vec<RankedChunk> = candidates
        .into_iter()
        .map(|hit| RankedChunk {
            score: score(&question_words, &hit),
            hit,
        })
        .collect();

    ranked.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    ranked.truncate(top_k);
    ranked
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
    fn test_dedup_keeps_first_occurrence() {
        let hits = vec![hit(0, "a"), hit(1, "b"), hit(2, "a"), hit(3, "c"), hit(1, "b")];
        let unique = dedup_hits(hits);
        let indices: Vec<usize> = unique.iter().map(|h| h.chunk_index).collect();
        assert_eq!(indices, vec![0, 1, 3]);
    }

    #[test]
    fn test_keyword_overlap_is_case_insensitive_and_distinct() {
        assert_eq!(keyword_overlap("Rust rust borrow", "RUST and the borrow checker"), 2);
        assert_eq!(keyword_overlap("nothing", "in common"), 0);
    }

    #[test]
    fn test_score_components() {
        let long_text = format!("[00:10] {}", "word ".repeat(60));
        let ranked = rerank("alpha", vec![hit(0, &long_text)], 5);
        // timestamp + preferred length
        assert!((ranked[0].score - 1.5).abs() < 1e-6);

        let ranked = rerank("alpha beta", vec![hit(0, "alpha beta gamma")], 5);
        assert!((ranked[0].score - 4.0).abs() < 1e-6);
    }

    #[test]
    fn test_rerank_orders_and_truncates() {
        let candidates = vec![
            hit(0, "unrelated words"),
            hit(1, "ownership rules"),
            hit(2, "[00:05] something else"),
            hit(3, "more unrelated"),
        ];
        let ranked = rerank("explain ownership", candidates, 3);
        let indices: Vec<usize> = ranked.iter().map(|r| r.hit.chunk_index).collect();
        assert_eq!(indices, vec![1, 2, 0]);
    }

    #[test]
    fn test_rerank_is_stable_for_ties() {
        let candidates: Vec<SearchHit> = (0..8).map(|i| hit(i, &format!("chunk{}", i))).collect();
        let first = rerank("question", candidates.clone(), 6);
        let second = rerank("question", candidates, 6);
        assert_eq!(first, second);
        let indices: Vec<usize> = first.iter().map(|r| r.hit.chunk_index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3, 4, 5]);
    }
}
