//! In-memory similarity search over one video's chunk embeddings.
//!
//! A [`VectorIndex`] is built once from stored embeddings and never mutated;
//! [`IndexCache`] keeps one per video and drops it when the chunk set changes.

use crate::chunking::ChunkMetadata;
use crate::embedding::{cosine_similarity, Embedder};
use crate::error::{Result, TubeChatError};
use crate::store::EmbeddingRecord;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::debug;

/// One indexed chunk.
#[derive(Debug, Clone)]
struct Entry {
    chunk_index: usize,
    text: String,
    metadata: ChunkMetadata,
    vector: Vec<f32>,
}

/// A search hit, highest score first.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub chunk_index: usize,
    pub text: String,
    pub metadata: ChunkMetadata,
    /// Cosine similarity to the query.
    pub score: f32,
}

/// Immutable cosine-similarity index for a single video.
#[derive(Debug, Clone)]
pub struct VectorIndex {
    video_id: String,
    entries: Vec<Entry>,
}

impl VectorIndex {
    /// Build an index from stored embeddings.
    pub fn build(video_id: &str, records: &[EmbeddingRecord]) -> Self {
        let mut entries: Vec<Entry> = records
            .iter()
            .map(|r| Entry {
                chunk_index: r.chunk_index,
                metadata: ChunkMetadata::from_text(&r.chunk_text),
                text: r.chunk_text.clone(),
                vector: r.vector.clone(),
            })
            .collect();
        entries.sort_by_key(|e| e.chunk_index);

        debug!("Built index for {} with {} chunks", video_id, entries.len());
        Self {
            video_id: video_id.to_string(),
            entries,
        }
    }

    pub fn video_id(&self) -> &str {
        &self.video_id
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Top `k` chunks by cosine similarity. Equal scores keep chunk order.
    pub fn search(&self, query: &[f32], k: usize) -> Vec<SearchHit> {
        let mut scored: Vec<(f32, &Entry)> = self
            .entries
            .iter()
            .map(|e| (cosine_similarity(query, &e.vector), e))
            .collect();

        scored.sort_by(|a, b| {
            b.0.partial_cmp(&a.0)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.1.chunk_index.cmp(&b.1.chunk_index))
        });
        scored.truncate(k);

        scored
            .into_iter()
            .map(|(score, e)| SearchHit {
                chunk_index: e.chunk_index,
                text: e.text.clone(),
                metadata: e.metadata.clone(),
                score,
            })
            .collect()
    }

    /// Embed `query` and search.
    pub async fn search_text(&self, embedder: &dyn Embedder, query: &str, k: usize) -> Result<Vec<SearchHit>> {
        let vector = embedder.embed(query).await?;
        Ok(self.search(&vector, k))
    }

    /// All chunks in chunk order, as zero-score hits.
    pub fn chunks(&self) -> Vec<SearchHit> {
        self.entries
            .iter()
            .map(|e| SearchHit {
                chunk_index: e.chunk_index,
                text: e.text.clone(),
                metadata: e.metadata.clone(),
                score: 0.0,
            })
            .collect()
    }
}

/// Built indexes keyed by video ID.
#[derive(Default)]
pub struct IndexCache {
    indexes: RwLock<HashMap<String, Arc<VectorIndex>>>,
}

impl IndexCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, video_id: &str) -> Result<Option<Arc<VectorIndex>>> {
        let indexes = self
            .indexes
            .read()
            .map_err(|e| TubeChatError::Store(format!("Index cache lock poisoned: {}", e)))?;
        Ok(indexes.get(video_id).cloned())
    }

    /// Return the cached index for `video_id`, building it from `records`
    /// on a miss.
    pub fn get_or_build(&self, video_id: &str, records: &[EmbeddingRecord]) -> Result<Arc<VectorIndex>> {
        if let Some(index) = self.get(video_id)? {
            return Ok(index);
        }

        let index = Arc::new(VectorIndex::build(video_id, records));
        let mut indexes = self
            .indexes
            .write()
            .map_err(|e| TubeChatError::Store(format!("Index cache lock poisoned: {}", e)))?;
        Ok(indexes.entry(video_id.to_string()).or_insert(index).clone())
    }

    /// Drop the cached index for `video_id`.
    pub fn invalidate(&self, video_id: &str) -> Result<()> {
        let mut indexes = self
            .indexes
            .write()
            .map_err(|e| TubeChatError::Store(format!("Index cache lock poisoned: {}", e)))?;
        if indexes.remove(video_id).is_some() {
            debug!("Invalidated index for {}", video_id);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(index: usize, text: &str, vector: Vec<f32>) -> EmbeddingRecord {
        EmbeddingRecord {
            video_id: "abcdefghijk".to_string(),
            chunk_index: index,
            chunk_text: text.to_string(),
            vector,
        }
    }

    fn sample() -> Vec<EmbeddingRecord> {
        vec![
            record(2, "[00:20] third", vec![0.0, 1.0]),
            record(0, "[00:00] first", vec![1.0, 0.0]),
            record(1, "second", vec![0.7, 0.7]),
        ]
    }

    #[test]
    fn test_search_ranks_by_similarity() {
        let index = VectorIndex::build("abcdefghijk", &sample());
        let hits = index.search(&[1.0, 0.1], 2);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].chunk_index, 0);
        assert_eq!(hits[1].chunk_index, 1);
        assert!(hits[0].score >= hits[1].score);
        assert_eq!(hits[0].metadata.start_timestamp.as_deref(), Some("00:00"));
    }

    #[test]
    fn test_ties_keep_chunk_order() {
        let records = vec![
            record(1, "b", vec![1.0, 0.0]),
            record(0, "a", vec![1.0, 0.0]),
        ];
        let index = VectorIndex::build("abcdefghijk", &records);
        let order: Vec<usize> = index.search(&[1.0, 0.0], 5).iter().map(|h| h.chunk_index).collect();
        assert_eq!(order, vec![0, 1]);
    }

    #[test]
    fn test_cache_builds_once_and_invalidates() {
        let cache = IndexCache::new();
        let first = cache.get_or_build("abcdefghijk", &sample()).unwrap();
        let again = cache.get_or_build("abcdefghijk", &[]).unwrap();
        assert!(Arc::ptr_eq(&first, &again));
        assert_eq!(again.len(), 3);

        cache.invalidate("abcdefghijk").unwrap();
        assert!(cache.get("abcdefghijk").unwrap().is_none());
        let rebuilt = cache.get_or_build("abcdefghijk", &[]).unwrap();
        assert!(rebuilt.is_empty());
    }
}
