//! Question to ranked context chunks.
//!
//! Pipeline: expand the question, search the video's index once per
//! expanded query, drop duplicate chunk texts, rerank, then number the
//! survivors as citations. Questions that name a time get the chunk covering
//! that moment pinned first.

use super::expansion::QueryExpander;
use super::rerank::{dedup_hits, rerank, RankedChunk};
use super::time_match::{chunks_at, parse_time_reference};
use crate::config::RetrievalSettings;
use crate::embedding::Embedder;
use crate::error::Result;
use crate::index::{IndexCache, VectorIndex};
use crate::store::EmbeddingStore;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Score given to time-anchored chunks so they sort ahead of reranked ones.
const ANCHOR_SCORE: f32 = f32::MAX;

/// A numbered reference to a chunk used as context.
#[derive(Debug, Clone, PartialEq)]
pub struct Citation {
    /// 1-based position in the context.
    pub number: usize,
    pub chunk_index: usize,
    /// First timestamp marker in the chunk.
    pub timestamp: Option<String>,
}

impl fmt::Display for Citation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] Chunk {}", self.number, self.chunk_index)?;
        if let Some(ts) = &self.timestamp {
            write!(f, " @ {}", ts)?;
        }
        Ok(())
    }
}

/// Chunks selected as context for a question, best first.
#[derive(Debug, Clone, PartialEq)]
pub struct Retrieval {
    pub chunks: Vec<RankedChunk>,
    pub citations: Vec<Citation>,
}

impl Retrieval {
    fn new(chunks: Vec<RankedChunk>) -> Self {
        let citations = chunks
            .iter()
            .enumerate()
            .map(|(i, c)| Citation {
                number: i + 1,
                chunk_index: c.hit.chunk_index,
                timestamp: c.hit.metadata.start_timestamp.clone(),
            })
            .collect();
        Self { chunks, citations }
    }

    /// Chunk texts in context order.
    pub fn texts(&self) -> Vec<&str> {
        self.chunks.iter().map(|c| c.hit.text.as_str()).collect()
    }
}

/// What retrieval produced.
#[derive(Debug, Clone, PartialEq)]
pub enum RetrievalOutcome {
    Found(Retrieval),
    /// The video has no stored embeddings.
    NoEmbeddings,
    /// Embeddings exist but nothing survived selection. Validated settings
    /// always search for at least one hit, so this takes a zero-width
    /// search and a question naming no time.
    NoRelevantContent,
}

/// Retrieves context for questions about one video at a time.
pub struct Retriever {
    store: Arc<dyn EmbeddingStore>,
    embedder: Arc<dyn Embedder>,
    cache: Arc<IndexCache>,
    expander: QueryExpander,
    per_query_k: usize,
    top_k: usize,
}

impl Retriever {
    pub fn new(
        store: Arc<dyn EmbeddingStore>,
        embedder: Arc<dyn Embedder>,
        cache: Arc<IndexCache>,
        settings: &RetrievalSettings,
    ) -> Self {
        Self {
            store,
            embedder,
            cache,
            expander: QueryExpander::default(),
            per_query_k: settings.per_query_k,
            top_k: settings.top_k,
        }
    }

    pub fn with_expander(mut self, expander: QueryExpander) -> Self {
        self.expander = expander;
        self
    }

    /// Cached index for `video_id`, built from the store on first use.
    /// `None` when the video has no embeddings.
    pub async fn index_for(&self, video_id: &str) -> Result<Option<Arc<VectorIndex>>> {
        if let Some(index) = self.cache.get(video_id)? {
            return Ok((!index.is_empty()).then_some(index));
        }

        let records = self.store.get_embeddings(video_id).await?;
        if records.is_empty() {
            return Ok(None);
        }
        Ok(Some(self.cache.get_or_build(video_id, &records)?))
    }

    /// Select context chunks and citations for `question`.
    #[instrument(skip(self), fields(video_id = %video_id))]
    pub async fn retrieve(&self, video_id: &str, question: &str) -> Result<RetrievalOutcome> {
        let Some(index) = self.index_for(video_id).await? else {
            info!("No embeddings for video {}", video_id);
            return Ok(RetrievalOutcome::NoEmbeddings);
        };

        let anchored = self.time_anchored(&index, question);
        let reranked = self.reranked(&index, question).await?;

        let mut chunks = anchored;
        for candidate in reranked {
            if chunks.len() >= self.top_k {
                break;
            }
            if !chunks.iter().any(|c| c.hit.text == candidate.hit.text) {
                chunks.push(candidate);
            }
        }
        chunks.truncate(self.top_k);

        if chunks.is_empty() {
            return Ok(RetrievalOutcome::NoRelevantContent);
        }

        info!("Selected {} context chunks", chunks.len());
        Ok(RetrievalOutcome::Found(Retrieval::new(chunks)))
    }

    /// Chunks covering a time named in the question.
    fn time_anchored(&self, index: &VectorIndex, question: &str) -> Vec<RankedChunk> {
        let Some(target) = parse_time_reference(question) else {
            return Vec::new();
        };

        let anchored: Vec<RankedChunk> = chunks_at(&index.chunks(), target)
            .into_iter()
            .map(|hit| RankedChunk {
                hit,
                score: ANCHOR_SCORE,
            })
            .collect();

        debug!("Question names {}s, anchored {} chunks", target, anchored.len());
        anchored
    }

    /// Multi-query similarity search, deduplicated and reranked.
    async fn reranked(&self, index: &VectorIndex, question: &str) -> Result<Vec<RankedChunk>> {
        let queries = self.expander.expand(question);

        let mut hits = Vec::new();
        for query in &queries {
            hits.extend(index.search_text(self.embedder.as_ref(), query, self.per_query_k).await?);
        }

        let total = hits.len();
        let unique = dedup_hits(hits);
        debug!(
            "{} queries returned {} hits, {} unique",
            queries.len(),
            total,
            unique.len()
        );

        Ok(rerank(question, unique, self.top_k))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::HashingEmbedder;
    use crate::store::{EmbeddingRecord, MemoryStore};

    async fn retriever_with(texts: &[&str]) -> (Retriever, Arc<MemoryStore>) {
        retriever_with_settings(texts, &RetrievalSettings::default()).await
    }

    async fn retriever_with_settings(
        texts: &[&str],
        settings: &RetrievalSettings,
    ) -> (Retriever, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let embedder = Arc::new(HashingEmbedder::default());
        let owned: Vec<String> = texts.iter().map(|s| s.to_string()).collect();
        let vectors = embedder.embed_batch(&owned).await.unwrap();
        let records: Vec<EmbeddingRecord> = owned
            .into_iter()
            .zip(vectors)
            .enumerate()
            .map(|(i, (text, vector))| EmbeddingRecord {
                video_id: "abcdefghijk".to_string(),
                chunk_index: i,
                chunk_text: text,
                vector,
            })
            .collect();
        store.replace_embeddings("abcdefghijk", &records).await.unwrap();

        let retriever = Retriever::new(
            store.clone(),
            embedder,
            Arc::new(IndexCache::new()),
            settings,
        );
        (retriever, store)
    }

    #[tokio::test]
    async fn test_no_embeddings() {
        let (retriever, _) = retriever_with(&[]).await;
        let outcome = retriever.retrieve("abcdefghijk", "anything").await.unwrap();
        assert_eq!(outcome, RetrievalOutcome::NoEmbeddings);
    }

    #[tokio::test]
    async fn test_no_relevant_content_when_search_is_empty() {
        let settings = RetrievalSettings {
            per_query_k: 0,
            ..RetrievalSettings::default()
        };
        let (retriever, _) = retriever_with_settings(
            &["[00:00] welcome to the channel", "[00:10] now we mix the paint"],
            &settings,
        )
        .await;

        let outcome = retriever.retrieve("abcdefghijk", "how is the paint mixed").await.unwrap();
        assert_eq!(outcome, RetrievalOutcome::NoRelevantContent);

        let anchored = retriever.retrieve("abcdefghijk", "what happens at 00:10").await.unwrap();
        let RetrievalOutcome::Found(retrieval) = anchored else {
            panic!("expected anchored context");
        };
        assert_eq!(retrieval.citations[0].chunk_index, 1);
    }

    #[tokio::test]
    async fn test_time_reference_is_cited() {
        let (retriever, _) = retriever_with(&[
            "[00:00] welcome to the channel",
            "[00:10] now we mix the paint",
            "[00:20] finally we clean the brushes",
        ])
        .await;

        let RetrievalOutcome::Found(retrieval) = retriever
            .retrieve("abcdefghijk", "what happens at 10 seconds")
            .await
            .unwrap()
        else {
            panic!("expected context");
        };

        assert_eq!(retrieval.chunks[0].hit.chunk_index, 1);
        assert_eq!(retrieval.citations[0].chunk_index, 1);
        assert_eq!(retrieval.citations[0].number, 1);
        assert_eq!(retrieval.citations[0].to_string(), "[1] Chunk 1 @ 00:10");
        assert_eq!(retrieval.chunks.len(), 3);
    }

    #[tokio::test]
    async fn test_citations_are_numbered_and_unique() {
        let texts: Vec<String> = (0..10)
            .map(|i| format!("[00:{:02}] segment about topic {} and rust", i * 5, i))
            .collect();
        let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
        let (retriever, _) = retriever_with(&refs).await;

        let RetrievalOutcome::Found(retrieval) = retriever
            .retrieve("abcdefghijk", "tell me about rust")
            .await
            .unwrap()
        else {
            panic!("expected context");
        };

        assert_eq!(retrieval.chunks.len(), 6);
        let numbers: Vec<usize> = retrieval.citations.iter().map(|c| c.number).collect();
        assert_eq!(numbers, vec![1, 2, 3, 4, 5, 6]);
        let mut texts = retrieval.texts();
        texts.sort();
        texts.dedup();
        assert_eq!(texts.len(), 6);
    }

    #[tokio::test]
    async fn test_retrieval_is_repeatable() {
        let (retriever, _) = retriever_with(&[
            "[00:00] the song starts softly",
            "[00:15] the chorus lyrics repeat",
            "[00:30] a quiet bridge",
        ])
        .await;

        let first = retriever.retrieve("abcdefghijk", "what are the song lyrics").await.unwrap();
        let second = retriever.retrieve("abcdefghijk", "what are the song lyrics").await.unwrap();
        assert_eq!(first, second);
    }
}
