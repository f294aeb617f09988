//! Embedding generation for semantic search and retrieval.

mod hashing;
mod openai;

pub use hashing::HashingEmbedder;
pub use openai::OpenAIEmbedder;

use crate::config::{EmbeddingProvider, EmbeddingSettings};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

/// Trait for embedding generation.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Generate an embedding for a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embeddings for multiple texts, in input order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Get the embedding dimensions.
    fn dimensions(&self) -> usize;
}

/// Create the embedder selected in settings.
pub fn create_embedder(settings: &EmbeddingSettings) -> Result<Arc<dyn Embedder>> {
    Ok(match settings.provider {
        EmbeddingProvider::OpenAI => Arc::new(OpenAIEmbedder::with_config(
            &settings.model,
            settings.dimensions as usize,
        )?),
        EmbeddingProvider::Hashing => Arc::new(HashingEmbedder::new(settings.dimensions as usize)),
    })
}

/// Result of embedding a list of texts with per-item failure isolation.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    /// `(input index, vector)` for every text that embedded successfully.
    pub embedded: Vec<(usize, Vec<f32>)>,
    /// Input indices that could not be embedded.
    pub failed: Vec<usize>,
}

/// Embed `texts` in batches of `batch_size`.
///
/// When a whole batch fails, its items are retried one at a time so a single
/// bad input only costs its own slot. Successful vectors keep their input
/// index.
pub async fn embed_isolated(embedder: &dyn Embedder, texts: &[String], batch_size: usize) -> BatchOutcome {
    let mut outcome = BatchOutcome::default();
    let batch_size = batch_size.max(1);

    for (batch_no, batch) in texts.chunks(batch_size).enumerate() {
        let offset = batch_no * batch_size;

        match embedder.embed_batch(batch).await {
            Ok(vectors) if vectors.len() == batch.len() => {
                outcome
                    .embedded
                    .extend(vectors.into_iter().enumerate().map(|(i, v)| (offset + i, v)));
                continue;
            }
            Ok(vectors) => warn!(
                "Embedding batch {} returned {} vectors for {} inputs, retrying individually",
                batch_no,
                vectors.len(),
                batch.len()
            ),
            Err(e) => warn!("Embedding batch {} failed, retrying individually: {}", batch_no, e),
        }

        for (i, text) in batch.iter().enumerate() {
            match embedder.embed(text).await {
                Ok(vector) => outcome.embedded.push((offset + i, vector)),
                Err(e) => {
                    warn!("Skipping chunk {}: {}", offset + i, e);
                    outcome.failed.push(offset + i);
                }
            }
        }
    }

    debug!(
        "Embedded {} of {} texts ({} failed)",
        outcome.embedded.len(),
        texts.len(),
        outcome.failed.len()
    );
    outcome
}

/// Cosine similarity of two vectors; 0.0 when either is zero or lengths differ.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TubeChatError;

    /// Rejects any batch containing "bad", and "bad" itself.
    struct Picky;

    #[async_trait]
    impl Embedder for Picky {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            if text.contains("bad") {
                Err(TubeChatError::Embedding("rejected".to_string()))
            } else {
                Ok(vec![text.len() as f32, 1.0])
            }
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            if texts.iter().any(|t| t.contains("bad")) {
                return Err(TubeChatError::Embedding("batch rejected".to_string()));
            }
            let mut out = Vec::new();
            for t in texts {
                out.push(self.embed(t).await?);
            }
            Ok(out)
        }

        fn dimensions(&self) -> usize {
            2
        }
    }

    #[tokio::test]
    async fn test_failed_item_is_isolated() {
        let texts: Vec<String> = ["a", "bb", "bad", "cccc", "ddddd"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let outcome = embed_isolated(&Picky, &texts, 2).await;

        assert_eq!(outcome.failed, vec![2]);
        let indices: Vec<usize> = outcome.embedded.iter().map(|(i, _)| *i).collect();
        assert_eq!(indices, vec![0, 1, 3, 4]);
        assert_eq!(outcome.embedded[2].1, vec![4.0, 1.0]);
    }

    #[tokio::test]
    async fn test_zero_batch_size_is_clamped() {
        let texts = vec!["x".to_string(), "y".to_string()];
        let outcome = embed_isolated(&Picky, &texts, 0).await;
        assert_eq!(outcome.embedded.len(), 2);
        assert!(outcome.failed.is_empty());
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
    }
}
