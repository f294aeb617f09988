//! Local feature-hashing embedder.
//!
//! Needs no network or model download. Vectors are bag-of-words counts
//! hashed into a fixed number of buckets, then L2-normalized, so texts that
//! share vocabulary score higher under cosine similarity. Buckets come from
//! SHA-256, so vectors persisted by one build stay comparable with queries
//! embedded by another.

use super::Embedder;
use crate::error::Result;
use async_trait::async_trait;
use sha2::{Digest, Sha256};

/// Deterministic embedder based on hashed word features.
pub struct HashingEmbedder {
    dimensions: usize,
}

impl HashingEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }

    fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];

        let tokens: Vec<String> = text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .map(|t| t.to_lowercase())
            .collect();

        for token in &tokens {
            let hash = hash_of(token);
            let bucket = (hash % self.dimensions as u64) as usize;
            // One hash bit picks the sign so collisions tend to cancel out.
            let sign = if hash >> 63 == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }

        let norm_sq: f32 = vector.iter().map(|v| v * v).sum();
        if norm_sq > 0.0 {
            let inv = 1.0 / norm_sq.sqrt();
            for v in &mut vector {
                *v *= inv;
            }
        }

        vector
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(384)
    }
}

/// First eight bytes of the token's SHA-256 digest, big-endian.
fn hash_of(token: &str) -> u64 {
    let digest = Sha256::digest(token.as_bytes());
    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(prefix)
}

#[async_trait]
impl Embedder for HashingEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.embed_text(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_text(t)).collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}
