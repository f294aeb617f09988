//! Persistence for transcripts and chunk embeddings.
//!
//! Transcripts are keyed by video ID; embeddings by `(video_id, chunk_index)`.
//! Embeddings for a video are only ever replaced as a whole set.

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::error::Result;
use crate::transcript::{TranscriptRecord, VideoInfo};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One embedded chunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingRecord {
    pub video_id: String,
    pub chunk_index: usize,
    pub chunk_text: String,
    pub vector: Vec<f32>,
}

/// Summary of a stored video for listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoListing {
    pub info: VideoInfo,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Number of stored embeddings.
    pub embedding_count: usize,
}

/// Transcript persistence keyed by video ID.
#[async_trait]
pub trait TranscriptStore: Send + Sync {
    /// Insert or update a transcript. An existing record keeps its `created_at`.
    async fn save_transcript(&self, record: &TranscriptRecord) -> Result<()>;

    async fn get_transcript(&self, video_id: &str) -> Result<Option<TranscriptRecord>>;

    async fn has_transcript(&self, video_id: &str) -> Result<bool> {
        Ok(self.get_transcript(video_id).await?.is_some())
    }

    /// All stored videos, most recently created first.
    async fn list_transcripts(&self) -> Result<Vec<VideoListing>>;
}

/// Embedding persistence keyed by `(video_id, chunk_index)`.
#[async_trait]
pub trait EmbeddingStore: Send + Sync {
    /// Atomically discard all embeddings for `video_id` and store `records`.
    async fn replace_embeddings(&self, video_id: &str, records: &[EmbeddingRecord]) -> Result<usize>;

    /// All embeddings for `video_id`, ordered by chunk index.
    async fn get_embeddings(&self, video_id: &str) -> Result<Vec<EmbeddingRecord>>;

    async fn embedding_count(&self, video_id: &str) -> Result<usize>;

    async fn has_embeddings(&self, video_id: &str) -> Result<bool> {
        Ok(self.embedding_count(video_id).await? > 0)
    }

    /// Remove every embedding for `video_id`, returning how many were removed.
    async fn delete_embeddings(&self, video_id: &str) -> Result<usize>;
}

/// A backend that stores both transcripts and embeddings.
pub trait Store: TranscriptStore + EmbeddingStore {}

impl<T: TranscriptStore + EmbeddingStore> Store for T {}
