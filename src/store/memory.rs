//! In-memory store.
//!
//! Useful for testing and throwaway sessions.

use super::{EmbeddingRecord, EmbeddingStore, TranscriptStore, VideoListing};
use crate::error::{Result, TubeChatError};
use crate::transcript::TranscriptRecord;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// In-memory store for transcripts and embeddings.
#[derive(Default)]
pub struct MemoryStore {
    transcripts: RwLock<HashMap<String, TranscriptRecord>>,
    embeddings: RwLock<HashMap<String, Vec<EmbeddingRecord>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<T>(e: PoisonError<T>) -> TubeChatError {
    TubeChatError::Store(format!("Store lock poisoned: {}", e))
}

#[async_trait]
impl TranscriptStore for MemoryStore {
    async fn save_transcript(&self, record: &TranscriptRecord) -> Result<()> {
        let mut transcripts = self.transcripts.write().map_err(poisoned)?;
        let mut record = record.clone();
        if let Some(existing) = transcripts.get(&record.video_id) {
            record.created_at = existing.created_at;
        }
        transcripts.insert(record.video_id.clone(), record);
        Ok(())
    }

    async fn get_transcript(&self, video_id: &str) -> Result<Option<TranscriptRecord>> {
        let transcripts = self.transcripts.read().map_err(poisoned)?;
        Ok(transcripts.get(video_id).cloned())
    }

    async fn list_transcripts(&self) -> Result<Vec<VideoListing>> {
        let transcripts = self.transcripts.read().map_err(poisoned)?;
        let embeddings = self.embeddings.read().map_err(poisoned)?;

        let mut listings: Vec<VideoListing> = transcripts
            .values()
            .map(|record| VideoListing {
                info: record.info(),
                created_at: record.created_at,
                updated_at: record.updated_at,
                embedding_count: embeddings.get(&record.video_id).map_or(0, Vec::len),
            })
            .collect();

        listings.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.info.video_id.cmp(&b.info.video_id))
        });
        Ok(listings)
    }
}

#[async_trait]
impl EmbeddingStore for MemoryStore {
    async fn replace_embeddings(&self, video_id: &str, records: &[EmbeddingRecord]) -> Result<usize> {
        let mut sorted = records.to_vec();
        sorted.sort_by_key(|r| r.chunk_index);
        sorted.dedup_by_key(|r| r.chunk_index);

        let count = sorted.len();
        let mut embeddings = self.embeddings.write().map_err(poisoned)?;
        embeddings.insert(video_id.to_string(), sorted);
        Ok(count)
    }

    async fn get_embeddings(&self, video_id: &str) -> Result<Vec<EmbeddingRecord>> {
        let embeddings = self.embeddings.read().map_err(poisoned)?;
        Ok(embeddings.get(video_id).cloned().unwrap_or_default())
    }

    async fn embedding_count(&self, video_id: &str) -> Result<usize> {
        let embeddings = self.embeddings.read().map_err(poisoned)?;
        Ok(embeddings.get(video_id).map_or(0, Vec::len))
    }

    async fn delete_embeddings(&self, video_id: &str) -> Result<usize> {
        let mut embeddings = self.embeddings.write().map_err(poisoned)?;
        Ok(embeddings.remove(video_id).map_or(0, |v| v.len()))
    }
}
