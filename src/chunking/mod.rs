//! Splitting transcripts into overlapping, timestamp-annotated chunks.
//!
//! Chunks are the unit of embedding and retrieval. Each one carries the
//! bracketed timestamp markers it contains so retrieval can cite positions
//! in the video.

mod recursive;

pub use recursive::RecursiveChunker;

use crate::config::ChunkingSettings;
use crate::transcript::find_timestamps;
use serde::{Deserialize, Serialize};

/// Whether a chunk carries timestamp markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkType {
    Text,
    Timestamped,
}

/// A contiguous slice of transcript text with positional metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub video_id: String,
    /// 0-based position in the chunk sequence.
    pub chunk_index: usize,
    pub text: String,
    #[serde(flatten)]
    pub metadata: ChunkMetadata,
}

/// Metadata derived from chunk text alone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// First timestamp marker in the chunk (brackets stripped).
    pub start_timestamp: Option<String>,
    /// Last timestamp marker in the chunk.
    pub end_timestamp: Option<String>,
    pub timestamp_count: usize,
    pub word_count: usize,
    pub char_count: usize,
    pub chunk_type: ChunkType,
}

impl ChunkMetadata {
    pub fn from_text(text: &str) -> Self {
        let timestamps = find_timestamps(text);
        let chunk_type = if timestamps.is_empty() {
            ChunkType::Text
        } else {
            ChunkType::Timestamped
        };

        Self {
            start_timestamp: timestamps.first().cloned(),
            end_timestamp: timestamps.last().cloned(),
            timestamp_count: timestamps.len(),
            word_count: text.split_whitespace().count(),
            char_count: text.chars().count(),
            chunk_type,
        }
    }

    pub fn has_timestamp(&self) -> bool {
        self.timestamp_count > 0
    }
}

/// Size parameters for chunking. Sizes are measured in characters.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkingConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 800,
            chunk_overlap: 200,
        }
    }
}

impl From<&ChunkingSettings> for ChunkingConfig {
    fn from(settings: &ChunkingSettings) -> Self {
        Self {
            chunk_size: settings.chunk_size,
            chunk_overlap: settings.chunk_overlap,
        }
    }
}

/// Splits raw transcript text into ordered pieces.
pub trait Chunker: Send + Sync {
    /// Split `text` into ordered, non-empty pieces.
    fn split(&self, text: &str) -> Vec<String>;

    /// Split `text` and attach metadata, numbering chunks from zero.
    fn chunk(&self, video_id: &str, text: &str) -> Vec<Chunk> {
        self.split(text)
            .into_iter()
            .enumerate()
            .map(|(chunk_index, text)| Chunk {
                video_id: video_id.to_string(),
                chunk_index,
                metadata: ChunkMetadata::from_text(&text),
                text,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_from_timestamped_text() {
        let meta = ChunkMetadata::from_text("[00:05] hello there [01:02:03] general kenobi");
        assert_eq!(meta.start_timestamp.as_deref(), Some("00:05"));
        assert_eq!(meta.end_timestamp.as_deref(), Some("01:02:03"));
        assert_eq!(meta.timestamp_count, 2);
        assert_eq!(meta.word_count, 6);
        assert_eq!(meta.chunk_type, ChunkType::Timestamped);
    }

    #[test]
    fn test_metadata_from_plain_text() {
        let meta = ChunkMetadata::from_text("just some words");
        assert_eq!(meta.start_timestamp, None);
        assert_eq!(meta.timestamp_count, 0);
        assert_eq!(meta.char_count, 15);
        assert_eq!(meta.chunk_type, ChunkType::Text);
        assert!(!meta.has_timestamp());
    }
}
