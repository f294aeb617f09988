//! Semantic-boundary chunking on top of `text_splitter`.
//!
//! The splitter prefers the coarsest boundary that keeps a chunk within the
//! target size (paragraph, then line, sentence, word, grapheme) and carries a
//! tail of the previous chunk forward as overlap.

use super::{Chunker, ChunkingConfig};
use crate::config::ChunkingSettings;
use text_splitter::{Characters, ChunkConfig, TextSplitter};
use tracing::warn;

/// Character-count based chunker.
///
/// Output depends only on the input text and the config, so re-chunking the
/// same transcript always yields the same sequence.
pub struct RecursiveChunker {
    config: ChunkingConfig,
    splitter: TextSplitter<Characters>,
}

impl RecursiveChunker {
    pub fn new(config: ChunkingConfig) -> Self {
        let size = config.chunk_size.max(1);
        let chunk_config = match ChunkConfig::new(size).with_overlap(config.chunk_overlap) {
            Ok(chunk_config) => chunk_config,
            Err(e) => {
                // Validated settings never get here; direct construction can.
                warn!("{}; chunking without overlap", e);
                ChunkConfig::new(size)
            }
        };

        Self {
            config,
            splitter: TextSplitter::new(chunk_config),
        }
    }

    pub fn from_settings(settings: &ChunkingSettings) -> Self {
        Self::new(ChunkingConfig::from(settings))
    }

    pub fn config(&self) -> &ChunkingConfig {
        &self.config
    }
}

impl Default for RecursiveChunker {
    fn default() -> Self {
        Self::new(ChunkingConfig::default())
    }
}

impl Chunker for RecursiveChunker {
    fn split(&self, text: &str) -> Vec<String> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Vec::new();
        }
        if trimmed.chars().count() <= self.config.chunk_size {
            return vec![trimmed.to_string()];
        }
        self.splitter
            .chunks(trimmed)
            .map(str::trim)
            .filter(|chunk| !chunk.is_empty())
            .map(str::to_string)
            .collect()
    }
}
