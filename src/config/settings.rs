//! Configuration settings for tubechat.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub embedding: EmbeddingSettings,
    pub chunking: ChunkingSettings,
    pub retrieval: RetrievalSettings,
    pub llm: LlmSettings,
    pub evaluation: EvaluationSettings,
    pub study: StudySettings,
    pub store: StoreSettings,
    pub transcripts: TranscriptSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for storing application data.
    pub data_dir: String,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            data_dir: "~/.tubechat".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// Embedding provider type.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    /// OpenAI embeddings API.
    #[default]
    OpenAI,
    /// Local feature-hashing embedder (offline, lexical).
    Hashing,
}

impl std::str::FromStr for EmbeddingProvider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(EmbeddingProvider::OpenAI),
            "hashing" | "local" => Ok(EmbeddingProvider::Hashing),
            _ => Err(format!("Unknown embedding provider: {}", s)),
        }
    }
}

impl std::fmt::Display for EmbeddingProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EmbeddingProvider::OpenAI => write!(f, "openai"),
            EmbeddingProvider::Hashing => write!(f, "hashing"),
        }
    }
}

/// Embedding generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// Embedding provider (openai, hashing).
    pub provider: EmbeddingProvider,
    /// Embedding model to use.
    pub model: String,
    /// Embedding dimensions.
    pub dimensions: u32,
    /// Number of texts sent per embedding request.
    pub batch_size: usize,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: EmbeddingProvider::OpenAI,
            model: "text-embedding-3-small".to_string(),
            dimensions: 1536,
            batch_size: 50,
        }
    }
}

/// Transcript chunking settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingSettings {
    /// Target maximum chunk size in characters.
    pub chunk_size: usize,
    /// Characters shared between consecutive chunks.
    pub chunk_overlap: usize,
}

impl Default for ChunkingSettings {
    fn default() -> Self {
        Self {
            chunk_size: 800,
            chunk_overlap: 200,
        }
    }
}

/// Retrieval settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    /// Hits fetched per expanded query.
    pub per_query_k: usize,
    /// Chunks kept after reranking.
    pub top_k: usize,
    /// Stored chunk count below which embeddings are regenerated on load.
    pub min_embedding_chunks: usize,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            per_query_k: 8,
            top_k: 6,
            min_embedding_chunks: 5,
        }
    }
}

/// Answer generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    /// Chat model used for answers.
    pub model: String,
    /// Sampling temperature for answers.
    pub temperature: f32,
    /// Maximum tokens in an answer.
    pub max_tokens: u32,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o".to_string(),
            temperature: 0.1,
            max_tokens: 1000,
        }
    }
}

/// Response evaluation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationSettings {
    /// Attach quality scores to answers.
    pub enabled: bool,
    /// Model used for the graded axes.
    pub model: String,
    /// Sampling temperature for grading prompts.
    pub temperature: f32,
    /// Maximum tokens in a grading reply.
    pub max_tokens: u32,
    /// Score used when faithfulness grading fails.
    pub faithfulness_default: f32,
    /// Score used when relevance grading fails.
    pub relevance_default: f32,
    /// Context characters included in the faithfulness prompt.
    pub context_chars: usize,
}

impl Default for EvaluationSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            model: "gpt-4o-mini".to_string(),
            temperature: 0.1,
            max_tokens: 10,
            faithfulness_default: 0.7,
            relevance_default: 0.8,
            context_chars: 3000,
        }
    }
}

/// Study material generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StudySettings {
    /// Model used for structured generation.
    pub model: String,
    /// Transcript character caps per generator.
    pub summary_chars: usize,
    pub highlights_chars: usize,
    pub mood_chars: usize,
    pub study_guide_chars: usize,
    pub notes_chars: usize,
    pub flashcards_chars: usize,
    pub learning_path_chars: usize,
}

impl Default for StudySettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o".to_string(),
            summary_chars: 6000,
            highlights_chars: 5000,
            mood_chars: 4000,
            study_guide_chars: 8000,
            notes_chars: 6000,
            flashcards_chars: 7000,
            learning_path_chars: 6000,
        }
    }
}

/// Persistent store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    /// Path to the SQLite database.
    pub sqlite_path: String,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            sqlite_path: "~/.tubechat/tubechat.db".to_string(),
        }
    }
}

/// Transcript acquisition settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptSettings {
    /// Directory searched for local transcript files.
    pub dir: String,
    /// Preferred transcript languages, in order.
    pub languages: Vec<String>,
}

impl Default for TranscriptSettings {
    fn default() -> Self {
        Self {
            dir: "~/.tubechat/transcripts".to_string(),
            languages: vec!["en".to_string(), "en-US".to_string(), "en-GB".to_string()],
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            settings.validate()?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Reject combinations the chunker and retriever cannot work with.
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.chunking.chunk_size == 0 {
            return Err(crate::error::TubeChatError::Config(
                "chunking.chunk_size must be greater than zero".to_string(),
            ));
        }
        if self.chunking.chunk_overlap >= self.chunking.chunk_size {
            return Err(crate::error::TubeChatError::Config(format!(
                "chunking.chunk_overlap ({}) must be smaller than chunking.chunk_size ({})",
                self.chunking.chunk_overlap, self.chunking.chunk_size
            )));
        }
        if self.retrieval.top_k == 0 || self.retrieval.per_query_k == 0 {
            return Err(crate::error::TubeChatError::Config(
                "retrieval.top_k and retrieval.per_query_k must be greater than zero".to_string(),
            ));
        }
        if self.embedding.batch_size == 0 {
            return Err(crate::error::TubeChatError::Config(
                "embedding.batch_size must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Save settings to the default configuration file.
    pub fn save(&self) -> crate::error::Result<()> {
        self.save_to(&Self::default_config_path())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::TubeChatError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("tubechat")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded data directory path.
    pub fn data_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.data_dir)
    }

    /// Get the expanded SQLite database path.
    pub fn sqlite_path(&self) -> PathBuf {
        Self::expand_path(&self.store.sqlite_path)
    }

    /// Get the expanded local transcript directory.
    pub fn transcripts_dir(&self) -> PathBuf {
        Self::expand_path(&self.transcripts.dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.chunking.chunk_size, 800);
        assert_eq!(settings.retrieval.top_k, 6);
        assert_eq!(settings.embedding.batch_size, 50);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let settings: Settings = toml::from_str(
            r#"
            [retrieval]
            top_k = 3

            [embedding]
            provider = "hashing"
            dimensions = 256
            "#,
        )
        .unwrap();

        assert_eq!(settings.retrieval.top_k, 3);
        assert_eq!(settings.retrieval.per_query_k, 8);
        assert_eq!(settings.embedding.provider, EmbeddingProvider::Hashing);
        assert_eq!(settings.embedding.model, "text-embedding-3-small");
    }

    #[test]
    fn test_overlap_must_be_smaller_than_size() {
        let mut settings = Settings::default();
        settings.chunking.chunk_overlap = settings.chunking.chunk_size;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut settings = Settings::default();
        settings.llm.model = "gpt-4o-mini".to_string();
        settings.save_to(&path).unwrap();

        let loaded = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(loaded.llm.model, "gpt-4o-mini");
        assert_eq!(loaded.chunking.chunk_size, settings.chunking.chunk_size);
    }
}
