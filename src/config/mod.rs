//! Configuration module for tubechat.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{EvaluationPrompts, Prompts, RagPrompts, StudyPrompts};
pub use settings::{
    ChunkingSettings, EmbeddingProvider, EmbeddingSettings, EvaluationSettings, GeneralSettings,
    LlmSettings, PromptSettings, RetrievalSettings, Settings, StoreSettings, StudySettings,
    TranscriptSettings,
};
