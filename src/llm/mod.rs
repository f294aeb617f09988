//! Language-model completion.
//!
//! Answer synthesis, evaluation grading and study generation all go through
//! [`LanguageModel`], so tests can swap the remote model for a scripted one.

mod openai;

pub use openai::OpenAILanguageModel;

use crate::error::Result;
use async_trait::async_trait;

/// Per-call generation options.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionOptions {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
}

impl CompletionOptions {
    pub fn new(model: impl Into<String>, temperature: f32) -> Self {
        Self {
            model: model.into(),
            temperature,
            max_tokens: None,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// A text-completion capability.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Complete `prompt` as free text.
    async fn complete(&self, prompt: &str, options: &CompletionOptions) -> Result<String>;

    /// Complete `prompt`, asking the model for a single JSON object.
    ///
    /// The returned text is not validated; callers decode it into their own
    /// schema.
    async fn complete_json(&self, prompt: &str, options: &CompletionOptions) -> Result<String>;
}
