//! Grounded answer generation from retrieved context.

use super::rerank::RankedChunk;
use crate::config::{LlmSettings, Prompts};
use crate::llm::{CompletionOptions, LanguageModel};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Outcome of one synthesis call.
#[derive(Debug, Clone, PartialEq)]
pub enum Synthesis {
    Answer(String),
    /// The model call failed; holds the user-facing error text.
    Failed(String),
}

impl Synthesis {
    pub fn text(&self) -> &str {
        match self {
            Synthesis::Answer(text) | Synthesis::Failed(text) => text,
        }
    }

    pub fn into_text(self) -> String {
        match self {
            Synthesis::Answer(text) | Synthesis::Failed(text) => text,
        }
    }
}

/// Number chunks as `Segment N:` blocks for the prompt.
pub fn format_context(chunks: &[RankedChunk]) -> String {
    chunks
        .iter()
        .enumerate()
        .map(|(i, chunk)| format!("Segment {}:\n{}", i + 1, chunk.hit.text))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Prompts a language model with numbered context segments.
pub struct AnswerSynthesizer {
    llm: Arc<dyn LanguageModel>,
    prompts: Arc<Prompts>,
    options: CompletionOptions,
}

impl AnswerSynthesizer {
    pub fn new(llm: Arc<dyn LanguageModel>, prompts: Arc<Prompts>, settings: &LlmSettings) -> Self {
        Self {
            llm,
            prompts,
            options: CompletionOptions::new(&settings.model, settings.temperature)
                .with_max_tokens(settings.max_tokens),
        }
    }

    /// The full prompt sent for `question` over `chunks`.
    pub fn build_prompt(&self, question: &str, chunks: &[RankedChunk]) -> String {
        let mut vars = HashMap::new();
        vars.insert("context".to_string(), format_context(chunks));
        vars.insert("question".to_string(), question.to_string());
        self.prompts.render_with_custom(&self.prompts.rag.answer, &vars)
    }

    /// Answer `question` from `chunks`. Model failures come back as
    /// [`Synthesis::Failed`] rather than an error.
    pub async fn answer(&self, question: &str, chunks: &[RankedChunk]) -> Synthesis {
        let prompt = self.build_prompt(question, chunks);
        debug!("Answer prompt is {} characters", prompt.len());

        match self.llm.complete(&prompt, &self.options).await {
            Ok(text) => Synthesis::Answer(text.trim().to_string()),
            Err(e) => {
                warn!("Answer generation failed: {}", e);
                Synthesis::Failed(format!("I encountered an error processing your question: {}", e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunking::ChunkMetadata;
    use crate::error::{Result, TubeChatError};
    use crate::index::SearchHit;
    use async_trait::async_trait;

    struct Echo;

    #[async_trait]
    impl LanguageModel for Echo {
        async fn complete(&self, prompt: &str, _options: &CompletionOptions) -> Result<String> {
            Ok(format!("  {} chars  ", prompt.len()))
        }

        async fn complete_json(&self, _prompt: &str, _options: &CompletionOptions) -> Result<String> {
            Ok("{}".to_string())
        }
    }

    struct Down;

    #[async_trait]
    impl LanguageModel for Down {
        async fn complete(&self, _prompt: &str, _options: &CompletionOptions) -> Result<String> {
            Err(TubeChatError::Llm("service unavailable".to_string()))
        }

        async fn complete_json(&self, _prompt: &str, _options: &CompletionOptions) -> Result<String> {
            Err(TubeChatError::Llm("service unavailable".to_string()))
        }
    }

    fn chunk(text: &str) -> RankedChunk {
        RankedChunk {
            hit: SearchHit {
                chunk_index: 0,
                text: text.to_string(),
                metadata: ChunkMetadata::from_text(text),
                score: 0.0,
            },
            score: 0.0,
        }
    }

    fn synthesizer(llm: Arc<dyn LanguageModel>) -> AnswerSynthesizer {
        AnswerSynthesizer::new(llm, Arc::new(Prompts::default()), &LlmSettings::default())
    }

    #[test]
    fn test_prompt_numbers_segments() {
        let s = synthesizer(Arc::new(Echo));
        let prompt = s.build_prompt(
            "What is mixed?",
            &[chunk("[00:10] mixing paint"), chunk("[00:20] cleaning")],
        );
        assert!(prompt.contains("Segment 1:\n[00:10] mixing paint\n\nSegment 2:\n[00:20] cleaning"));
        assert!(prompt.contains("USER QUESTION: What is mixed?"));
        assert!(!prompt.contains("{{"));
    }

    #[tokio::test]
    async fn test_answer_is_trimmed() {
        let s = synthesizer(Arc::new(Echo));
        let result = s.answer("q", &[chunk("c")]).await;
        assert!(matches!(result, Synthesis::Answer(ref t) if t.ends_with("chars")));
    }

    #[tokio::test]
    async fn test_failure_is_captured() {
        let s = synthesizer(Arc::new(Down));
        let result = s.answer("q", &[chunk("c")]).await;
        assert_eq!(
            result,
            Synthesis::Failed(
                "I encountered an error processing your question: Language model error: service unavailable"
                    .to_string()
            )
        );
    }
}
