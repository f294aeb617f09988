//! OpenAI chat-completions implementation.

use super::{CompletionOptions, LanguageModel};
use crate::error::{Result, TubeChatError};
use crate::openai::create_client;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs, ResponseFormat,
};
use async_trait::async_trait;
use tracing::{debug, instrument};

const SYSTEM_PROMPT: &str = "You are a helpful assistant that answers questions about YouTube videos using only the transcript material you are given.";
const JSON_SYSTEM_PROMPT: &str = "You are a helpful assistant that always responds with a single valid JSON object.";

/// Chat-completion backed language model.
pub struct OpenAILanguageModel {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
}

impl OpenAILanguageModel {
    pub fn new() -> Result<Self> {
        Ok(Self {
            client: create_client()?,
        })
    }

    async fn chat(
        &self,
        system: &str,
        prompt: &str,
        options: &CompletionOptions,
        json: bool,
    ) -> Result<String> {
        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(system)
                .build()
                .map_err(|e| TubeChatError::Llm(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(prompt)
                .build()
                .map_err(|e| TubeChatError::Llm(e.to_string()))?
                .into(),
        ];

        let mut builder = CreateChatCompletionRequestArgs::default();
        builder
            .model(&options.model)
            .messages(messages)
            .temperature(options.temperature);
        if let Some(max_tokens) = options.max_tokens {
            builder.max_completion_tokens(max_tokens);
        }
        if json {
            builder.response_format(ResponseFormat::JsonObject);
        }
        let request = builder.build().map_err(|e| TubeChatError::Llm(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| TubeChatError::OpenAI(format!("Failed to generate response: {}", e)))?;

        let content = response
            .choices
            .first()
            .and_then(|c| c.message.content.as_ref())
            .ok_or_else(|| TubeChatError::Llm("Empty response from LLM".to_string()))?
            .clone();

        debug!("Received {} characters from {}", content.len(), options.model);
        Ok(content)
    }
}

#[async_trait]
impl LanguageModel for OpenAILanguageModel {
    #[instrument(skip(self, prompt), fields(model = %options.model))]
    async fn complete(&self, prompt: &str, options: &CompletionOptions) -> Result<String> {
        self.chat(SYSTEM_PROMPT, prompt, options, false).await
    }

    #[instrument(skip(self, prompt), fields(model = %options.model))]
    async fn complete_json(&self, prompt: &str, options: &CompletionOptions) -> Result<String> {
        self.chat(JSON_SYSTEM_PROMPT, prompt, options, true).await
    }
}
