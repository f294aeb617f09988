//! Shared fixtures for engine integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tubechat::config::{Prompts, Settings};
use tubechat::embedding::HashingEmbedder;
use tubechat::error::{Result, TubeChatError};
use tubechat::llm::{CompletionOptions, LanguageModel};
use tubechat::store::Store;
use tubechat::ChatEngine;

pub const VIDEO_ID: &str = "dQw4w9WgXcQ";

/// Language model double with fixed replies per kind of prompt.
pub struct ScriptedLanguageModel {
    pub answer: String,
    pub faithfulness: String,
    pub relevance: String,
    /// `Err` makes every structured call fail with that message.
    pub json: std::result::Result<String, String>,
    pub prompts: Mutex<Vec<String>>,
}

impl Default for ScriptedLanguageModel {
    fn default() -> Self {
        Self {
            answer: "At [00:10] the presenter sharpens the chisel on a whetstone.".to_string(),
            faithfulness: "0.9".to_string(),
            relevance: "0.8".to_string(),
            json: Ok("{}".to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }
}

impl ScriptedLanguageModel {
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl LanguageModel for ScriptedLanguageModel {
    async fn complete(&self, prompt: &str, _options: &CompletionOptions) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        let reply = if prompt.starts_with("Evaluate the faithfulness") {
            &self.faithfulness
        } else if prompt.starts_with("Evaluate how well") {
            &self.relevance
        } else {
            &self.answer
        };
        Ok(reply.clone())
    }

    async fn complete_json(&self, prompt: &str, _options: &CompletionOptions) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.json.clone().map_err(TubeChatError::Llm)
    }
}

/// Settings that split [`transcript`] into exactly one chunk per line.
pub fn settings() -> Settings {
    let mut settings = Settings::default();
    settings.chunking.chunk_size = 400;
    settings.chunking.chunk_overlap = 0;
    settings
}

/// Three timestamped lines, each long enough to be its own chunk.
pub fn transcript() -> String {
    [
        (0, "welcome to the workshop where we talk about woodworking tools and safety rules for beginners. "),
        (10, "now we sharpen the chisel on a whetstone keeping a steady angle until the edge is keen. "),
        (20, "finally we cut the dovetail joint and check that both halves fit together snugly. "),
    ]
    .iter()
    .map(|(secs, sentence)| format!("[00:{:02}] {}", secs, sentence.repeat(3).trim()))
    .collect::<Vec<_>>()
    .join("\n")
}

pub fn engine_with<S: Store + 'static>(store: Arc<S>, llm: Arc<ScriptedLanguageModel>) -> ChatEngine {
    ChatEngine::with_components(
        settings(),
        Prompts::default(),
        store,
        Arc::new(HashingEmbedder::default()),
        llm,
    )
}
