//! Error types for tubechat.

use thiserror::Error;

/// Library-level error type for tubechat operations.
#[derive(Error, Debug)]
pub enum TubeChatError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid video identifier: {0}")]
    InvalidVideoId(String),

    #[error("Transcript unavailable: {0}")]
    TranscriptUnavailable(String),

    #[error("No video is loaded")]
    NoActiveVideo,

    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Language model error: {0}")]
    Llm(String),

    #[error("Failed to parse model output: {0}")]
    Parse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("OpenAI API error: {0}")]
    OpenAI(String),
}

/// Result type alias for tubechat operations.
pub type Result<T> = std::result::Result<T, TubeChatError>;
