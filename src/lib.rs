//! tubechat - Chat with YouTube video transcripts
//!
//! Loads a video's timestamped transcript, splits it into overlapping chunks,
//! embeds them and answers questions with retrieved, cited context. The same
//! transcript also feeds structured study material generators.
//!
//! # Architecture
//!
//! - `config` - Settings and prompt templates
//! - `transcript` - Timestamp handling, video IDs, transcript and metadata sources
//! - `chunking` - Boundary-aware chunking with timestamp metadata
//! - `embedding` - Embedding generation with per-item failure isolation
//! - `store` - Transcript and embedding persistence (SQLite, in-memory)
//! - `index` - In-memory cosine similarity index per video
//! - `llm` - Language model completion
//! - `rag` - Query expansion, reranking, answer synthesis and evaluation
//! - `study` - Summaries, highlights, study guides, notes, flashcards
//! - `session` - The active video and its chat history
//! - `engine` - The entry point tying everything together
//!
//! # Example
//!
//! ```rust,no_run
//! use tubechat::config::Settings;
//! use tubechat::engine::ChatEngine;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut engine = ChatEngine::new(Settings::load()?)?;
//!
//!     let loaded = engine.load_video("dQw4w9WgXcQ", None, None).await?;
//!     engine.ensure_embeddings(&loaded.info.video_id).await?;
//!
//!     let answer = engine.ask("What is the chorus about?").await;
//!     println!("{}", answer);
//!
//!     Ok(())
//! }
//! ```

pub mod chunking;
pub mod cli;
pub mod config;
pub mod embedding;
pub mod engine;
pub mod error;
pub mod index;
pub mod llm;
pub mod openai;
pub mod rag;
pub mod session;
pub mod store;
pub mod study;
pub mod transcript;

pub use engine::ChatEngine;
pub use error::{Result, TubeChatError};
