//! CLI command implementations.

mod ask;
mod chat;
mod config;
mod index;
mod list;
mod load;
mod study;

pub use ask::run_ask;
pub use chat::run_chat;
pub use config::run_config;
pub use index::run_index;
pub use list::run_list;
pub use load::run_load;
pub use study::run_study;

use crate::cli::Output;
use crate::config::Settings;
use crate::engine::{ChatEngine, EmbeddingStatus};
use anyhow::Result;

/// Create an engine and make `video` its active video.
async fn open_video(video: &str, settings: Settings) -> Result<ChatEngine> {
    let mut engine = ChatEngine::new(settings)?;
    match engine.load_video(video, None, None).await {
        Ok(loaded) => {
            Output::info(&format!("Loaded: {}", loaded.info.title));
            Ok(engine)
        }
        Err(e) => {
            Output::error(&format!("Failed to load video: {}", e));
            Output::info("Use 'tubechat load <video> --transcript <file>' to add a transcript.");
            Err(e.into())
        }
    }
}

/// Build embeddings for the active video if they are missing.
async fn prepare_embeddings(engine: &ChatEngine) -> Result<()> {
    let Some(video_id) = engine.session().map(|s| s.video_id().to_string()) else {
        return Ok(());
    };

    let spinner = Output::spinner("Checking embeddings...");
    let status = engine.ensure_embeddings(&video_id).await;
    spinner.finish_and_clear();

    report_embeddings(status?);
    Ok(())
}

fn report_embeddings(status: EmbeddingStatus) {
    match status {
        EmbeddingStatus::AlreadySufficient { count } => {
            Output::kv("Embeddings", &format!("{} stored", count));
        }
        EmbeddingStatus::Regenerated { embedded, failed } => {
            Output::success(&format!("Embedded {} chunks", embedded));
            if failed > 0 {
                Output::warning(&format!("{} chunks could not be embedded", failed));
            }
        }
    }
}
