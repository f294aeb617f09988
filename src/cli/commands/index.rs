//! Index command implementation.

use super::{open_video, report_embeddings};
use crate::cli::Output;
use crate::config::Settings;
use anyhow::Result;

/// Run the index command.
pub async fn run_index(video: &str, force: bool, settings: Settings) -> Result<()> {
    let engine = open_video(video, settings).await?;
    let Some(video_id) = engine.session().map(|s| s.video_id().to_string()) else {
        return Ok(());
    };

    let spinner = Output::spinner(if force {
        "Regenerating embeddings..."
    } else {
        "Checking embeddings..."
    });
    let status = if force {
        engine.regenerate_embeddings(&video_id).await
    } else {
        engine.ensure_embeddings(&video_id).await
    };
    spinner.finish_and_clear();

    match status {
        Ok(status) => {
            report_embeddings(status);
            Ok(())
        }
        Err(e) => {
            Output::error(&format!("Failed to index {}: {}", video_id, e));
            Err(e.into())
        }
    }
}
