//! List command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::engine::ChatEngine;
use anyhow::Result;

/// Run the list command.
pub async fn run_list(settings: Settings) -> Result<()> {
    let engine = ChatEngine::new(settings)?;

    match engine.list_available_videos().await {
        Ok(videos) => {
            if videos.is_empty() {
                Output::info("No videos loaded yet. Use 'tubechat load <video>' to add one.");
            } else {
                Output::header(&format!("Stored Videos ({})", videos.len()));
                println!();

                for listing in &videos {
                    Output::video_listing(listing);
                }

                let indexed = videos.iter().filter(|v| v.embedding_count > 0).count();
                println!();
                Output::kv("Total videos", &videos.len().to_string());
                Output::kv("Indexed", &indexed.to_string());
            }
        }
        Err(e) => {
            Output::error(&format!("Failed to list videos: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
