//! Load command implementation.

use super::report_embeddings;
use crate::cli::Output;
use crate::config::Settings;
use crate::engine::{ChatEngine, TranscriptOrigin};
use crate::transcript::{extract_video_id, VideoInfo};
use anyhow::{Context, Result};

/// Run the load command.
pub async fn run_load(
    video: &str,
    transcript: Option<String>,
    title: Option<String>,
    channel: Option<String>,
    no_embed: bool,
    settings: Settings,
) -> Result<()> {
    let text = match &transcript {
        Some(path) => Some(
            std::fs::read_to_string(Settings::expand_path(path))
                .with_context(|| format!("Failed to read transcript file {}", path))?,
        ),
        None => None,
    };

    let mut engine = ChatEngine::new(settings)?;

    // Explicit title or channel skips the metadata lookup
    let info = if title.is_some() || channel.is_some() {
        let id = extract_video_id(video).unwrap_or_else(|| video.to_string());
        let mut info = VideoInfo::fallback(&id);
        if let Some(title) = title {
            info.title = title;
        }
        if let Some(channel) = channel {
            info.channel = channel;
        }
        Some(info)
    } else {
        None
    };

    let spinner = Output::spinner("Loading transcript...");
    let loaded = engine.load_video(video, text.as_deref(), info).await;
    spinner.finish_and_clear();

    let loaded = match loaded {
        Ok(loaded) => loaded,
        Err(e) => {
            Output::error(&format!("Failed to load video: {}", e));
            return Err(e.into());
        }
    };

    Output::header(&loaded.info.title);
    Output::kv("Video ID", &loaded.info.video_id);
    Output::kv("Channel", &loaded.info.channel);
    Output::kv("Duration", &loaded.info.duration);
    Output::kv(
        "Transcript",
        &format!(
            "{} characters ({})",
            loaded.transcript_chars,
            match loaded.origin {
                TranscriptOrigin::Provided => "from file",
                TranscriptOrigin::Stored => "from store",
                TranscriptOrigin::Fetched => "fetched",
            }
        ),
    );
    if loaded.embeddings_invalidated {
        Output::warning("Transcript changed; previous embeddings were discarded.");
    }

    if no_embed {
        Output::info("Skipping embeddings. Run 'tubechat index <video>' before asking questions.");
        return Ok(());
    }

    let spinner = Output::spinner("Generating embeddings...");
    let status = engine.ensure_embeddings(&loaded.info.video_id).await;
    spinner.finish_and_clear();
    report_embeddings(status?);

    Ok(())
}
