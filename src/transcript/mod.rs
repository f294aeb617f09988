//! Transcript text conventions and the collaborators that supply transcripts.
//!
//! A transcript is plain text with one `[MM:SS] text` (or `[HH:MM:SS] text`)
//! line per caption entry. Everything downstream (chunking, retrieval,
//! citations) keys off those bracketed markers.

mod oembed;
mod source;

pub use oembed::OEmbedClient;
pub use source::{
    parse_transcript_lines, FallbackTranscriptSource, LocalFileStrategy, TranscriptKind,
    TranscriptSource, TranscriptStrategy, VideoInfoSource,
};

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static TIMESTAMP_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[(\d{1,2}:\d{2}(?::\d{2})?)\]").expect("valid timestamp regex"));

static VIDEO_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?x)
        (?:
            (?:https?://)?
            (?:www\.|m\.)?
            (?:youtube\.com/watch\?(?:.*&)?v=|youtu\.be/|youtube\.com/embed/|youtube\.com/shorts/|youtube\.com/v/)
            ([a-zA-Z0-9_-]{11})
        )
        |
        ^([a-zA-Z0-9_-]{11})$
    ",
    )
    .expect("valid video id regex")
});

/// A single caption entry before formatting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    /// Start time in seconds.
    #[serde(alias = "start")]
    pub start_seconds: f64,
    /// Caption text.
    pub text: String,
}

impl TranscriptEntry {
    pub fn new(start_seconds: f64, text: impl Into<String>) -> Self {
        Self {
            start_seconds,
            text: text.into(),
        }
    }
}

/// Metadata describing a video, as supplied by the video-info collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoInfo {
    pub video_id: String,
    pub title: String,
    pub channel: String,
    /// Human-readable duration ("MM:SS", "HH:MM:SS" or "Unknown").
    pub duration: String,
    pub thumbnail_url: String,
}

impl VideoInfo {
    /// Placeholder metadata used when no information can be fetched.
    pub fn fallback(video_id: &str) -> Self {
        Self {
            video_id: video_id.to_string(),
            title: format!("Video ID: {}", video_id),
            channel: "Unknown Channel".to_string(),
            duration: "Unknown".to_string(),
            thumbnail_url: format!("https://img.youtube.com/vi/{}/maxresdefault.jpg", video_id),
        }
    }
}

/// A stored transcript and its metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptRecord {
    pub video_id: String,
    /// Timestamped transcript text.
    pub raw_text: String,
    pub title: String,
    pub channel: String,
    pub duration: String,
    pub thumbnail_url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TranscriptRecord {
    /// Create a record for a freshly loaded transcript.
    pub fn new(raw_text: impl Into<String>, info: &VideoInfo) -> Self {
        let now = Utc::now();
        Self {
            video_id: info.video_id.clone(),
            raw_text: raw_text.into(),
            title: info.title.clone(),
            channel: info.channel.clone(),
            duration: info.duration.clone(),
            thumbnail_url: info.thumbnail_url.clone(),
            created_at: now,
            updated_at: now,
        }
    }

    /// The metadata portion of this record.
    pub fn info(&self) -> VideoInfo {
        VideoInfo {
            video_id: self.video_id.clone(),
            title: self.title.clone(),
            channel: self.channel.clone(),
            duration: self.duration.clone(),
            thumbnail_url: self.thumbnail_url.clone(),
        }
    }
}

/// Extract a YouTube video ID from a bare ID or a watch/short/embed URL.
pub fn extract_video_id(input: &str) -> Option<String> {
    let caps = VIDEO_ID.captures(input.trim())?;
    caps.get(1)
        .or_else(|| caps.get(2))
        .map(|m| m.as_str().to_string())
}

/// Format seconds as MM:SS or HH:MM:SS.
pub fn format_timestamp(seconds: f64) -> String {
    let total_seconds = if seconds.is_finite() && seconds > 0.0 {
        seconds as u32
    } else {
        0
    };
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;

    if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{:02}:{:02}", minutes, secs)
    }
}

/// Parse `MM:SS` or `HH:MM:SS` into seconds.
pub fn parse_timestamp(timestamp: &str) -> Option<u32> {
    let parts: Vec<u32> = timestamp
        .split(':')
        .map(|p| p.parse::<u32>().ok())
        .collect::<Option<Vec<_>>>()?;

    match parts.as_slice() {
        [m, s] if *s < 60 => Some(m * 60 + s),
        [h, m, s] if *m < 60 && *s < 60 => Some(h * 3600 + m * 60 + s),
        _ => None,
    }
}

/// All bracketed timestamp markers in `text`, in order of appearance (brackets stripped).
pub fn find_timestamps(text: &str) -> Vec<String> {
    TIMESTAMP_MARKER
        .captures_iter(text)
        .filter_map(|c| c.get(1).map(|m| m.as_str().to_string()))
        .collect()
}

/// Whether `text` carries at least one bracketed timestamp marker.
pub fn has_timestamp(text: &str) -> bool {
    TIMESTAMP_MARKER.is_match(text)
}

/// Render caption entries as `[MM:SS] text` lines.
///
/// Whitespace inside each entry is collapsed and empty entries are dropped.
pub fn format_transcript(entries: &[TranscriptEntry]) -> String {
    entries
        .iter()
        .filter_map(|entry| {
            let text = entry.text.split_whitespace().collect::<Vec<_>>().join(" ");
            if text.is_empty() {
                None
            } else {
                Some(format!("[{}] {}", format_timestamp(entry.start_seconds), text))
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
