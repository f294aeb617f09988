//! The active conversation: which video is loaded and what has been said.

use crate::transcript::VideoInfo;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

/// State scoped to one loaded video. Loading another video replaces the
/// whole session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub video: VideoInfo,
    pub started_at: DateTime<Utc>,
    history: Vec<ChatMessage>,
}

impl Session {
    pub fn new(video: VideoInfo) -> Self {
        Self {
            id: Uuid::new_v4(),
            video,
            started_at: Utc::now(),
            history: Vec::new(),
        }
    }

    pub fn video_id(&self) -> &str {
        &self.video.video_id
    }

    /// Messages in submission order.
    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    /// Record one question and its answer.
    pub fn record_exchange(&mut self, question: impl Into<String>, answer: impl Into<String>) {
        self.history.push(ChatMessage {
            role: Role::User,
            content: question.into(),
        });
        self.history.push(ChatMessage {
            role: Role::Assistant,
            content: answer.into(),
        });
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }
}
