//! Video metadata from YouTube's public oEmbed endpoint.

use super::{VideoInfo, VideoInfoSource};
use async_trait::async_trait;
use crate::error::{Result, TubeChatError};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

const OEMBED_ENDPOINT: &str = "https://www.youtube.com/oembed";

#[derive(Debug, Deserialize)]
struct OEmbedResponse {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    author_name: Option<String>,
    #[serde(default)]
    thumbnail_url: Option<String>,
}

/// Fetches title, channel and thumbnail for a video.
///
/// oEmbed does not report duration, so that field stays "Unknown".
pub struct OEmbedClient {
    http: reqwest::Client,
    endpoint: String,
}

impl OEmbedClient {
    pub fn new() -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            http,
            endpoint: OEMBED_ENDPOINT.to_string(),
        })
    }

    /// Point the client at a different oEmbed endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    fn request_url(&self, video_id: &str) -> Result<Url> {
        let watch = format!("https://www.youtube.com/watch?v={}", video_id);
        Url::parse_with_params(&self.endpoint, &[("url", watch.as_str()), ("format", "json")])
            .map_err(|e| TubeChatError::Config(format!("Invalid oEmbed endpoint: {}", e)))
    }

    async fn fetch(&self, video_id: &str) -> Result<VideoInfo> {
        let url = self.request_url(video_id)?;
        debug!("Fetching video info from {}", url);

        let response: OEmbedResponse = self
            .http
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let fallback = VideoInfo::fallback(video_id);
        Ok(VideoInfo {
            video_id: video_id.to_string(),
            title: response.title.unwrap_or(fallback.title),
            channel: response.author_name.unwrap_or(fallback.channel),
            duration: fallback.duration,
            thumbnail_url: response.thumbnail_url.unwrap_or(fallback.thumbnail_url),
        })
    }
}

#[async_trait]
impl VideoInfoSource for OEmbedClient {
    async fn get_video_info(&self, video_id: &str) -> VideoInfo {
        match self.fetch(video_id).await {
            Ok(info) => info,
            Err(e) => {
                warn!("Could not fetch video info for {}: {}", video_id, e);
                VideoInfo::fallback(video_id)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_url_encodes_watch_url() {
        let client = OEmbedClient::new().unwrap();
        let url = client.request_url("dQw4w9WgXcQ").unwrap();
        assert_eq!(url.host_str(), Some("www.youtube.com"));
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("url".to_string(), "https://www.youtube.com/watch?v=dQw4w9WgXcQ".to_string()),
                ("format".to_string(), "json".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_falls_back() {
        let client = OEmbedClient::new()
            .unwrap()
            .with_endpoint("http://127.0.0.1:9/oembed");
        let info = client.get_video_info("dQw4w9WgXcQ").await;
        assert_eq!(info, VideoInfo::fallback("dQw4w9WgXcQ"));
    }
}
