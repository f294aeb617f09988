//! Transcript acquisition as an ordered list of strategies.
//!
//! Each strategy either produces caption entries, reports that it has none,
//! or fails. [`FallbackTranscriptSource`] tries them in order and the first
//! one that yields a non-empty transcript wins.

use super::{format_transcript, parse_timestamp, TranscriptEntry, VideoInfo};
use crate::error::{Result, TubeChatError};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Something that can hand back a formatted, timestamped transcript.
#[async_trait]
pub trait TranscriptSource: Send + Sync {
    /// Fetch the transcript for `video_id`, preferring `languages` in order.
    ///
    /// Returns `Ok(None)` when no transcript exists.
    async fn get_transcript(&self, video_id: &str, languages: &[String]) -> Result<Option<String>>;
}

/// Supplies display metadata for a video.
#[async_trait]
pub trait VideoInfoSource: Send + Sync {
    /// Metadata for `video_id`. Lookups that fail yield [`VideoInfo::fallback`].
    async fn get_video_info(&self, video_id: &str) -> VideoInfo;
}

/// One way of obtaining caption entries.
#[async_trait]
pub trait TranscriptStrategy: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Try to fetch caption entries. `Ok(None)` means "not available here".
    async fn fetch(&self, video_id: &str, languages: &[String]) -> Result<Option<Vec<TranscriptEntry>>>;
}

/// Tries strategies in order; the first non-empty transcript wins.
pub struct FallbackTranscriptSource {
    strategies: Vec<Box<dyn TranscriptStrategy>>,
}

impl FallbackTranscriptSource {
    pub fn new(strategies: Vec<Box<dyn TranscriptStrategy>>) -> Self {
        Self { strategies }
    }

    /// Manual captions, then generated captions, then anything for the video.
    pub fn local(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        Self::new(vec![
            Box::new(LocalFileStrategy::new(dir.clone(), TranscriptKind::Manual)),
            Box::new(LocalFileStrategy::new(dir.clone(), TranscriptKind::Generated)),
            Box::new(LocalFileStrategy::new(dir, TranscriptKind::Any)),
        ])
    }
}

#[async_trait]
impl TranscriptSource for FallbackTranscriptSource {
    async fn get_transcript(&self, video_id: &str, languages: &[String]) -> Result<Option<String>> {
        for strategy in &self.strategies {
            match strategy.fetch(video_id, languages).await {
                Ok(Some(entries)) => {
                    let text = format_transcript(&entries);
                    if text.is_empty() {
                        debug!("Strategy {} returned an empty transcript", strategy.name());
                        continue;
                    }
                    info!(
                        "Transcript for {} obtained via {} ({} entries)",
                        video_id,
                        strategy.name(),
                        entries.len()
                    );
                    return Ok(Some(text));
                }
                Ok(None) => debug!("Strategy {} has no transcript for {}", strategy.name(), video_id),
                Err(e) => warn!("Strategy {} failed for {}: {}", strategy.name(), video_id, e),
            }
        }
        Ok(None)
    }
}

/// Which caption files a [`LocalFileStrategy`] looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranscriptKind {
    /// `<id>.<lang>.json` for each preferred language.
    Manual,
    /// `<id>.<lang>.auto.json` for each preferred language.
    Generated,
    /// Any `<id>.*.json` file, or a pre-formatted `<id>.txt`.
    Any,
}

/// Reads caption files from a local directory.
///
/// JSON files hold an array of `{"start": seconds, "text": "..."}` entries;
/// `.txt` files hold already formatted `[MM:SS] text` lines.
pub struct LocalFileStrategy {
    dir: PathBuf,
    kind: TranscriptKind,
    name: String,
}

impl LocalFileStrategy {
    pub fn new(dir: PathBuf, kind: TranscriptKind) -> Self {
        let name = match kind {
            TranscriptKind::Manual => "local-manual",
            TranscriptKind::Generated => "local-generated",
            TranscriptKind::Any => "local-any",
        }
        .to_string();
        Self { dir, kind, name }
    }

    fn read_json(path: &Path) -> Result<Vec<TranscriptEntry>> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    fn candidates(&self, video_id: &str, languages: &[String]) -> Result<Vec<PathBuf>> {
        match self.kind {
            TranscriptKind::Manual => Ok(languages
                .iter()
                .map(|lang| self.dir.join(format!("{}.{}.json", video_id, lang)))
                .collect()),
            TranscriptKind::Generated => Ok(languages
                .iter()
                .map(|lang| self.dir.join(format!("{}.{}.auto.json", video_id, lang)))
                .collect()),
            TranscriptKind::Any => {
                if !self.dir.is_dir() {
                    return Ok(Vec::new());
                }
                let prefix = format!("{}.", video_id);
                let mut paths: Vec<PathBuf> = std::fs::read_dir(&self.dir)?
                    .flatten()
                    .map(|entry| entry.path())
                    .filter(|path| {
                        path.file_name()
                            .and_then(|n| n.to_str())
                            .is_some_and(|n| n.starts_with(&prefix) && (n.ends_with(".json") || n.ends_with(".txt")))
                    })
                    .collect();
                // Directory order is platform dependent.
                paths.sort();
                Ok(paths)
            }
        }
    }
}

#[async_trait]
impl TranscriptStrategy for LocalFileStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self, video_id: &str, languages: &[String]) -> Result<Option<Vec<TranscriptEntry>>> {
        for path in self.candidates(video_id, languages)? {
            if !path.is_file() {
                continue;
            }
            let entries = if path.extension().is_some_and(|e| e == "txt") {
                parse_transcript_lines(&std::fs::read_to_string(&path)?)
            } else {
                Self::read_json(&path).map_err(|e| {
                    TubeChatError::TranscriptUnavailable(format!("{}: {}", path.display(), e))
                })?
            };
            if !entries.is_empty() {
                return Ok(Some(entries));
            }
        }
        Ok(None)
    }
}

/// Parse `[MM:SS] text` lines back into entries. Lines without a leading
/// marker are appended to the previous entry.
pub fn parse_transcript_lines(text: &str) -> Vec<TranscriptEntry> {
    let mut entries: Vec<TranscriptEntry> = Vec::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let parsed = line
            .strip_prefix('[')
            .and_then(|rest| rest.split_once(']'))
            .and_then(|(stamp, rest)| parse_timestamp(stamp).map(|secs| (secs, rest.trim())));

        match parsed {
            Some((secs, rest)) => entries.push(TranscriptEntry::new(secs as f64, rest)),
            None => match entries.last_mut() {
                Some(last) => {
                    last.text.push(' ');
                    last.text.push_str(line);
                }
                None => entries.push(TranscriptEntry::new(0.0, line)),
            },
        }
    }

    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Failing;

    #[async_trait]
    impl TranscriptStrategy for Failing {
        fn name(&self) -> &str {
            "failing"
        }

        async fn fetch(&self, _video_id: &str, _languages: &[String]) -> Result<Option<Vec<TranscriptEntry>>> {
            Err(TubeChatError::TranscriptUnavailable("blocked".to_string()))
        }
    }

    struct Fixed(Vec<TranscriptEntry>);

    #[async_trait]
    impl TranscriptStrategy for Fixed {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn fetch(&self, _video_id: &str, _languages: &[String]) -> Result<Option<Vec<TranscriptEntry>>> {
            Ok(Some(self.0.clone()))
        }
    }

    fn langs() -> Vec<String> {
        vec!["en".to_string(), "en-US".to_string()]
    }

    #[tokio::test]
    async fn test_first_success_wins() {
        let source = FallbackTranscriptSource::new(vec![
            Box::new(Failing),
            Box::new(Fixed(Vec::new())),
            Box::new(Fixed(vec![TranscriptEntry::new(10.0, "second strategy")])),
            Box::new(Fixed(vec![TranscriptEntry::new(0.0, "never reached")])),
        ]);

        let text = source.get_transcript("abcdefghijk", &langs()).await.unwrap();
        assert_eq!(text.as_deref(), Some("[00:10] second strategy"));
    }

    #[tokio::test]
    async fn test_all_strategies_exhausted() {
        let source = FallbackTranscriptSource::new(vec![Box::new(Failing)]);
        assert!(source.get_transcript("abcdefghijk", &langs()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_local_prefers_manual_then_generated() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("abcdefghijk.en-US.auto.json"),
            r#"[{"start": 1.0, "text": "auto caption"}]"#,
        )
        .unwrap();

        let source = FallbackTranscriptSource::local(dir.path());
        let text = source.get_transcript("abcdefghijk", &langs()).await.unwrap();
        assert_eq!(text.as_deref(), Some("[00:01] auto caption"));

        std::fs::write(
            dir.path().join("abcdefghijk.en-US.json"),
            r#"[{"start": 2.0, "text": "manual caption"}]"#,
        )
        .unwrap();
        let text = source.get_transcript("abcdefghijk", &langs()).await.unwrap();
        assert_eq!(text.as_deref(), Some("[00:02] manual caption"));
    }

    #[tokio::test]
    async fn test_local_any_reads_text_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("abcdefghijk.txt"),
            "[00:00] first line\ncontinued\n[01:05] second line\n",
        )
        .unwrap();

        let source = FallbackTranscriptSource::local(dir.path());
        let text = source.get_transcript("abcdefghijk", &langs()).await.unwrap();
        assert_eq!(
            text.as_deref(),
            Some("[00:00] first line continued\n[01:05] second line")
        );
    }
}
