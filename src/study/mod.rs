//! Structured study materials generated from a whole transcript.
//!
//! Each generator renders one prompt over a truncated transcript, asks the
//! model for a JSON object and decodes it into the matching schema type.
//! Failures never propagate: they come back as [`Generated::Failed`] with a
//! placeholder of the expected shape.

mod schema;

pub use schema::{
    Difficulty, Flashcard, FlashcardDeck, Generated, Highlight, Highlights, LearningModule,
    LearningPath, MoodAnalysis, OutlineSection, QuizQuestion, StudyArtifact, StudyGuide,
    StudyNotes, Summary, Term, TimestampNote,
};

use crate::config::{Prompts, StudySettings};
use crate::error::{Result, TubeChatError};
use crate::llm::{CompletionOptions, LanguageModel};
use crate::transcript::TranscriptRecord;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// First `max_chars` characters of `text`.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte, _)) => &text[..byte],
        None => text,
    }
}

/// The outermost `{...}` span in a model reply, tolerating code fences or
/// prose around it.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// Which generator to run, with its prompt and sampling.
struct Job<'a> {
    template: &'a str,
    max_chars: usize,
    temperature: f32,
    count: Option<usize>,
}

/// Generates study materials for a loaded transcript.
pub struct StudyGenerator {
    llm: Arc<dyn LanguageModel>,
    prompts: Arc<Prompts>,
    settings: StudySettings,
}

impl StudyGenerator {
    pub fn new(llm: Arc<dyn LanguageModel>, prompts: Arc<Prompts>, settings: StudySettings) -> Self {
        Self {
            llm,
            prompts,
            settings,
        }
    }

    pub async fn summary(&self, record: &TranscriptRecord) -> Generated<Summary> {
        self.run(
            record,
            Job {
                template: &self.prompts.study.summary,
                max_chars: self.settings.summary_chars,
                temperature: 0.2,
                count: None,
            },
        )
        .await
    }

    pub async fn highlights(&self, record: &TranscriptRecord, count: usize) -> Generated<Highlights> {
        let mut generated: Generated<Highlights> = self
            .run(
                record,
                Job {
                    template: &self.prompts.study.highlights,
                    max_chars: self.settings.highlights_chars,
                    temperature: 0.2,
                    count: Some(count),
                },
            )
            .await;
        if let Generated::Ok(h) = &mut generated {
            h.highlights.truncate(count);
        }
        generated
    }

    pub async fn mood(&self, record: &TranscriptRecord) -> Generated<MoodAnalysis> {
        self.run(
            record,
            Job {
                template: &self.prompts.study.mood,
                max_chars: self.settings.mood_chars,
                temperature: 0.2,
                count: None,
            },
        )
        .await
    }

    pub async fn study_guide(&self, record: &TranscriptRecord) -> Generated<StudyGuide> {
        self.run(
            record,
            Job {
                template: &self.prompts.study.study_guide,
                max_chars: self.settings.study_guide_chars,
                temperature: 0.7,
                count: None,
            },
        )
        .await
    }

    pub async fn notes(&self, record: &TranscriptRecord) -> Generated<StudyNotes> {
        self.run(
            record,
            Job {
                template: &self.prompts.study.notes,
                max_chars: self.settings.notes_chars,
                temperature: 0.5,
                count: None,
            },
        )
        .await
    }

    pub async fn flashcards(&self, record: &TranscriptRecord, count: usize) -> Generated<FlashcardDeck> {
        let mut generated: Generated<FlashcardDeck> = self
            .run(
                record,
                Job {
                    template: &self.prompts.study.flashcards,
                    max_chars: self.settings.flashcards_chars,
                    temperature: 0.6,
                    count: Some(count),
                },
            )
            .await;
        if let Generated::Ok(deck) = &mut generated {
            deck.flashcards.truncate(count);
        }
        generated
    }

    pub async fn learning_path(&self, record: &TranscriptRecord) -> Generated<LearningPath> {
        self.run(
            record,
            Job {
                template: &self.prompts.study.learning_path,
                max_chars: self.settings.learning_path_chars,
                temperature: 0.7,
                count: None,
            },
        )
        .await
    }

    fn render(&self, record: &TranscriptRecord, job: &Job<'_>) -> String {
        let mut vars = HashMap::new();
        vars.insert("title".to_string(), record.title.clone());
        vars.insert("channel".to_string(), record.channel.clone());
        vars.insert(
            "transcript".to_string(),
            truncate_chars(&record.raw_text, job.max_chars).to_string(),
        );
        if let Some(count) = job.count {
            vars.insert("count".to_string(), count.to_string());
        }
        self.prompts.render_with_custom(job.template, &vars)
    }

    #[instrument(skip_all, fields(kind = T::KIND, video_id = %record.video_id))]
    async fn run<T: StudyArtifact>(&self, record: &TranscriptRecord, job: Job<'_>) -> Generated<T> {
        match self.try_run(record, &job).await {
            Ok(content) => Generated::Ok(content),
            Err(e) => {
                warn!("Failed to generate {}: {}", T::KIND, e);
                let error = format!("Failed to generate {}: {}", T::KIND, e);
                Generated::Failed {
                    content: T::placeholder(&error),
                    error,
                }
            }
        }
    }

    async fn try_run<T: StudyArtifact>(&self, record: &TranscriptRecord, job: &Job<'_>) -> Result<T> {
        let prompt = self.render(record, job);
        let options = CompletionOptions::new(&self.settings.model, job.temperature);
        let reply = self.llm.complete_json(&prompt, &options).await?;
        debug!("{} reply is {} characters", T::KIND, reply.len());

        let json = extract_json_object(&reply)
            .ok_or_else(|| TubeChatError::Parse("no JSON object in reply".to_string()))?;
        serde_json::from_str(json).map_err(|e| TubeChatError::Parse(e.to_string()))
    }
}
