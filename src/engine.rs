//! The chat engine: loads a video, keeps its embeddings current, answers
//! questions about it and generates study materials.
//!
//! One video is active at a time. Its [`Session`] holds the metadata and
//! chat history and is replaced wholesale when another video loads.

use crate::chunking::{Chunk, Chunker, RecursiveChunker};
use crate::config::{Prompts, Settings};
use crate::embedding::{create_embedder, embed_isolated, Embedder};
use crate::error::{Result, TubeChatError};
use crate::index::IndexCache;
use crate::llm::{LanguageModel, OpenAILanguageModel};
use crate::rag::{
    format_context, AnswerSynthesizer, Citation, EvaluationScore, ResponseEvaluator,
    RetrievalOutcome, Retriever, Synthesis,
};
use crate::session::Session;
use crate::store::{EmbeddingRecord, EmbeddingStore, SqliteStore, Store, VideoListing};
use crate::study::{
    FlashcardDeck, Generated, Highlights, LearningPath, MoodAnalysis, StudyArtifact,
    StudyGenerator, StudyGuide, StudyNotes, Summary,
};
use crate::transcript::{
    extract_video_id, FallbackTranscriptSource, OEmbedClient, TranscriptRecord, TranscriptSource,
    VideoInfo, VideoInfoSource,
};
use std::fmt;
use std::sync::Arc;
use tracing::{info, instrument, warn};

pub const NOT_LOADED_MESSAGE: &str = "Please load a video first before asking questions.";
pub const NOT_LOADED_STUDY_MESSAGE: &str = "Please load a video first.";
pub const NO_EMBEDDINGS_MESSAGE: &str = "No embeddings found for this video. Please generate study materials first to enable chat functionality.";
pub const NO_RELEVANT_CONTENT_MESSAGE: &str = "No relevant content found for your question. Try rephrasing or asking about different aspects of the video.";

pub const DEFAULT_HIGHLIGHTS: usize = 5;
pub const DEFAULT_FLASHCARDS: usize = 10;

/// Where a loaded transcript came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranscriptOrigin {
    /// Passed in by the caller.
    Provided,
    /// Already in the transcript store.
    Stored,
    /// Fetched from the transcript source.
    Fetched,
}

/// Result of [`ChatEngine::load_video`].
#[derive(Debug, Clone)]
pub struct LoadedVideo {
    pub info: VideoInfo,
    pub origin: TranscriptOrigin,
    pub transcript_chars: usize,
    /// Stored embeddings were dropped because the transcript changed.
    pub embeddings_invalidated: bool,
}

/// Result of [`ChatEngine::ensure_embeddings`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingStatus {
    /// Stored embeddings meet the chunk-count threshold; nothing was done.
    AlreadySufficient { count: usize },
    /// Embeddings were rebuilt from the transcript.
    Regenerated { embedded: usize, failed: usize },
}

/// What kind of reply [`ChatEngine::ask`] produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerKind {
    Answered,
    NotLoaded,
    NoEmbeddings,
    NoRelevantContent,
    /// Retrieval or generation failed; the text carries the error.
    Failed,
}

/// A reply to one question.
#[derive(Debug, Clone)]
pub struct ChatAnswer {
    pub kind: AnswerKind,
    pub text: String,
    pub citations: Vec<Citation>,
    pub evaluation: Option<EvaluationScore>,
}

impl ChatAnswer {
    fn notice(kind: AnswerKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
            citations: Vec::new(),
            evaluation: None,
        }
    }

    pub fn is_answered(&self) -> bool {
        self.kind == AnswerKind::Answered
    }
}

impl fmt::Display for ChatAnswer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)?;
        if !self.citations.is_empty() {
            write!(f, "\n\n**Sources:**")?;
            for citation in &self.citations {
                write!(f, "\n{}", citation)?;
            }
        }
        if let Some(score) = &self.evaluation {
            write!(f, "\n\n---\n{}", score)?;
        }
        Ok(())
    }
}

/// UI-facing entry point tying the pipeline together.
pub struct ChatEngine {
    settings: Settings,
    store: Arc<dyn Store>,
    embedder: Arc<dyn Embedder>,
    chunker: RecursiveChunker,
    cache: Arc<IndexCache>,
    retriever: Retriever,
    synthesizer: AnswerSynthesizer,
    evaluator: ResponseEvaluator,
    study: StudyGenerator,
    transcripts: Option<Arc<dyn TranscriptSource>>,
    video_info: Option<Arc<dyn VideoInfoSource>>,
    session: Option<Session>,
}

impl ChatEngine {
    /// Create an engine backed by SQLite, OpenAI, local transcript files and
    /// oEmbed metadata.
    pub fn new(settings: Settings) -> Result<Self> {
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;
        let store = Arc::new(SqliteStore::new(&settings.sqlite_path())?);
        let embedder = create_embedder(&settings.embedding)?;
        let llm: Arc<dyn LanguageModel> = Arc::new(OpenAILanguageModel::new()?);
        let transcripts = Arc::new(FallbackTranscriptSource::local(settings.transcripts_dir()));
        let video_info = Arc::new(OEmbedClient::new()?);

        Ok(Self::with_components(settings, prompts, store, embedder, llm)
            .with_transcript_source(transcripts)
            .with_video_info_source(video_info))
    }

    /// Create an engine from explicit components. No transcript or video-info
    /// source is attached.
    pub fn with_components<S: Store + 'static>(
        settings: Settings,
        prompts: Prompts,
        store: Arc<S>,
        embedder: Arc<dyn Embedder>,
        llm: Arc<dyn LanguageModel>,
    ) -> Self {
        let prompts = Arc::new(prompts);
        let cache = Arc::new(IndexCache::new());
        let embedding_store: Arc<dyn EmbeddingStore> = store.clone();

        let retriever = Retriever::new(embedding_store, embedder.clone(), cache.clone(), &settings.retrieval);
        let synthesizer = AnswerSynthesizer::new(llm.clone(), prompts.clone(), &settings.llm);
        let evaluator = ResponseEvaluator::new(llm.clone(), prompts.clone(), settings.evaluation.clone());
        let study = StudyGenerator::new(llm, prompts, settings.study.clone());

        Self {
            chunker: RecursiveChunker::from_settings(&settings.chunking),
            settings,
            store,
            embedder,
            cache,
            retriever,
            synthesizer,
            evaluator,
            study,
            transcripts: None,
            video_info: None,
            session: None,
        }
    }

    pub fn with_transcript_source(mut self, source: Arc<dyn TranscriptSource>) -> Self {
        self.transcripts = Some(source);
        self
    }

    pub fn with_video_info_source(mut self, source: Arc<dyn VideoInfoSource>) -> Self {
        self.video_info = Some(source);
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn is_loaded(&self) -> bool {
        self.session.is_some()
    }

    pub fn clear_history(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.clear_history();
        }
    }

    /// Make `input` (an ID or YouTube URL) the active video.
    ///
    /// The transcript is taken from `transcript`, else the store, else the
    /// transcript source. Metadata is taken from `info`, else the stored
    /// record, else the video-info source. Embeddings are not built here;
    /// see [`ChatEngine::ensure_embeddings`].
    #[instrument(skip(self, transcript, info))]
    pub async fn load_video(
        &mut self,
        input: &str,
        transcript: Option<&str>,
        info: Option<VideoInfo>,
    ) -> Result<LoadedVideo> {
        let video_id =
            extract_video_id(input).ok_or_else(|| TubeChatError::InvalidVideoId(input.to_string()))?;

        let stored = self.store.get_transcript(&video_id).await?;

        let (raw_text, origin) = match (transcript, &stored) {
            (Some(text), _) => (text.to_string(), TranscriptOrigin::Provided),
            (None, Some(record)) => (record.raw_text.clone(), TranscriptOrigin::Stored),
            (None, None) => (self.fetch_transcript(&video_id).await?, TranscriptOrigin::Fetched),
        };

        let info = match (info, &stored) {
            (Some(info), _) => VideoInfo { video_id: video_id.clone(), ..info },
            (None, Some(record)) => record.info(),
            (None, None) => match &self.video_info {
                Some(source) => source.get_video_info(&video_id).await,
                None => VideoInfo::fallback(&video_id),
            },
        };

        let changed = stored.as_ref().is_some_and(|record| record.raw_text != raw_text);
        let needs_save = origin != TranscriptOrigin::Stored
            || stored.as_ref().is_some_and(|record| record.info() != info);
        if needs_save {
            self.store.save_transcript(&TranscriptRecord::new(raw_text.as_str(), &info)).await?;
        }

        if changed {
            let dropped = self.store.delete_embeddings(&video_id).await?;
            self.cache.invalidate(&video_id)?;
            info!("Transcript for {} changed, dropped {} embeddings", video_id, dropped);
        }

        info!("Loaded video {} ({:?}, {} chars)", video_id, origin, raw_text.chars().count());
        self.session = Some(Session::new(info.clone()));

        Ok(LoadedVideo {
            info,
            origin,
            transcript_chars: raw_text.chars().count(),
            embeddings_invalidated: changed,
        })
    }

    async fn fetch_transcript(&self, video_id: &str) -> Result<String> {
        let source = self.transcripts.as_ref().ok_or_else(|| {
            TubeChatError::TranscriptUnavailable(format!("no transcript source for {}", video_id))
        })?;

        source
            .get_transcript(video_id, &self.settings.transcripts.languages)
            .await?
            .ok_or_else(|| {
                TubeChatError::TranscriptUnavailable(format!("no transcript found for {}", video_id))
            })
    }

    async fn stored_transcript(&self, video_id: &str) -> Result<TranscriptRecord> {
        self.store
            .get_transcript(video_id)
            .await?
            .ok_or_else(|| TubeChatError::TranscriptUnavailable(format!("{} is not stored", video_id)))
    }

    /// Build embeddings for `video_id` unless enough are already stored.
    ///
    /// "Enough" means at least `retrieval.min_embedding_chunks`, or the number
    /// of chunks the transcript produces if that is smaller. A transcript
    /// with no chunks needs no embeddings.
    #[instrument(skip(self))]
    pub async fn ensure_embeddings(&self, video_id: &str) -> Result<EmbeddingStatus> {
        let record = self.stored_transcript(video_id).await?;
        let chunks = self.chunker.chunk(video_id, &record.raw_text);

        let count = self.store.embedding_count(video_id).await?;
        if chunks.is_empty() {
            info!("{} has no transcript text to embed", video_id);
            return Ok(EmbeddingStatus::AlreadySufficient { count });
        }

        let threshold = self.settings.retrieval.min_embedding_chunks.min(chunks.len());
        if count > 0 && count >= threshold {
            info!("{} has {} embeddings (threshold {}), keeping them", video_id, count, threshold);
            return Ok(EmbeddingStatus::AlreadySufficient { count });
        }

        info!("{} has {} embeddings (threshold {}), regenerating", video_id, count, threshold);
        self.store_embeddings(video_id, &chunks).await
    }

    /// Re-chunk and re-embed `video_id`, replacing every stored embedding.
    ///
    /// Fails without touching the stored set when no chunk could be embedded.
    #[instrument(skip(self))]
    pub async fn regenerate_embeddings(&self, video_id: &str) -> Result<EmbeddingStatus> {
        let record = self.stored_transcript(video_id).await?;
        let chunks = self.chunker.chunk(video_id, &record.raw_text);
        self.store_embeddings(video_id, &chunks).await
    }

    async fn store_embeddings(&self, video_id: &str, chunks: &[Chunk]) -> Result<EmbeddingStatus> {
        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let outcome = embed_isolated(
            self.embedder.as_ref(),
            &texts,
            self.settings.embedding.batch_size,
        )
        .await;

        if !outcome.failed.is_empty() {
            warn!(
                "{} of {} chunks could not be embedded: {:?}",
                outcome.failed.len(),
                chunks.len(),
                outcome.failed
            );
        }

        if outcome.embedded.is_empty() && !chunks.is_empty() {
            return Err(TubeChatError::Embedding(format!(
                "none of the {} chunks of {} could be embedded, keeping stored embeddings",
                chunks.len(),
                video_id
            )));
        }

        let records: Vec<EmbeddingRecord> = outcome
            .embedded
            .into_iter()
            .map(|(i, vector)| EmbeddingRecord {
                video_id: video_id.to_string(),
                chunk_index: chunks[i].chunk_index,
                chunk_text: chunks[i].text.clone(),
                vector,
            })
            .collect();

        let embedded = self.store.replace_embeddings(video_id, &records).await?;
        self.cache.invalidate(video_id)?;

        Ok(EmbeddingStatus::Regenerated {
            embedded,
            failed: outcome.failed.len(),
        })
    }

    /// Answer `question` about the active video.
    ///
    /// Never fails: missing video, missing embeddings and downstream errors
    /// all come back as a [`ChatAnswer`] with the matching [`AnswerKind`].
    #[instrument(skip(self))]
    pub async fn ask(&mut self, question: &str) -> ChatAnswer {
        let Some(video_id) = self.session.as_ref().map(|s| s.video_id().to_string()) else {
            return ChatAnswer::notice(AnswerKind::NotLoaded, NOT_LOADED_MESSAGE);
        };

        let answer = self.answer(&video_id, question).await;
        if let Some(session) = self.session.as_mut() {
            session.record_exchange(question, answer.text.as_str());
        }
        answer
    }

    async fn answer(&self, video_id: &str, question: &str) -> ChatAnswer {
        let retrieval = match self.retriever.retrieve(video_id, question).await {
            Ok(RetrievalOutcome::Found(retrieval)) => retrieval,
            Ok(RetrievalOutcome::NoEmbeddings) => {
                return ChatAnswer::notice(AnswerKind::NoEmbeddings, NO_EMBEDDINGS_MESSAGE)
            }
            Ok(RetrievalOutcome::NoRelevantContent) => {
                return ChatAnswer::notice(AnswerKind::NoRelevantContent, NO_RELEVANT_CONTENT_MESSAGE)
            }
            Err(e) => {
                warn!("Retrieval failed: {}", e);
                return ChatAnswer::notice(
                    AnswerKind::Failed,
                    format!("I encountered an error processing your question: {}", e),
                );
            }
        };

        let text = match self.synthesizer.answer(question, &retrieval.chunks).await {
            Synthesis::Answer(text) => text,
            Synthesis::Failed(text) => return ChatAnswer::notice(AnswerKind::Failed, text),
        };

        let evaluation = if self.settings.evaluation.enabled {
            let context = format_context(&retrieval.chunks);
            Some(self.evaluator.evaluate(question, &text, &context).await)
        } else {
            None
        };

        ChatAnswer {
            kind: AnswerKind::Answered,
            text,
            citations: retrieval.citations,
            evaluation,
        }
    }

    /// Stored videos, newest first.
    pub async fn list_available_videos(&self) -> Result<Vec<VideoListing>> {
        self.store.list_transcripts().await
    }

    async fn active_record<T: StudyArtifact>(&self) -> std::result::Result<TranscriptRecord, Generated<T>> {
        let Some(session) = &self.session else {
            return Err(unavailable(NOT_LOADED_STUDY_MESSAGE.to_string()));
        };
        self.stored_transcript(session.video_id())
            .await
            .map_err(|e| unavailable(format!("Failed to generate {}: {}", T::KIND, e)))
    }

    pub async fn get_summary(&self) -> Generated<Summary> {
        match self.active_record().await {
            Ok(record) => self.study.summary(&record).await,
            Err(failed) => failed,
        }
    }

    pub async fn get_highlights(&self, count: usize) -> Generated<Highlights> {
        match self.active_record().await {
            Ok(record) => self.study.highlights(&record, count).await,
            Err(failed) => failed,
        }
    }

    pub async fn get_mood_analysis(&self) -> Generated<MoodAnalysis> {
        match self.active_record().await {
            Ok(record) => self.study.mood(&record).await,
            Err(failed) => failed,
        }
    }

    pub async fn generate_study_guide(&self) -> Generated<StudyGuide> {
        match self.active_record().await {
            Ok(record) => self.study.study_guide(&record).await,
            Err(failed) => failed,
        }
    }

    pub async fn generate_notes(&self) -> Generated<StudyNotes> {
        match self.active_record().await {
            Ok(record) => self.study.notes(&record).await,
            Err(failed) => failed,
        }
    }

    pub async fn generate_flashcards(&self, count: usize) -> Generated<FlashcardDeck> {
        match self.active_record().await {
            Ok(record) => self.study.flashcards(&record, count).await,
            Err(failed) => failed,
        }
    }

    pub async fn generate_learning_path(&self) -> Generated<LearningPath> {
        match self.active_record().await {
            Ok(record) => self.study.learning_path(&record).await,
            Err(failed) => failed,
        }
    }
}

fn unavailable<T: StudyArtifact>(error: String) -> Generated<T> {
    Generated::Failed {
        content: T::placeholder(&error),
        error,
    }
}
