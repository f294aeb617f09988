//! Prompt templates for tubechat.
//!
//! Prompts can be customized by placing TOML files in the custom prompts directory
//! (`rag.toml`, `evaluation.toml`, `study.toml`). Placeholders use `{{name}}`.

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::LazyLock;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{(\w+)\}\}").expect("valid placeholder regex"));

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Prompts {
    pub rag: RagPrompts,
    pub evaluation: EvaluationPrompts,
    pub study: StudyPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: HashMap<String, String>,
}

/// Prompt for grounded answer synthesis.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RagPrompts {
    pub answer: String,
}

impl Default for RagPrompts {
    fn default() -> Self {
        Self {
            answer: r#"You are an expert AI assistant analyzing YouTube video transcripts. Your task is to provide accurate, detailed answers based STRICTLY on the provided context.

CONTEXT (Video Transcript Segments):
{{context}}

USER QUESTION: {{question}}

ANALYSIS GUIDELINES:
1. Base your answer ONLY on the provided transcript context
2. Include specific timestamps when available (format: [MM:SS] or [HH:MM:SS])
3. For lyrics requests: Provide complete, consecutive text from transcript
4. For quote or content requests: Quote exact phrases verbatim and provide detailed explanations
5. If context is insufficient: Clearly state what specific information is missing
6. Maintain chronological order when referencing multiple segments
7. Preserve speaker context and conversation flow

RESPONSE FORMAT:
- Start with direct answer to the question
- Include relevant timestamps and quotes
- Provide additional context when helpful
- End with source references using the segment numbers, e.g. [1]

ANSWER:"#
                .to_string(),
        }
    }
}

/// Grading prompts for the model-scored evaluation axes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationPrompts {
    pub faithfulness: String,
    pub relevance: String,
}

impl Default for EvaluationPrompts {
    fn default() -> Self {
        Self {
            faithfulness: r#"Evaluate the faithfulness of the AI response to the provided context.

Context (Source Material):
{{context}}

AI Response:
{{answer}}

Rate the faithfulness on a scale of 0.0 to 1.0 where:
- 1.0 = Response is completely faithful to the context, no hallucinations
- 0.8 = Mostly faithful with minor interpretations
- 0.6 = Generally faithful but some unsupported claims
- 0.4 = Several unsupported claims or interpretations
- 0.2 = Many inaccuracies or unsupported claims
- 0.0 = Response contradicts or ignores the context

Respond with only a number between 0.0 and 1.0."#
                .to_string(),

            relevance: r#"Evaluate how well the AI response answers the user's question.

User Question:
{{question}}

AI Response:
{{answer}}

Rate the relevance on a scale of 0.0 to 1.0 where:
- 1.0 = Response directly and completely answers the question
- 0.8 = Response mostly answers the question with minor tangents
- 0.6 = Response partially answers the question
- 0.4 = Response somewhat relates but misses key aspects
- 0.2 = Response barely relates to the question
- 0.0 = Response is completely irrelevant

Respond with only a number between 0.0 and 1.0."#
                .to_string(),
        }
    }
}

/// Prompts for the structured study generators.
///
/// Every template receives `{{title}}`, `{{channel}}` and `{{transcript}}`;
/// highlights and flashcards additionally receive `{{count}}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StudyPrompts {
    pub summary: String,
    pub highlights: String,
    pub mood: String,
    pub study_guide: String,
    pub notes: String,
    pub flashcards: String,
    pub learning_path: String,
}

impl Default for StudyPrompts {
    fn default() -> Self {
        Self {
            summary: r#"Provide a comprehensive summary of this YouTube video based on its transcript.

Video Title: {{title}}
Channel: {{channel}}

Transcript:
{{transcript}}

Respond only with a JSON object of this shape:
{
  "overview": "3-5 sentence summary of the video",
  "main_topics": ["topic", "..."],
  "key_points": ["point", "..."],
  "conclusion": "the overall theme or conclusion"
}"#
            .to_string(),

            highlights: r#"Analyze this YouTube video transcript and extract {{count}} key highlights or important moments.

Video Title: {{title}}

Transcript:
{{transcript}}

Respond only with a JSON object of this shape:
{
  "highlights": [
    {"title": "brief title", "timestamp": "MM:SS if present in the transcript, else empty", "quote": "key quote", "significance": "why this moment is important"}
  ]
}"#
            .to_string(),

            mood: r#"Analyze the overall mood, tone, and emotional characteristics of this YouTube video based on its transcript.

Video Title: {{title}}
Channel: {{channel}}

Transcript:
{{transcript}}

Respond only with a JSON object of this shape:
{
  "overall_mood": "e.g. Educational, Entertaining, Serious, Humorous, Inspirational",
  "tone": "e.g. Casual, Professional, Energetic, Calm",
  "emotional_characteristics": ["emotion the content evokes", "..."],
  "audience_feel": "how viewers would likely feel watching this",
  "content_style": "e.g. Tutorial, Commentary, Review, Storytelling",
  "analysis": "detailed analysis with specific examples from the transcript"
}"#
            .to_string(),

            study_guide: r#"Create a comprehensive study guide for this YouTube video transcript. The video is titled "{{title}}" by {{channel}}.

Transcript:
{{transcript}}

Respond only with a JSON object of this shape:
{
  "overview": "2-3 sentence summary of the main topic",
  "learning_objectives": ["3-5 specific objectives"],
  "key_concepts": [{"term": "concept", "definition": "brief definition"}],
  "detailed_outline": [{"topic": "main topic", "subtopics": ["subtopic"]}],
  "discussion_questions": ["5-7 thought-provoking questions"],
  "practice_exercises": ["3-5 hands-on exercises"],
  "additional_resources": ["topics for further research"],
  "quiz_questions": [{"question": "...", "options": ["A", "B", "C", "D"], "answer": "correct option", "explanation": "why"}],
  "vocabulary": [{"term": "word", "definition": "meaning"}],
  "takeaways": ["3-5 key takeaways"]
}
Include 10 quiz questions."#
                .to_string(),

            notes: r#"Create quick study notes for this video: "{{title}}"

Transcript:
{{transcript}}

Respond only with a JSON object of this shape:
{
  "summary": "1-2 sentence summary",
  "key_points": ["5-7 main ideas"],
  "important_quotes": ["3-5 significant quotes"],
  "actionable_items": ["3-5 concrete next steps"],
  "time_stamps": [{"timestamp": "MM:SS", "description": "what happens there"}]
}"#
            .to_string(),

            flashcards: r#"Create {{count}} flashcards for studying this video: "{{title}}"

Mix factual recall, conceptual understanding, application scenarios and analysis questions.

Transcript:
{{transcript}}

Respond only with a JSON object of this shape:
{
  "flashcards": [
    {"question": "front of card", "answer": "back of card", "difficulty": "easy | medium | hard", "category": "topic category"}
  ]
}"#
            .to_string(),

            learning_path: r#"Create a learning path for mastering the concepts in this video: "{{title}}"

Transcript:
{{transcript}}

Respond only with a JSON object of this shape:
{
  "path_title": "learning path title",
  "estimated_time": "total estimated learning time",
  "difficulty_level": "beginner | intermediate | advanced",
  "prerequisites": ["prerequisite"],
  "learning_modules": [
    {"module_number": 1, "title": "module title", "description": "what students will learn", "estimated_time": "time estimate", "activities": ["activity"], "assessment": "how progress is measured"}
  ],
  "final_project": "capstone project or final assessment",
  "next_steps": ["suggestion for continued learning"]
}
Create 3-5 progressive learning modules."#
                .to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts from the default location, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let rag_path = custom_path.join("rag.toml");
            if rag_path.exists() {
                let content = std::fs::read_to_string(&rag_path)?;
                prompts.rag = toml::from_str(&content)?;
            }

            let evaluation_path = custom_path.join("evaluation.toml");
            if evaluation_path.exists() {
                let content = std::fs::read_to_string(&evaluation_path)?;
                prompts.evaluation = toml::from_str(&content)?;
            }

            let study_path = custom_path.join("study.toml");
            if study_path.exists() {
                let content = std::fs::read_to_string(&study_path)?;
                prompts.study = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    ///
    /// Placeholders are filled in a single pass over the template, so
    /// substituted text is never scanned for placeholders itself. Unknown
    /// placeholders are left as written.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        PLACEHOLDER
            .replace_all(template, |caps: &Captures| match vars.get(&caps[1]) {
                Some(value) => value.clone(),
                None => caps[0].to_string(),
            })
            .into_owned()
    }

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(&self, template: &str, vars: &HashMap<String, String>) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }
}
