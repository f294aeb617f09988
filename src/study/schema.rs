//! Typed shapes of the structured study artifacts.
//!
//! Model output is decoded once into these types. Every field defaults, so a
//! reply that omits a section still decodes; anything that cannot be decoded
//! at all becomes a [`Generated::Failed`] carrying a placeholder of the
//! same shape.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Result of one generator call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Generated<T> {
    Ok(T),
    /// Generation or decoding failed; `content` is a placeholder with every
    /// field present.
    Failed { error: String, content: T },
}

impl<T> Generated<T> {
    pub fn content(&self) -> &T {
        match self {
            Generated::Ok(content) | Generated::Failed { content, .. } => content,
        }
    }

    pub fn into_content(self) -> T {
        match self {
            Generated::Ok(content) | Generated::Failed { content, .. } => content,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Generated::Ok(_) => None,
            Generated::Failed { error, .. } => Some(error),
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Generated::Ok(_))
    }
}

/// A study artifact produced by a single structured-output call.
pub trait StudyArtifact: Serialize + for<'de> Deserialize<'de> + Send {
    /// Human name used in error messages ("study guide", "flashcards").
    const KIND: &'static str;

    /// Placeholder returned alongside `error` when generation fails.
    fn placeholder(error: &str) -> Self;

    /// Human-readable rendering; pretty JSON unless overridden.
    fn render(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}

/// A term with its definition. Accepts `{"term", "definition"}` objects or
/// plain `"term: definition"` strings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "TermRepr")]
pub struct Term {
    pub term: String,
    pub definition: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TermRepr {
    Object {
        #[serde(default, alias = "concept", alias = "word")]
        term: String,
        #[serde(default, alias = "meaning", alias = "description")]
        definition: String,
    },
    Text(String),
}

impl From<TermRepr> for Term {
    fn from(repr: TermRepr) -> Self {
        match repr {
            TermRepr::Object { term, definition } => Term { term, definition },
            TermRepr::Text(text) => match text.split_once(':') {
                Some((term, definition)) => Term {
                    term: term.trim().to_string(),
                    definition: definition.trim().to_string(),
                },
                None => Term {
                    term: text,
                    definition: String::new(),
                },
            },
        }
    }
}

/// Accept a number or a numeric string.
fn lenient_u32<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Number(u32),
        Text(String),
    }

    Ok(match Repr::deserialize(deserializer)? {
        Repr::Number(n) => n,
        Repr::Text(s) => s.trim().parse().unwrap_or(0),
    })
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Summary {
    pub overview: String,
    pub main_topics: Vec<String>,
    pub key_points: Vec<String>,
    pub conclusion: String,
}

impl StudyArtifact for Summary {
    const KIND: &'static str = "summary";

    fn placeholder(_error: &str) -> Self {
        Self {
            overview: "Summary generation temporarily unavailable".to_string(),
            ..Self::default()
        }
    }

    fn render(&self) -> String {
        let mut out = format!("{}\n", self.overview);
        push_list(&mut out, "Main topics", &self.main_topics);
        push_list(&mut out, "Key points", &self.key_points);
        if !self.conclusion.is_empty() {
            out.push_str(&format!("\nConclusion: {}\n", self.conclusion));
        }
        out
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Highlight {
    pub title: String,
    pub timestamp: String,
    pub quote: String,
    pub significance: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Highlights {
    pub highlights: Vec<Highlight>,
}

impl StudyArtifact for Highlights {
    const KIND: &'static str = "highlights";

    fn placeholder(_error: &str) -> Self {
        Self::default()
    }

    fn render(&self) -> String {
        let mut out = String::new();
        for (i, h) in self.highlights.iter().enumerate() {
            let at = if h.timestamp.is_empty() {
                String::new()
            } else {
                format!(" [{}]", h.timestamp)
            };
            out.push_str(&format!("{}. {}{}\n", i + 1, h.title, at));
            if !h.quote.is_empty() {
                out.push_str(&format!("   \"{}\"\n", h.quote));
            }
            if !h.significance.is_empty() {
                out.push_str(&format!("   {}\n", h.significance));
            }
        }
        out
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MoodAnalysis {
    pub overall_mood: String,
    pub tone: String,
    pub emotional_characteristics: Vec<String>,
    pub audience_feel: String,
    pub content_style: String,
    pub analysis: String,
}

impl StudyArtifact for MoodAnalysis {
    const KIND: &'static str = "mood analysis";

    fn placeholder(_error: &str) -> Self {
        Self {
            overall_mood: "Unknown".to_string(),
            tone: "Unknown".to_string(),
            analysis: "Mood analysis temporarily unavailable".to_string(),
            ..Self::default()
        }
    }

    fn render(&self) -> String {
        let mut out = format!(
            "Mood: {}\nTone: {}\nStyle: {}\nAudience: {}\n",
            self.overall_mood, self.tone, self.content_style, self.audience_feel
        );
        push_list(&mut out, "Emotional characteristics", &self.emotional_characteristics);
        if !self.analysis.is_empty() {
            out.push_str(&format!("\n{}\n", self.analysis));
        }
        out
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutlineSection {
    pub topic: String,
    pub subtopics: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuizQuestion {
    pub question: String,
    pub options: Vec<String>,
    pub answer: String,
    pub explanation: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StudyGuide {
    pub overview: String,
    pub learning_objectives: Vec<String>,
    pub key_concepts: Vec<Term>,
    pub detailed_outline: Vec<OutlineSection>,
    pub discussion_questions: Vec<String>,
    pub practice_exercises: Vec<String>,
    pub additional_resources: Vec<String>,
    pub quiz_questions: Vec<QuizQuestion>,
    pub vocabulary: Vec<Term>,
    pub takeaways: Vec<String>,
}

impl StudyArtifact for StudyGuide {
    const KIND: &'static str = "study guide";

    fn placeholder(_error: &str) -> Self {
        Self {
            overview: "Study guide generation temporarily unavailable".to_string(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimestampNote {
    pub timestamp: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StudyNotes {
    pub summary: String,
    pub key_points: Vec<String>,
    pub important_quotes: Vec<String>,
    pub actionable_items: Vec<String>,
    pub time_stamps: Vec<TimestampNote>,
}

impl StudyArtifact for StudyNotes {
    const KIND: &'static str = "study notes";

    fn placeholder(_error: &str) -> Self {
        Self {
            summary: "Study notes generation temporarily unavailable".to_string(),
            ..Self::default()
        }
    }

    fn render(&self) -> String {
        let mut out = format!("{}\n", self.summary);
        push_list(&mut out, "Key points", &self.key_points);
        push_list(&mut out, "Quotes", &self.important_quotes);
        push_list(&mut out, "Action items", &self.actionable_items);
        if !self.time_stamps.is_empty() {
            out.push_str("\nTimestamps:\n");
            for t in &self.time_stamps {
                out.push_str(&format!("  [{}] {}\n", t.timestamp, t.description));
            }
        }
        out
    }
}

/// Flashcard difficulty. Unrecognized values read as medium.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl From<String> for Difficulty {
    fn from(value: String) -> Self {
        match value.trim().to_lowercase().as_str() {
            "easy" => Difficulty::Easy,
            "hard" => Difficulty::Hard,
            _ => Difficulty::Medium,
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Difficulty::Easy => write!(f, "easy"),
            Difficulty::Medium => write!(f, "medium"),
            Difficulty::Hard => write!(f, "hard"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Flashcard {
    pub question: String,
    pub answer: String,
    pub difficulty: Difficulty,
    pub category: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlashcardDeck {
    pub flashcards: Vec<Flashcard>,
}

impl StudyArtifact for FlashcardDeck {
    const KIND: &'static str = "flashcards";

    fn placeholder(error: &str) -> Self {
        Self {
            flashcards: vec![Flashcard {
                question: "Flashcard generation error".to_string(),
                answer: error.to_string(),
                difficulty: Difficulty::Easy,
                category: "Error".to_string(),
            }],
        }
    }

    fn render(&self) -> String {
        let mut out = String::new();
        for (i, card) in self.flashcards.iter().enumerate() {
            out.push_str(&format!(
                "{}. [{} / {}] {}\n   {}\n",
                i + 1,
                card.category,
                card.difficulty,
                card.question,
                card.answer
            ));
        }
        out
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LearningModule {
    #[serde(deserialize_with = "lenient_u32")]
    pub module_number: u32,
    pub title: String,
    pub description: String,
    pub estimated_time: String,
    pub activities: Vec<String>,
    pub assessment: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LearningPath {
    pub path_title: String,
    pub estimated_time: String,
    pub difficulty_level: String,
    pub prerequisites: Vec<String>,
    pub learning_modules: Vec<LearningModule>,
    pub final_project: String,
    pub next_steps: Vec<String>,
}

impl StudyArtifact for LearningPath {
    const KIND: &'static str = "learning path";

    fn placeholder(_error: &str) -> Self {
        Self {
            path_title: "Learning path generation unavailable".to_string(),
            estimated_time: "Unknown".to_string(),
            difficulty_level: "unknown".to_string(),
            final_project: "Unavailable".to_string(),
            ..Self::default()
        }
    }
}

fn push_list(out: &mut String, heading: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    out.push_str(&format!("\n{}:\n", heading));
    for item in items {
        out.push_str(&format!("  • {}\n", item));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terms_accept_strings_and_objects() {
        let guide: StudyGuide = serde_json::from_str(
            r#"{"key_concepts": [{"term": "Borrow", "definition": "a reference"}, "Move: ownership transfer", "Lifetime"]}"#,
        )
        .unwrap();
        assert_eq!(guide.key_concepts[0].term, "Borrow");
        assert_eq!(guide.key_concepts[1].definition, "ownership transfer");
        assert_eq!(guide.key_concepts[2].term, "Lifetime");
        assert!(guide.takeaways.is_empty());
    }

    #[test]
    fn test_difficulty_is_lenient() {
        let deck: FlashcardDeck = serde_json::from_str(
            r#"{"flashcards": [{"question": "q", "answer": "a", "difficulty": "HARD"}, {"question": "q2", "difficulty": "tricky"}]}"#,
        )
        .unwrap();
        assert_eq!(deck.flashcards[0].difficulty, Difficulty::Hard);
        assert_eq!(deck.flashcards[1].difficulty, Difficulty::Medium);
        assert_eq!(deck.flashcards[1].category, "");
    }

    #[test]
    fn test_module_number_from_string() {
        let path: LearningPath =
            serde_json::from_str(r#"{"learning_modules": [{"module_number": "2", "title": "Basics"}]}"#).unwrap();
        assert_eq!(path.learning_modules[0].module_number, 2);
    }

    #[test]
    fn test_failed_flashcards_shape() {
        let generated: Generated<FlashcardDeck> = Generated::Failed {
            error: "Failed to generate flashcards: boom".to_string(),
            content: FlashcardDeck::placeholder("Failed to generate flashcards: boom"),
        };
        let value = serde_json::to_value(&generated).unwrap();
        assert_eq!(value["status"], "failed");
        assert_eq!(value["content"]["flashcards"][0]["category"], "Error");
        assert_eq!(value["content"]["flashcards"][0]["difficulty"], "easy");
        assert_eq!(generated.error(), Some("Failed to generate flashcards: boom"));
    }

    #[test]
    fn test_ok_status_tag() {
        let generated = Generated::Ok(Summary {
            overview: "o".to_string(),
            ..Summary::default()
        });
        let value = serde_json::to_value(&generated).unwrap();
        assert_eq!(value["status"], "ok");
        assert_eq!(value["overview"], "o");
        assert!(generated.is_ok());
    }
}
