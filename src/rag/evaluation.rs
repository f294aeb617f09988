//! Best-effort quality scoring of generated answers.
//!
//! Faithfulness and relevance are graded by a small model; completeness and
//! clarity are computed locally. Nothing here returns an error: a failed
//! grading call falls back to a configured default score.

use crate::config::{EvaluationSettings, Prompts};
use crate::llm::{CompletionOptions, LanguageModel};
use crate::study::truncate_chars;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, LazyLock};
use tracing::{debug, warn};

static FIRST_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+\.?\d*)").expect("valid number regex"));

const FAITHFULNESS_WEIGHT: f32 = 0.4;
const RELEVANCE_WEIGHT: f32 = 0.3;
const COMPLETENESS_WEIGHT: f32 = 0.2;
const CLARITY_WEIGHT: f32 = 0.1;

/// Scores in `[0, 1]` for one (question, answer, context) triple.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvaluationScore {
    pub faithfulness: f32,
    pub relevance: f32,
    pub completeness: f32,
    pub clarity: f32,
    pub overall_quality: f32,
}

impl EvaluationScore {
    /// Combine the four axes; `overall_quality` is their fixed weighted sum.
    pub fn new(faithfulness: f32, relevance: f32, completeness: f32, clarity: f32) -> Self {
        let overall_quality = faithfulness * FAITHFULNESS_WEIGHT
            + relevance * RELEVANCE_WEIGHT
            + completeness * COMPLETENESS_WEIGHT
            + clarity * CLARITY_WEIGHT;
        Self {
            faithfulness,
            relevance,
            completeness,
            clarity,
            overall_quality,
        }
    }
}

/// Verbal grade for a score.
pub fn grade(score: f32) -> &'static str {
    match score {
        s if s >= 0.9 => "Excellent",
        s if s >= 0.8 => "Very Good",
        s if s >= 0.7 => "Good",
        s if s >= 0.6 => "Fair",
        s if s >= 0.5 => "Needs Improvement",
        _ => "Poor",
    }
}

impl fmt::Display for EvaluationScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "**Response Quality Evaluation:**")?;
        for (name, score) in [
            ("Faithfulness", self.faithfulness),
            ("Relevance", self.relevance),
            ("Completeness", self.completeness),
            ("Clarity", self.clarity),
        ] {
            let shown = one_decimal(score);
            writeln!(f, "• **{}**: {:.1}/1.0 ({})", name, shown, grade(shown))?;
        }
        writeln!(f)?;
        let overall = one_decimal(self.overall_quality);
        write!(f, "**Overall Quality**: {:.1}/1.0 ({})", overall, grade(overall))
    }
}

/// Rounded the way the summary prints it, so the grade matches the number.
fn one_decimal(score: f32) -> f32 {
    (score * 10.0).round() / 10.0
}

/// First number in a grading reply, clamped to `[0, 1]`.
pub fn parse_score(reply: &str) -> Option<f32> {
    FIRST_NUMBER
        .captures(reply.trim())
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<f32>().ok())
        .map(|s| s.clamp(0.0, 1.0))
}

fn word_set(text: &str) -> HashSet<String> {
    text.split_whitespace().map(|w| w.to_lowercase()).collect()
}

/// Question-term coverage (0.7) plus answer length up to 50 words (0.3).
pub fn completeness(question: &str, answer: &str) -> f32 {
    let question_words = word_set(question);
    let answer_words = word_set(answer);

    let coverage = question_words.intersection(&answer_words).count() as f32
        / question_words.len().max(1) as f32;
    let length = (answer.split_whitespace().count() as f32 / 50.0).min(1.0);

    (coverage * 0.7 + length * 0.3).clamp(0.0, 1.0)
}

fn is_structure_marker(c: char) -> bool {
    matches!(c, '\n' | '•' | '-' | '*' | '+' | '.') || c.is_ascii_digit()
}

/// Sentence-length band (0.7) plus structural-marker density (0.3).
///
/// Sentences are split on periods; an average of 10 to 25 words scores 1.0
/// and the score falls off linearly outside that band, floored at 0.3.
/// Markers are line breaks, bullets, digits and periods; five or more give
/// the full structural contribution.
pub fn clarity(answer: &str) -> f32 {
    let sentences: Vec<&str> = answer.split('.').collect();
    let words: usize = sentences.iter().map(|s| s.split_whitespace().count()).sum();
    let average = words as f32 / sentences.len().max(1) as f32;

    let length_score = if (10.0..=25.0).contains(&average) {
        1.0
    } else {
        (1.0 - (average - 17.5).abs() / 20.0).max(0.3)
    };

    let markers = answer.chars().filter(|&c| is_structure_marker(c)).count();
    let structure_score = (markers as f32 / 5.0).min(1.0);

    (length_score * 0.7 + structure_score * 0.3).clamp(0.0, 1.0)
}

/// Scores answers on four axes.
pub struct ResponseEvaluator {
    llm: Arc<dyn LanguageModel>,
    prompts: Arc<Prompts>,
    settings: EvaluationSettings,
}

impl ResponseEvaluator {
    pub fn new(llm: Arc<dyn LanguageModel>, prompts: Arc<Prompts>, settings: EvaluationSettings) -> Self {
        Self { llm, prompts, settings }
    }

    fn options(&self) -> CompletionOptions {
        CompletionOptions::new(&self.settings.model, self.settings.temperature)
            .with_max_tokens(self.settings.max_tokens)
    }

    async fn graded(&self, axis: &str, template: &str, vars: HashMap<String, String>, default: f32) -> f32 {
        let prompt = self.prompts.render_with_custom(template, &vars);
        match self.llm.complete(&prompt, &self.options()).await {
            Ok(reply) => match parse_score(&reply) {
                Some(score) => score,
                None => {
                    warn!("Unparseable {} grade {:?}, using {}", axis, reply, default);
                    default
                }
            },
            Err(e) => {
                warn!("{} grading failed, using {}: {}", axis, default, e);
                default
            }
        }
    }

    /// Model-graded support of `answer` by `context`.
    pub async fn faithfulness(&self, answer: &str, context: &str) -> f32 {
        let mut excerpt = truncate_chars(context, self.settings.context_chars).to_string();
        if excerpt.len() < context.len() {
            excerpt.push_str("...");
        }

        let mut vars = HashMap::new();
        vars.insert("context".to_string(), excerpt);
        vars.insert("answer".to_string(), answer.to_string());
        self.graded(
            "faithfulness",
            &self.prompts.evaluation.faithfulness,
            vars,
            self.settings.faithfulness_default,
        )
        .await
    }

    /// Model-graded fit of `answer` to `question`.
    pub async fn relevance(&self, question: &str, answer: &str) -> f32 {
        let mut vars = HashMap::new();
        vars.insert("question".to_string(), question.to_string());
        vars.insert("answer".to_string(), answer.to_string());
        self.graded(
            "relevance",
            &self.prompts.evaluation.relevance,
            vars,
            self.settings.relevance_default,
        )
        .await
    }

    /// Score `answer` for `question` against `context`.
    pub async fn evaluate(&self, question: &str, answer: &str, context: &str) -> EvaluationScore {
        let faithfulness = self.faithfulness(answer, context).await;
        let relevance = self.relevance(question, answer).await;
        let score = EvaluationScore::new(
            faithfulness,
            relevance,
            completeness(question, answer),
            clarity(answer),
        );
        debug!("Evaluation: {:?}", score);
        score
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Result, TubeChatError};
    use async_trait::async_trait;

    struct Fixed(&'static str);

    #[async_trait]
    impl LanguageModel for Fixed {
        async fn complete(&self, _prompt: &str, _options: &CompletionOptions) -> Result<String> {
            Ok(self.0.to_string())
        }

        async fn complete_json(&self, _prompt: &str, _options: &CompletionOptions) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    struct Failing;

    #[async_trait]
    impl LanguageModel for Failing {
        async fn complete(&self, _prompt: &str, _options: &CompletionOptions) -> Result<String> {
            Err(TubeChatError::Llm("timeout".to_string()))
        }

        async fn complete_json(&self, _prompt: &str, _options: &CompletionOptions) -> Result<String> {
            Err(TubeChatError::Llm("timeout".to_string()))
        }
    }

    fn evaluator(llm: Arc<dyn LanguageModel>) -> ResponseEvaluator {
        ResponseEvaluator::new(llm, Arc::new(Prompts::default()), EvaluationSettings::default())
    }

    #[test]
    fn test_parse_score() {
        assert_eq!(parse_score("0.85"), Some(0.85));
        assert_eq!(parse_score("Score: 0.6 overall"), Some(0.6));
        assert_eq!(parse_score("7"), Some(1.0));
        assert_eq!(parse_score("no number"), None);
    }

    #[test]
    fn test_grades() {
        assert_eq!(grade(0.95), "Excellent");
        assert_eq!(grade(0.8), "Very Good");
        assert_eq!(grade(0.7), "Good");
        assert_eq!(grade(0.65), "Fair");
        assert_eq!(grade(0.5), "Needs Improvement");
        assert_eq!(grade(0.1), "Poor");
    }

    #[test]
    fn test_completeness() {
        // Full coverage, 4 of 50 words.
        let score = completeness("paint colors", "paint colors are mixed");
        assert!((score - (0.7 + 0.3 * 4.0 / 50.0)).abs() < 1e-6);
        assert_eq!(completeness("", ""), 0.0);
    }

    #[test]
    fn test_clarity_bounds() {
        for text in [
            "",
            "Short.",
            "One very long sentence that keeps going and going without ever stopping for breath or punctuation of any kind at all whatsoever here",
            "1. First point\n2. Second point\n- bullet\n* star",
        ] {
            let c = clarity(text);
            assert!((0.0..=1.0).contains(&c), "{} out of range for {:?}", c, text);
        }
        // Two sentences of 11 and 12 words with five markers.
        let balanced = "Step 1 covers the setup and explains every tool you need.\n- Step 2 walks through the build and shows the final result";
        assert!((clarity(balanced) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_overall_is_weighted_sum() {
        let s = EvaluationScore::new(0.9, 0.5, 0.3, 1.0);
        let expected = 0.4 * 0.9 + 0.3 * 0.5 + 0.2 * 0.3 + 0.1 * 1.0;
        assert!((s.overall_quality - expected).abs() < 1e-6);
    }

    #[test]
    fn test_summary_rendering() {
        let summary = EvaluationScore::new(0.9, 0.8, 0.6, 0.4).to_string();
        assert!(summary.starts_with("**Response Quality Evaluation:**"));
        assert!(summary.contains("• **Faithfulness**: 0.9/1.0 (Excellent)"));
        assert!(summary.contains("• **Clarity**: 0.4/1.0 (Poor)"));
        assert!(summary.contains("**Overall Quality**: 0.8/1.0 (Very Good)"));
    }

    #[test]
    fn test_grade_follows_printed_value() {
        let summary = EvaluationScore::new(0.87, 0.67, 0.3, 0.48).to_string();
        assert!(summary.contains("• **Faithfulness**: 0.9/1.0 (Excellent)"));
        assert!(summary.contains("• **Relevance**: 0.7/1.0 (Good)"));
        assert!(summary.contains("• **Clarity**: 0.5/1.0 (Needs Improvement)"));
    }

    #[tokio::test]
    async fn test_model_grades_are_used() {
        let score = evaluator(Arc::new(Fixed("0.95"))).evaluate("q", "a", "ctx").await;
        assert!((score.faithfulness - 0.95).abs() < 1e-6);
        assert!((score.relevance - 0.95).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_failures_fall_back_to_defaults() {
        let score = evaluator(Arc::new(Failing))
            .evaluate("what is rust", "Rust is a systems language.", "ctx")
            .await;
        assert!((score.faithfulness - 0.7).abs() < 1e-6);
        assert!((score.relevance - 0.8).abs() < 1e-6);

        let score = evaluator(Arc::new(Fixed("n/a"))).evaluate("q", "a", "ctx").await;
        assert!((score.faithfulness - 0.7).abs() < 1e-6);
        assert!((score.relevance - 0.8).abs() < 1e-6);
    }
}
