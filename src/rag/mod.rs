//! RAG (Retrieval-Augmented Generation) for question answering with sources.
//!
//! Retrieval selects context chunks for a question, synthesis turns them
//! into a grounded answer and evaluation scores that answer.

mod evaluation;
mod expansion;
mod rerank;
mod retriever;
mod synthesizer;
mod time_match;

pub use evaluation::{clarity, completeness, grade, parse_score, EvaluationScore, ResponseEvaluator};
pub use expansion::{ExpansionRule, QueryExpander};
pub use rerank::{dedup_hits, keyword_overlap, rerank, RankedChunk};
pub use retriever::{Citation, Retrieval, RetrievalOutcome, Retriever};
pub use synthesizer::{format_context, AnswerSynthesizer, Synthesis};
pub use time_match::{chunks_at, parse_time_reference};
