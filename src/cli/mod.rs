//! CLI module for tubechat.

pub mod commands;
mod output;

pub use output::Output;

use clap::{Parser, Subcommand, ValueEnum};

/// tubechat - Chat with YouTube transcripts
///
/// Load a video's transcript, ask grounded questions about it with cited
/// sources, and generate study materials from it.
#[derive(Parser, Debug)]
#[command(name = "tubechat")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load a video transcript into the store and build its embeddings
    Load {
        /// YouTube URL or 11-character video ID
        video: String,

        /// Read the transcript from this file instead of the transcript directory
        #[arg(short, long)]
        transcript: Option<String>,

        /// Video title (fetched when omitted)
        #[arg(long)]
        title: Option<String>,

        /// Channel name (fetched when omitted)
        #[arg(long)]
        channel: Option<String>,

        /// Skip building embeddings
        #[arg(long)]
        no_embed: bool,
    },

    /// Build embeddings for a loaded video
    Index {
        /// YouTube URL or video ID
        video: String,

        /// Rebuild even if enough embeddings are stored
        #[arg(short, long)]
        force: bool,
    },

    /// Ask a single question about a video
    Ask {
        /// YouTube URL or video ID
        video: String,

        /// The question to ask
        question: String,

        /// Skip answer quality evaluation
        #[arg(long)]
        no_eval: bool,
    },

    /// Start an interactive chat about a video
    Chat {
        /// YouTube URL or video ID
        video: String,
    },

    /// List stored videos
    List,

    /// Generate study materials for a video
    Study {
        /// YouTube URL or video ID
        video: String,

        /// What to generate
        #[arg(value_enum)]
        kind: StudyKind,

        /// Number of highlights or flashcards
        #[arg(short = 'n', long)]
        count: Option<usize>,

        /// Print the raw JSON result
        #[arg(long)]
        json: bool,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum StudyKind {
    Summary,
    Highlights,
    Mood,
    Guide,
    Notes,
    Flashcards,
    Path,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Write the current configuration to the default path
    Init,

    /// Show configuration file path
    Path,
}
