//! CLI output formatting utilities.

use crate::store::VideoListing;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Output helper for CLI formatting.
pub struct Output;

impl Output {
    /// Print an info message.
    pub fn info(msg: &str) {
        println!("{} {}", style(">>").cyan().bold(), msg);
    }

    /// Print a success message.
    pub fn success(msg: &str) {
        println!("{} {}", style(">>").green().bold(), msg);
    }

    /// Print a warning message.
    pub fn warning(msg: &str) {
        eprintln!("{} {}", style(">>").yellow().bold(), msg);
    }

    /// Print an error message.
    pub fn error(msg: &str) {
        eprintln!("{} {}", style(">>").red().bold(), msg);
    }

    /// Print a header.
    pub fn header(msg: &str) {
        println!("\n{}", style(msg).bold().underlined());
    }

    /// Print a key-value pair.
    pub fn kv(key: &str, value: &str) {
        println!("  {}: {}", style(key).dim(), value);
    }

    /// Print one stored video.
    pub fn video_listing(listing: &VideoListing) {
        let embeddings = if listing.embedding_count == 0 {
            style("not indexed".to_string()).yellow()
        } else {
            style(format!("{} chunks", listing.embedding_count)).green()
        };
        println!(
            "  {} {} ({}, {}, {}, {})",
            style("*").cyan(),
            style(&listing.info.title).bold(),
            style(&listing.info.video_id).dim(),
            listing.info.channel,
            listing.info.duration,
            embeddings
        );
    }

    /// Print a one-line preview of `content`.
    pub fn preview(content: &str) {
        println!("   {}", style(content_preview(content, 200)).dim());
    }

    /// Create a spinner.
    pub fn spinner(msg: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    }
}

/// Flatten newlines and cut to `max_chars` characters with an ellipsis.
fn content_preview(content: &str, max_chars: usize) -> String {
    let content = content.replace('\n', " ");
    if content.chars().count() <= max_chars {
        content
    } else {
        let cut: String = content.chars().take(max_chars).collect();
        format!("{}...", cut)
    }
}
