//! Ask command implementation.

use super::{open_video, prepare_embeddings};
use crate::cli::Output;
use crate::config::Settings;
use anyhow::Result;

/// Run the ask command.
pub async fn run_ask(video: &str, question: &str, no_eval: bool, mut settings: Settings) -> Result<()> {
    if no_eval {
        settings.evaluation.enabled = false;
    }

    let mut engine = open_video(video, settings).await?;
    prepare_embeddings(&engine).await?;

    let spinner = Output::spinner("Thinking...");
    let answer = engine.ask(question).await;
    spinner.finish_and_clear();

    if answer.is_answered() {
        println!("\n{}\n", answer);
    } else {
        Output::warning(&answer.text);
    }

    Ok(())
}
