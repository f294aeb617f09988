//! Interactive chat command.

use super::{open_video, prepare_embeddings};
use crate::cli::Output;
use crate::config::Settings;
use anyhow::Result;
use console::style;
use std::io::{self, BufRead, Write};

/// Run the interactive chat command.
pub async fn run_chat(video: &str, settings: Settings) -> Result<()> {
    let mut engine = open_video(video, settings).await?;
    prepare_embeddings(&engine).await?;

    println!("\n{}", style("tubechat").bold().cyan());
    println!(
        "{}\n",
        style("Ask about the video, or 'exit' to quit. Use 'clear' to reset the conversation.").dim()
    );

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("{} ", style("You:").green().bold());
        stdout.flush()?;

        let mut input = String::new();
        if stdin.lock().read_line(&mut input)? == 0 {
            break;
        }

        let input = input.trim();

        if input.is_empty() {
            continue;
        }

        if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
            Output::info("Goodbye!");
            break;
        }

        if input.eq_ignore_ascii_case("clear") {
            engine.clear_history();
            Output::info("Conversation history cleared.");
            continue;
        }

        let spinner = Output::spinner("Thinking...");
        let answer = engine.ask(input).await;
        spinner.finish_and_clear();

        println!("\n{} {}\n", style("tubechat:").cyan().bold(), answer);
    }

    Ok(())
}
