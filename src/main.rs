//! tubechat CLI entry point.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use tubechat::cli::{commands, Cli, Commands};
use tubechat::config::Settings;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("tubechat={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    // Load configuration
    let settings = match &cli.config {
        Some(path) => Settings::load_from(Some(&std::path::PathBuf::from(path)))?,
        None => Settings::load()?,
    };

    std::fs::create_dir_all(settings.data_dir())?;

    match &cli.command {
        Commands::Load {
            video,
            transcript,
            title,
            channel,
            no_embed,
        } => {
            commands::run_load(
                video,
                transcript.clone(),
                title.clone(),
                channel.clone(),
                *no_embed,
                settings,
            )
            .await?;
        }

        Commands::Index { video, force } => {
            commands::run_index(video, *force, settings).await?;
        }

        Commands::Ask {
            video,
            question,
            no_eval,
        } => {
            commands::run_ask(video, question, *no_eval, settings).await?;
        }

        Commands::Chat { video } => {
            commands::run_chat(video, settings).await?;
        }

        Commands::List => {
            commands::run_list(settings).await?;
        }

        Commands::Study {
            video,
            kind,
            count,
            json,
        } => {
            commands::run_study(video, *kind, *count, *json, settings).await?;
        }

        Commands::Config { action } => {
            commands::run_config(action, settings)?;
        }
    }

    Ok(())
}
