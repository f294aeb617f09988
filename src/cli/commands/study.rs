//! Study command implementation.

use super::open_video;
use crate::cli::{Output, StudyKind};
use crate::config::Settings;
use crate::engine::{ChatEngine, DEFAULT_FLASHCARDS, DEFAULT_HIGHLIGHTS};
use crate::study::{Generated, StudyArtifact};
use anyhow::Result;

/// Run the study command.
pub async fn run_study(
    video: &str,
    kind: StudyKind,
    count: Option<usize>,
    json: bool,
    settings: Settings,
) -> Result<()> {
    let engine = open_video(video, settings).await?;

    let spinner = Output::spinner("Generating...");
    let rendered = generate(&engine, kind, count, json).await;
    spinner.finish_and_clear();

    let (title, body, error) = rendered?;
    Output::header(title);
    println!("{}", body);
    if let Some(error) = error {
        Output::warning(&error);
    }

    Ok(())
}

type Rendered = (&'static str, String, Option<String>);

async fn generate(engine: &ChatEngine, kind: StudyKind, count: Option<usize>, json: bool) -> Result<Rendered> {
    Ok(match kind {
        StudyKind::Summary => render("Summary", engine.get_summary().await, json)?,
        StudyKind::Highlights => render(
            "Highlights",
            engine.get_highlights(count.unwrap_or(DEFAULT_HIGHLIGHTS)).await,
            json,
        )?,
        StudyKind::Mood => render("Mood Analysis", engine.get_mood_analysis().await, json)?,
        StudyKind::Guide => render("Study Guide", engine.generate_study_guide().await, json)?,
        StudyKind::Notes => render("Study Notes", engine.generate_notes().await, json)?,
        StudyKind::Flashcards => render(
            "Flashcards",
            engine.generate_flashcards(count.unwrap_or(DEFAULT_FLASHCARDS)).await,
            json,
        )?,
        StudyKind::Path => render("Learning Path", engine.generate_learning_path().await, json)?,
    })
}

fn render<T: StudyArtifact>(title: &'static str, generated: Generated<T>, json: bool) -> Result<Rendered> {
    let body = if json {
        serde_json::to_string_pretty(&generated)?
    } else {
        generated.content().render()
    };
    Ok((title, body, generated.error().map(str::to_string)))
}
