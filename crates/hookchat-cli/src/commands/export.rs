use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use colored::Colorize;

use crate::app::App;

pub async fn run(app: &App, id: &str, output: Option<PathBuf>) -> Result<()> {
    app.resolve_locale().await;
    app.conversations.load().await;

    let transcript = app
        .conversations
        .export_transcript(id)
        .await
        .with_context(|| format!("Cannot export conversation {}", id))?;
    let path = write_transcript(output.as_deref(), &transcript.file_name, &transcript.content).await?;

    let strings = app.conversations.locale().await.strings();
    let palette = app.palette().await;
    println!(
        "{} {}",
        strings.transcript_exported.color(palette.user),
        path.display()
    );
    Ok(())
}

/// Writes `content` to `output`, or to `file_name` in the current directory.
///
/// An existing directory as `output` receives `file_name` inside it.
pub async fn write_transcript(output: Option<&Path>, file_name: &str, content: &str) -> Result<PathBuf> {
    let path = match output {
        Some(path) if path.is_dir() => path.join(file_name),
        Some(path) => path.to_path_buf(),
        None => PathBuf::from(file_name),
    };
    tokio::fs::write(&path, content)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;
    tracing::info!(path = %path.display(), "[Export] Wrote transcript");
    Ok(path)
}
