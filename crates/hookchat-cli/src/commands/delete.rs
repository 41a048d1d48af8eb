use anyhow::{Result, bail};
use colored::Colorize;

use crate::app::App;

pub async fn run(app: &App, ids: &[String]) -> Result<()> {
    app.conversations.load().await;

    let known = app.conversations.conversations().await;
    let missing: Vec<&String> = ids
        .iter()
        .filter(|id| !known.iter().any(|c| &c.id == *id))
        .collect();
    let palette = app.palette().await;
    for id in &missing {
        eprintln!("{}", format!("Unknown conversation {}", id).color(palette.error));
    }

    let removed = app.conversations.delete_many(ids).await;
    let strings = app.conversations.locale().await.strings();
    println!(
        "{}",
        format!("{} {}", removed, strings.conversations_deleted).color(palette.user)
    );

    if removed == 0 && !missing.is_empty() {
        bail!("No conversations deleted");
    }
    Ok(())
}
