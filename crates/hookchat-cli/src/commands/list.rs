use anyhow::Result;
use colored::Colorize;

use hookchat_core::conversation::Conversation;

use crate::app::App;
use crate::render::conversation_row;

pub async fn run(app: &App, archived: bool) -> Result<()> {
    app.conversations.load().await;
    let conversations = app.conversations.sidebar(archived).await;
    let empty = app.conversations.locale().await.strings().no_conversations;
    print_rows(app, &conversations, empty).await;
    Ok(())
}

pub async fn search(app: &App, query: &str, archived: bool) -> Result<()> {
    app.conversations.load().await;
    let conversations = app.conversations.search(query, archived).await;
    let empty = app.conversations.locale().await.strings().no_results;
    print_rows(app, &conversations, empty).await;
    Ok(())
}

async fn print_rows(app: &App, conversations: &[Conversation], empty: &str) {
    let palette = app.palette().await;
    if conversations.is_empty() {
        println!("{}", empty.color(palette.muted));
        return;
    }

    let active = app.conversations.active_id().await;
    for (i, conversation) in conversations.iter().enumerate() {
        let is_active = active.as_deref() == Some(conversation.id.as_str());
        println!(
            "{}",
            conversation_row(i + 1, conversation, is_active, false, &palette)
        );
        println!("        {}", conversation.id.color(palette.muted));
    }
}
