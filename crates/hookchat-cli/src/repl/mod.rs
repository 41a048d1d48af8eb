//! Interactive chat loop.
//!
//! Input is read on the current worker via `block_in_place`; sends run on
//! spawned tasks and their results come back as [`ChatEvent`]s, which a
//! separate task prints above the prompt. Replies for conversations other
//! than the active one surface as info toasts.

mod command;
mod helper;

use std::sync::{Arc, Mutex};

use anyhow::{Context, Result, anyhow, bail};
use chrono::Utc;
use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::{Editor, ExternalPrinter};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use hookchat_application::{
    ChatEvent, ConversationService, LocaleResolver, SettingsService, ToastQueue,
};
use hookchat_core::conversation::Conversation;
use hookchat_core::toast::ToastKind;

use crate::app::App;
use crate::commands::export::write_transcript;
use crate::render::{Palette, conversation_row, render_failure, render_message, toast_line};

use command::{COMMANDS, Input, SlashCommand};
use helper::CliHelper;

/// Where asynchronous output goes while the prompt may be active.
enum Output {
    External(Box<dyn ExternalPrinter + Send>),
    Stdout,
}

impl Output {
    fn for_editor(editor: &mut Editor<CliHelper, DefaultHistory>) -> Self {
        match editor.create_external_printer() {
            Ok(printer) => Output::External(Box::new(printer)),
            Err(e) => {
                tracing::debug!(error = %e, "[Repl] No external printer, writing to stdout");
                Output::Stdout
            }
        }
    }

    fn print(&mut self, text: String) {
        match self {
            Output::External(printer) => {
                if let Err(e) = printer.print(format!("{text}\n")) {
                    tracing::warn!(error = %e, "[Repl] External printer failed");
                    println!("{text}");
                }
            }
            Output::Stdout => println!("{text}"),
        }
    }
}

enum Flow {
    Continue,
    Quit,
}

struct Repl {
    conversations: ConversationService,
    settings: Arc<SettingsService>,
    locale: Arc<LocaleResolver>,
    toasts: Arc<Mutex<ToastQueue>>,
    /// Ids in the order of the last printed list, for `/switch <n>`.
    listing: Vec<String>,
}

pub async fn run(app: App) -> Result<()> {
    let App {
        conversations,
        settings,
        locale,
        events,
    } = app;

    let resolved = locale.resolve().await;
    conversations.set_locale(resolved).await;
    conversations.load().await;
    if conversations.active_conversation().await.is_none() {
        conversations.new_conversation().await;
    }
    conversations.hydrate_active().await;

    let mut editor: Editor<CliHelper, DefaultHistory> = Editor::new()?;
    editor.set_helper(Some(CliHelper::new()));

    let toasts = Arc::new(Mutex::new(ToastQueue::new()));
    let event_handler = spawn_event_handler(
        events,
        conversations.clone(),
        settings.clone(),
        toasts.clone(),
        Output::for_editor(&mut editor),
    );

    let mut repl = Repl {
        conversations,
        settings,
        locale,
        toasts,
        listing: Vec::new(),
    };

    let palette = repl.palette().await;
    println!("{}", "=== hookchat ===".color(palette.heading).bold());
    println!("{}", "Type a message, or /help for commands.".color(palette.muted));
    println!();
    repl.show_active().await;

    loop {
        let prompt = repl.prompt().await;
        let readline = tokio::task::block_in_place(|| editor.readline(&prompt));

        match readline {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                let _ = editor.add_history_entry(trimmed);

                let outcome = match Input::parse(trimmed) {
                    Ok(input) => repl.handle(input).await,
                    Err(e) => Err(e),
                };
                match outcome {
                    Ok(Flow::Continue) => {}
                    Ok(Flow::Quit) => break,
                    Err(e) => {
                        let palette = repl.palette().await;
                        eprintln!("{}", format!("{e:#}").color(palette.error));
                    }
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("{}", "CTRL-C detected. Type /quit to exit.".yellow());
            }
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                eprintln!("{}", format!("Error: {:?}", err).red());
                break;
            }
        }
    }

    println!("{}", "Goodbye!".bright_green());
    event_handler.abort();
    Ok(())
}

fn spawn_event_handler(
    mut events: mpsc::UnboundedReceiver<ChatEvent>,
    conversations: ConversationService,
    settings: Arc<SettingsService>,
    toasts: Arc<Mutex<ToastQueue>>,
    mut output: Output,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            let palette = Palette::for_mode(settings.current().await.dark_mode);
            let strings = conversations.locale().await.strings();
            let active = conversations.active_id().await;

            match event {
                ChatEvent::ReplyReceived {
                    conversation_id,
                    message,
                    failed,
                } => {
                    if active.as_deref() == Some(conversation_id.as_str()) {
                        let text = if failed {
                            render_failure(&message, strings, &palette)
                        } else {
                            render_message(&message, strings, &palette)
                        };
                        output.print(format!("{text}\n"));
                    } else {
                        let title = conversations
                            .conversation(&conversation_id)
                            .await
                            .map(|c| c.title)
                            .unwrap_or_default();
                        let text = format!("{} \"{}\"", strings.reply_in_background, title);
                        output.print(push_toast(&toasts, text, ToastKind::Info, &palette));
                    }
                }
                ChatEvent::TitleUpdated {
                    conversation_id,
                    title,
                } => {
                    if active.as_deref() == Some(conversation_id.as_str()) {
                        let text = format!("{}: {}", strings.title_updated, title);
                        output.print(push_toast(&toasts, text, ToastKind::Success, &palette));
                    }
                }
                ChatEvent::ConversationsChanged
                | ChatEvent::ActiveChanged(_)
                | ChatEvent::PendingChanged { .. } => {}
            }
        }
    })
}

/// Queues a toast, drops expired ones and returns the line to print.
fn push_toast(
    toasts: &Mutex<ToastQueue>,
    message: String,
    kind: ToastKind,
    palette: &Palette,
) -> String {
    let now = Utc::now();
    let Ok(mut queue) = toasts.lock() else {
        return message;
    };
    queue.prune(now);
    let id = queue.push_at(message.clone(), kind, now);
    queue
        .active(now)
        .into_iter()
        .find(|t| t.id == id)
        .map(|t| toast_line(t, palette))
        .unwrap_or(message)
}

impl Repl {
    async fn palette(&self) -> Palette {
        Palette::for_mode(self.settings.current().await.dark_mode)
    }

    async fn prompt(&self) -> String {
        let title = self
            .conversations
            .active_conversation()
            .await
            .map(|c| c.title)
            .unwrap_or_default();
        let waiting = if self.conversations.is_loading().await {
            " …"
        } else {
            ""
        };
        format!("{title}{waiting} >> ")
    }

    async fn toast(&self, message: impl Into<String>, kind: ToastKind) {
        let palette = self.palette().await;
        println!("{}", push_toast(&self.toasts, message.into(), kind, &palette));
    }

    async fn handle(&mut self, input: Input) -> Result<Flow> {
        let command = match input {
            Input::Message(text) => {
                self.conversations.send_to_active(&text).await?;
                let palette = self.palette().await;
                let strings = self.conversations.locale().await.strings();
                println!("{}", strings.thinking.color(palette.muted).italic());
                return Ok(Flow::Continue);
            }
            Input::Command(command) => command,
        };

        let strings = self.conversations.locale().await.strings();
        match command {
            SlashCommand::New => {
                self.conversations.new_conversation().await;
                self.show_active().await;
            }
            SlashCommand::List { archived } => {
                let list = self.conversations.sidebar(archived).await;
                self.print_listing(list, strings.no_conversations).await;
            }
            SlashCommand::Search(query) => {
                let list = self.conversations.search(&query, true).await;
                self.print_listing(list, strings.no_results).await;
            }
            SlashCommand::Switch(target) => {
                let id = self.resolve_target(&target).await?;
                self.conversations.select(&id).await?;
                self.conversations.hydrate_active().await;
                self.show_active().await;
            }
            SlashCommand::Rename(title) => {
                let id = self.active_id().await?;
                self.conversations.rename(&id, &title).await?;
                self.toast(strings.title_updated, ToastKind::Success).await;
            }
            SlashCommand::Pin => {
                let id = self.active_id().await?;
                self.conversations.toggle_pin(&id).await?;
                if let Some(conversation) = self.conversations.conversation(&id).await {
                    let palette = self.palette().await;
                    println!("{}", conversation_row(1, &conversation, true, false, &palette));
                }
            }
            SlashCommand::Archive(target) => {
                let id = match target {
                    Some(target) => self.resolve_target(&target).await?,
                    None => self.active_id().await?,
                };
                let was_active = self.conversations.active_id().await.as_deref() == Some(id.as_str());
                let archived = self
                    .conversations
                    .conversation(&id)
                    .await
                    .is_some_and(|c| c.archived);
                self.conversations.set_archived(&id, !archived).await?;
                if archived {
                    self.toast(strings.conversation_restored, ToastKind::Success).await;
                } else {
                    self.toast(strings.conversation_archived, ToastKind::Success).await;
                    if was_active {
                        self.show_active().await;
                    }
                }
            }
            SlashCommand::Delete(targets) => {
                let ids = if targets.is_empty() {
                    vec![self.active_id().await?]
                } else {
                    let mut ids = Vec::with_capacity(targets.len());
                    for target in &targets {
                        ids.push(self.resolve_target(target).await?);
                    }
                    ids
                };
                let removed = self.conversations.delete_many(&ids).await;
                let message = if removed == 1 {
                    strings.conversation_deleted.to_string()
                } else {
                    format!("{} {}", removed, strings.conversations_deleted)
                };
                self.toast(message, ToastKind::Success).await;
                self.listing.retain(|id| !ids.contains(id));
            }
            SlashCommand::Edit { index, text } => {
                let (conversation_id, message_id) = self.message_at(index).await?;
                self.conversations
                    .edit_message(&conversation_id, &message_id, &text)
                    .await?;
                self.show_active().await;
            }
            SlashCommand::Remove(index) => {
                let (conversation_id, message_id) = self.message_at(index).await?;
                self.conversations
                    .delete_message(&conversation_id, &message_id)
                    .await?;
                self.show_active().await;
            }
            SlashCommand::Export(output) => {
                let id = self.active_id().await?;
                let transcript = self.conversations.export_transcript(&id).await?;
                let path = write_transcript(
                    output.as_deref(),
                    &transcript.file_name,
                    &transcript.content,
                )
                .await?;
                self.toast(
                    format!("{} {}", strings.transcript_exported, path.display()),
                    ToastKind::Success,
                )
                .await;
            }
            SlashCommand::Dark => {
                let dark = self.settings.toggle_dark_mode().await;
                let label = if dark { "Dark mode on" } else { "Dark mode off" };
                self.toast(label, ToastKind::Info).await;
            }
            SlashCommand::Lang(locale) => {
                self.locale.set_locale(locale).await;
                self.conversations.set_locale(locale).await;
                self.toast(format!("Language: {}", locale), ToastKind::Info).await;
            }
            SlashCommand::Clear => {
                self.conversations.clear_all().await;
                self.listing.clear();
                self.conversations.new_conversation().await;
                self.show_active().await;
            }
            SlashCommand::Help => self.print_help().await,
            SlashCommand::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }

    async fn active_id(&self) -> Result<String> {
        self.conversations
            .active_id()
            .await
            .ok_or_else(|| anyhow!("No active conversation, start one with /new"))
    }

    /// Maps a list number or an (abbreviated) id to a conversation id.
    async fn resolve_target(&self, target: &str) -> Result<String> {
        if let Ok(n) = target.parse::<usize>() {
            let listing = if self.listing.is_empty() {
                self.conversations
                    .sidebar(false)
                    .await
                    .into_iter()
                    .map(|c| c.id)
                    .collect()
            } else {
                self.listing.clone()
            };
            return n
                .checked_sub(1)
                .and_then(|i| listing.get(i).cloned())
                .ok_or_else(|| anyhow!("No conversation number {n}, see /list"));
        }

        let matches: Vec<String> = self
            .conversations
            .conversations()
            .await
            .into_iter()
            .map(|c| c.id)
            .filter(|id| id.starts_with(target))
            .collect();
        match matches.as_slice() {
            [id] => Ok(id.clone()),
            [] => bail!("Unknown conversation {target}"),
            _ => match matches.iter().find(|id| id.as_str() == target) {
                Some(id) => Ok(id.clone()),
                None => bail!("'{target}' matches {} conversations", matches.len()),
            },
        }
    }

    /// Conversation and message id of the `index`-th (1-based) message of
    /// the active conversation.
    async fn message_at(&self, index: usize) -> Result<(String, String)> {
        let conversation = self
            .conversations
            .active_conversation()
            .await
            .ok_or_else(|| anyhow!("No active conversation"))?;
        let message = index
            .checked_sub(1)
            .and_then(|i| conversation.messages.get(i))
            .with_context(|| format!("No message number {index}"))?;
        let message_id = message
            .id
            .clone()
            .with_context(|| format!("Message {index} was restored from history and cannot be changed"))?;
        Ok((conversation.id, message_id))
    }

    async fn print_listing(&mut self, list: Vec<Conversation>, empty: &str) {
        let palette = self.palette().await;
        if list.is_empty() {
            println!("{}", empty.color(palette.muted));
            return;
        }
        let active = self.conversations.active_id().await;
        for (i, conversation) in list.iter().enumerate() {
            let is_active = active.as_deref() == Some(conversation.id.as_str());
            let pending = self.conversations.is_pending(&conversation.id).await;
            println!(
                "{}",
                conversation_row(i + 1, conversation, is_active, pending, &palette)
            );
        }
        self.listing = list.into_iter().map(|c| c.id).collect();
    }

    async fn show_active(&self) {
        let palette = self.palette().await;
        let strings = self.conversations.locale().await.strings();
        let Some(conversation) = self.conversations.active_conversation().await else {
            println!("{}", strings.no_conversations.color(palette.muted));
            return;
        };

        println!("{}", format!("── {} ──", conversation.title).color(palette.heading).bold());
        for (i, message) in conversation.messages.iter().enumerate() {
            println!(
                "{} {}\n",
                format!("#{}", i + 1).color(palette.muted),
                render_message(message, strings, &palette)
            );
        }
        if self.conversations.is_loading().await {
            println!("{}", strings.thinking.color(palette.muted).italic());
        }
    }

    async fn print_help(&self) {
        let palette = self.palette().await;
        for (name, usage) in COMMANDS {
            println!(
                "  {} {}",
                format!("{name:<10}").color(palette.accent),
                usage.color(palette.muted)
            );
        }
        println!(
            "  {}",
            "Anything else is sent to the active conversation; start with // to send a leading slash."
                .color(palette.muted)
        );
    }
}
