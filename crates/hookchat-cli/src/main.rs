use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;

use hookchat_infrastructure::AppConfig;
use hookchat_infrastructure::logging::{LoggingConfig, init_logging};
use hookchat_infrastructure::paths::HookchatPaths;

mod app;
mod commands;
mod render;
mod repl;

use app::App;

#[derive(Parser)]
#[command(name = "hookchat")]
#[command(about = "hookchat - chat with an n8n workflow from the terminal", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the interactive chat (default)
    Chat,
    /// List stored conversations, pinned first
    List {
        /// Include archived conversations
        #[arg(long)]
        archived: bool,
    },
    /// Search conversation titles and messages
    Search {
        query: String,
        /// Include archived conversations
        #[arg(long)]
        archived: bool,
    },
    /// Write a conversation transcript to a file
    Export {
        /// Conversation id
        id: String,
        /// Target file or directory (defaults to the current directory)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Delete conversations by id
    Delete {
        #[arg(required = true)]
        ids: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let _log_guard = match HookchatPaths::log_dir() {
        Ok(dir) => match init_logging(&LoggingConfig::new(dir)) {
            Ok(guard) => Some(guard),
            Err(e) => {
                eprintln!("{}", format!("Logging disabled: {}", e).yellow());
                None
            }
        },
        Err(e) => {
            eprintln!("{}", format!("Logging disabled: {}", e).yellow());
            None
        }
    };

    let config = AppConfig::load()?;
    let app = App::build(&config).await?;

    match cli.command.unwrap_or(Commands::Chat) {
        Commands::Chat => repl::run(app).await?,
        Commands::List { archived } => commands::list::run(&app, archived).await?,
        Commands::Search { query, archived } => {
            commands::list::search(&app, &query, archived).await?
        }
        Commands::Export { id, output } => commands::export::run(&app, &id, output).await?,
        Commands::Delete { ids } => commands::delete::run(&app, &ids).await?,
    }

    Ok(())
}
