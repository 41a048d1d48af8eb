//! One-shot subcommands that work on the stored conversations and exit.

pub mod delete;
pub mod export;
pub mod list;
