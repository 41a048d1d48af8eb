//! Parsing of REPL input lines.

use std::path::PathBuf;

use anyhow::{Result, anyhow, bail};
use hookchat_core::Locale;

/// Slash commands with their usage, in the order `/help` prints them.
pub const COMMANDS: &[(&str, &str)] = &[
    ("/new", "start a new conversation"),
    ("/list", "[all] list conversations"),
    ("/switch", "<n|id> open a conversation"),
    ("/rename", "<title> rename the active conversation"),
    ("/pin", "pin or unpin the active conversation"),
    ("/archive", "[n|id] archive or restore a conversation"),
    ("/delete", "[n|id ...] delete conversations"),
    ("/search", "<query> search titles and messages"),
    ("/edit", "<n> <text> edit message n"),
    ("/rm", "<n> remove message n"),
    ("/export", "[path] save the transcript"),
    ("/dark", "toggle dark mode"),
    ("/lang", "<en|nl> switch language"),
    ("/clear", "delete every conversation"),
    ("/help", "show this help"),
    ("/quit", "leave hookchat"),
];

/// A parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// Plain text for the active conversation.
    Message(String),
    Command(SlashCommand),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlashCommand {
    New,
    List { archived: bool },
    Switch(String),
    Rename(String),
    Pin,
    Archive(Option<String>),
    Delete(Vec<String>),
    Search(String),
    Edit { index: usize, text: String },
    Remove(usize),
    Export(Option<PathBuf>),
    Dark,
    Lang(Locale),
    Clear,
    Help,
    Quit,
}

impl Input {
    /// Parses a trimmed, non-empty line.
    ///
    /// Lines not starting with `/` are messages. A leading `//` escapes a
    /// message that itself starts with a slash.
    pub fn parse(line: &str) -> Result<Self> {
        let line = line.trim();
        if let Some(escaped) = line.strip_prefix("//") {
            return Ok(Input::Message(format!("/{escaped}")));
        }
        if !line.starts_with('/') {
            return Ok(Input::Message(line.to_string()));
        }

        let (name, rest) = match line.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim()),
            None => (line, ""),
        };

        let command = match name {
            "/new" => SlashCommand::New,
            "/list" | "/ls" => SlashCommand::List {
                archived: matches!(rest, "all" | "--archived"),
            },
            "/switch" | "/open" => SlashCommand::Switch(required(rest, "/switch <n|id>")?),
            "/rename" => SlashCommand::Rename(required(rest, "/rename <title>")?),
            "/pin" => SlashCommand::Pin,
            "/archive" => SlashCommand::Archive(optional(rest)),
            "/delete" => {
                SlashCommand::Delete(rest.split_whitespace().map(str::to_string).collect())
            }
            "/search" | "/find" => SlashCommand::Search(required(rest, "/search <query>")?),
            "/edit" => {
                let (index, text) = rest
                    .split_once(char::is_whitespace)
                    .ok_or_else(|| anyhow!("usage: /edit <n> <text>"))?;
                SlashCommand::Edit {
                    index: message_number(index)?,
                    text: required(text, "/edit <n> <text>")?,
                }
            }
            "/rm" => SlashCommand::Remove(message_number(rest)?),
            "/export" => SlashCommand::Export(optional(rest).map(PathBuf::from)),
            "/dark" => SlashCommand::Dark,
            "/lang" => SlashCommand::Lang(
                rest.parse()
                    .map_err(|_| anyhow!("unknown language '{rest}' (expected en or nl)"))?,
            ),
            "/clear" => SlashCommand::Clear,
            "/help" | "/?" => SlashCommand::Help,
            "/quit" | "/exit" => SlashCommand::Quit,
            other => bail!("unknown command {other}, try /help"),
        };
        Ok(Input::Command(command))
    }
}

fn required(rest: &str, usage: &str) -> Result<String> {
    let rest = rest.trim();
    if rest.is_empty() {
        bail!("usage: {usage}");
    }
    Ok(rest.to_string())
}

fn optional(rest: &str) -> Option<String> {
    let rest = rest.trim();
    (!rest.is_empty()).then(|| rest.to_string())
}

/// 1-based message number as shown next to each message.
fn message_number(raw: &str) -> Result<usize> {
    match raw.trim().parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => bail!("expected a message number, got '{}'", raw.trim()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command(line: &str) -> SlashCommand {
        match Input::parse(line).unwrap() {
            Input::Command(command) => command,
            other => panic!("expected a command, got {other:?}"),
        }
    }

    #[test]
    fn test_plain_text_is_a_message() {
        assert_eq!(
            Input::parse("  hello there ").unwrap(),
            Input::Message("hello there".to_string())
        );
    }

    #[test]
    fn test_double_slash_escapes_a_message() {
        assert_eq!(
            Input::parse("//etc/hosts is missing").unwrap(),
            Input::Message("/etc/hosts is missing".to_string())
        );
    }

    #[test]
    fn test_commands_with_arguments() {
        assert_eq!(command("/switch 3"), SlashCommand::Switch("3".to_string()));
        assert_eq!(
            command("/rename  Trip to Ghent "),
            SlashCommand::Rename("Trip to Ghent".to_string())
        );
        assert_eq!(
            command("/edit 2 fixed typo here"),
            SlashCommand::Edit {
                index: 2,
                text: "fixed typo here".to_string()
            }
        );
        assert_eq!(command("/rm 4"), SlashCommand::Remove(4));
        assert_eq!(
            command("/delete 1 abc"),
            SlashCommand::Delete(vec!["1".to_string(), "abc".to_string()])
        );
        assert_eq!(command("/lang NL"), SlashCommand::Lang(Locale::Nl));
        assert_eq!(command("/list all"), SlashCommand::List { archived: true });
        assert_eq!(command("/list"), SlashCommand::List { archived: false });
    }

    #[test]
    fn test_optional_arguments() {
        assert_eq!(command("/archive"), SlashCommand::Archive(None));
        assert_eq!(command("/delete"), SlashCommand::Delete(Vec::new()));
        assert_eq!(command("/export"), SlashCommand::Export(None));
        assert_eq!(
            command("/export /tmp/out.txt"),
            SlashCommand::Export(Some(PathBuf::from("/tmp/out.txt")))
        );
    }

    #[test]
    fn test_invalid_input_is_rejected() {
        assert!(Input::parse("/switch").is_err());
        assert!(Input::parse("/edit two words").is_err());
        assert!(Input::parse("/edit 2").is_err());
        assert!(Input::parse("/rm 0").is_err());
        assert!(Input::parse("/lang fr").is_err());
        assert!(Input::parse("/frobnicate").is_err());
    }

    #[test]
    fn test_every_listed_command_parses() {
        for (name, _) in COMMANDS {
            let line = match *name {
                "/switch" | "/rename" | "/search" => format!("{name} x"),
                "/edit" => format!("{name} 1 x"),
                "/rm" => format!("{name} 1"),
                "/lang" => format!("{name} en"),
                _ => name.to_string(),
            };
            assert!(Input::parse(&line).is_ok(), "{line} should parse");
        }
    }
}
