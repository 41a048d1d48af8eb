use std::borrow::Cow::{self, Borrowed, Owned};

use colored::Colorize;
use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Helper};

use super::command::COMMANDS;

const LANGUAGES: &[&str] = &["en", "nl"];

/// Rustyline helper providing slash-command completion, highlighting and hints.
#[derive(Clone)]
pub struct CliHelper {
    commands: Vec<(String, String)>,
}

impl CliHelper {
    pub fn new() -> Self {
        Self {
            commands: COMMANDS
                .iter()
                .map(|(name, usage)| (name.to_string(), usage.to_string()))
                .collect(),
        }
    }

    fn candidates(&self, line: &str) -> (usize, Vec<Pair>) {
        if let Some(arg) = line.strip_prefix("/lang ") {
            let start = line.len() - arg.len();
            let pairs = LANGUAGES
                .iter()
                .filter(|lang| lang.starts_with(arg.trim_start()))
                .map(|lang| Pair {
                    display: lang.to_string(),
                    replacement: lang.to_string(),
                })
                .collect();
            return (start, pairs);
        }

        if line.starts_with('/') && !line.contains(' ') {
            let pairs = self
                .commands
                .iter()
                .filter(|(name, _)| name.starts_with(line))
                .map(|(name, _)| Pair {
                    display: name.clone(),
                    replacement: name.clone(),
                })
                .collect();
            return (0, pairs);
        }

        (0, Vec::new())
    }
}

impl Helper for CliHelper {}

impl Completer for CliHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        Ok(self.candidates(&line[..pos]))
    }
}

impl Highlighter for CliHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if line.starts_with("//") || !line.starts_with('/') {
            return Borrowed(line);
        }
        match line.split_once(' ') {
            Some((name, rest)) => Owned(format!("{} {}", name.bright_cyan(), rest)),
            None => Owned(line.bright_cyan().to_string()),
        }
    }

    fn highlight_hint<'h>(&self, hint: &'h str) -> Cow<'h, str> {
        Owned(hint.bright_black().to_string())
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

impl Hinter for CliHelper {
    type Hint = String;

    /// Completes the command name, or shows its usage once it is typed.
    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        let line = &line[..pos];
        if !line.starts_with('/') || line.contains(' ') {
            return None;
        }

        if let Some((_, usage)) = self.commands.iter().find(|(name, _)| name == line) {
            return Some(format!(" {usage}"));
        }
        self.commands
            .iter()
            .find(|(name, _)| name.starts_with(line))
            .map(|(name, _)| name[line.len()..].to_string())
    }
}

impl Validator for CliHelper {}
