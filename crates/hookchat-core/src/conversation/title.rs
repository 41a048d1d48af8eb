//! Title rules shared by the title generator and the state manager.

use super::message::Message;
use crate::locale::Locale;

/// Titles with more words than this get shortened.
pub const MAX_TITLE_WORDS: usize = 6;
/// Hard cap on a shortened title, ellipsis included.
pub const MAX_TITLE_CHARS: usize = 60;
/// Length of the fallback title cut from the first user message.
pub const FALLBACK_TITLE_CHARS: usize = 50;

const ELLIPSIS: &str = "...";

/// Cleans a generated title and shortens it when it is too long.
///
/// Surrounding whitespace and quotes are stripped. A title of at most
/// [`MAX_TITLE_WORDS`] words is returned as is; longer ones keep their first
/// words followed by `...`, never exceeding [`MAX_TITLE_CHARS`] characters.
pub fn shorten_title(raw: &str) -> String {
    let cleaned = raw
        .trim()
        .trim_matches(|c| c == '"' || c == '\'' || c == '`')
        .trim();
    let words: Vec<&str> = cleaned.split_whitespace().collect();
    if words.len() <= MAX_TITLE_WORDS {
        return cleaned.to_string();
    }

    let head = words[..MAX_TITLE_WORDS].join(" ");
    let budget = MAX_TITLE_CHARS - ELLIPSIS.len();
    let head: String = if head.chars().count() > budget {
        head.chars().take(budget).collect::<String>().trim_end().to_string()
    } else {
        head
    };
    format!("{head}{ELLIPSIS}")
}

/// Title used when the title webhook is unavailable.
///
/// First [`FALLBACK_TITLE_CHARS`] characters of the first user message, with
/// `...` when it was longer; the localized generic label when there is no
/// user message.
pub fn fallback_title(messages: &[Message], locale: Locale) -> String {
    let Some(first) = messages.iter().find(|m| m.is_user()) else {
        return locale.strings().new_chat_title.to_string();
    };
    let text = first.content.trim();
    if text.is_empty() {
        return locale.strings().new_chat_title.to_string();
    }
    if text.chars().count() > FALLBACK_TITLE_CHARS {
        let head: String = text.chars().take(FALLBACK_TITLE_CHARS).collect();
        format!("{head}{ELLIPSIS}")
    } else {
        text.to_string()
    }
}
