//! Terminal rendering: colours, lightweight markdown, conversation rows.

use chrono::Local;
use colored::{Color, ColoredString, Colorize};
use once_cell::sync::Lazy;
use regex::Regex;

use hookchat_core::conversation::{Conversation, Message, MessageRole};
use hookchat_core::locale::Translations;
use hookchat_core::toast::{Toast, ToastKind};

static INLINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\*\*(?P<bold>[^*]+)\*\*|`(?P<code>[^`]+)`").unwrap());
static BULLET: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?P<indent>\s*)(?:[-*+]|(?P<num>\d+)[.)])\s+(?P<body>.*)$").unwrap());

/// Colours for one display mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub user: Color,
    pub assistant: Color,
    pub heading: Color,
    pub code: Color,
    pub accent: Color,
    pub muted: Color,
    pub error: Color,
}

impl Palette {
    pub fn for_mode(dark_mode: bool) -> Self {
        if dark_mode {
            Self {
                user: Color::BrightGreen,
                assistant: Color::BrightBlue,
                heading: Color::BrightMagenta,
                code: Color::BrightYellow,
                accent: Color::BrightCyan,
                muted: Color::BrightBlack,
                error: Color::BrightRed,
            }
        } else {
            Self {
                user: Color::Green,
                assistant: Color::Blue,
                heading: Color::Magenta,
                code: Color::Yellow,
                accent: Color::Cyan,
                muted: Color::BrightBlack,
                error: Color::Red,
            }
        }
    }
}

/// Styles headings, fenced code, bullets, `**bold**` and `` `code` ``.
///
/// Anything else passes through with the assistant colour.
pub fn render_markdown(input: &str, palette: &Palette) -> String {
    let mut out = Vec::new();
    let mut in_code_block = false;

    for raw in input.lines() {
        let trimmed = raw.trim_start();

        if trimmed.starts_with("```") {
            in_code_block = !in_code_block;
            if in_code_block {
                let lang = trimmed.trim_start_matches('`').trim();
                if !lang.is_empty() {
                    out.push(format!("  {}", lang.color(palette.muted).italic()));
                }
            }
            continue;
        }

        if in_code_block {
            out.push(format!("  {}", raw.color(palette.code)));
            continue;
        }

        let hashes = trimmed.chars().take_while(|&c| c == '#').count();
        if (1..=6).contains(&hashes) && trimmed[hashes..].starts_with(' ') {
            let heading = trimmed[hashes + 1..].trim();
            let styled = heading.color(palette.heading).bold();
            out.push(if hashes == 1 {
                styled.underline().to_string()
            } else {
                styled.to_string()
            });
            continue;
        }

        if let Some(caps) = BULLET.captures(raw) {
            let indent = &caps["indent"];
            let marker = match caps.name("num") {
                Some(num) => format!("{}.", num.as_str()),
                None => "•".to_string(),
            };
            out.push(format!(
                "{}{} {}",
                indent,
                marker.color(palette.accent),
                stylize_inline(&caps["body"], palette)
            ));
            continue;
        }

        out.push(stylize_inline(raw, palette));
    }

    out.join("\n")
}

fn stylize_inline(text: &str, palette: &Palette) -> String {
    let mut out = String::new();
    let mut last = 0;
    for caps in INLINE.captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        out.push_str(&text[last..whole.start()].color(palette.assistant).to_string());
        if let Some(bold) = caps.name("bold") {
            out.push_str(&bold.as_str().color(palette.assistant).bold().to_string());
        } else if let Some(code) = caps.name("code") {
            out.push_str(&code.as_str().color(palette.code).to_string());
        }
        last = whole.end();
    }
    out.push_str(&text[last..].color(palette.assistant).to_string());
    out
}

/// One message as shown in the transcript view.
pub fn render_message(message: &Message, strings: &Translations, palette: &Palette) -> String {
    let time = message
        .timestamp
        .map(|ts| ts.with_timezone(&Local).format("%H:%M").to_string())
        .unwrap_or_else(|| "--:--".to_string());

    let (label, body) = match message.role {
        MessageRole::User => (
            strings.user_label.color(palette.user).bold(),
            message.content.color(palette.user).to_string(),
        ),
        MessageRole::Assistant => (
            strings.assistant_label.color(palette.assistant).bold(),
            render_markdown(&message.content, palette),
        ),
    };

    format!("{} {}\n{}", format!("[{time}]").color(palette.muted), label, body)
}

/// Failed sends are shown in the error colour instead of as markdown.
pub fn render_failure(message: &Message, strings: &Translations, palette: &Palette) -> String {
    format!(
        "{}\n{}",
        strings.assistant_label.color(palette.error).bold(),
        message.content.color(palette.error)
    )
}

/// A numbered row for the conversation list.
pub fn conversation_row(
    index: usize,
    conversation: &Conversation,
    active: bool,
    pending: bool,
    palette: &Palette,
) -> String {
    let marker = if active { "›" } else { " " };
    let mut flags = Vec::new();
    if conversation.pinned {
        flags.push("pinned");
    }
    if conversation.archived {
        flags.push("archived");
    }
    if pending {
        flags.push("waiting");
    }

    let title: ColoredString = if active {
        conversation.title.color(palette.accent).bold()
    } else {
        conversation.title.normal()
    };

    let mut row = format!(
        "{} {:>3}. {}  {}",
        marker.color(palette.accent),
        index,
        title,
        conversation
            .timestamp
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M")
            .to_string()
            .color(palette.muted)
    );
    if !flags.is_empty() {
        row.push_str(&format!(" {}", format!("[{}]", flags.join(", ")).color(palette.muted)));
    }
    row
}

pub fn toast_line(toast: &Toast, palette: &Palette) -> String {
    let (icon, color) = match toast.kind {
        ToastKind::Success => ("✓", palette.user),
        ToastKind::Error => ("✗", palette.error),
        ToastKind::Info => ("●", palette.accent),
    };
    format!("{} {}", icon.color(color), toast.message.color(color))
}

#[cfg(test)]
mod tests {
    use super::*;
    use hookchat_core::Locale;

    fn plain() -> Palette {
        colored::control::set_override(false);
        Palette::for_mode(true)
    }

    #[test]
    fn test_headings_lose_their_hashes() {
        let palette = plain();
        let rendered = render_markdown("## Setup\ntext", &palette);
        assert_eq!(rendered, "Setup\ntext");
    }

    #[test]
    fn test_hash_without_space_is_not_a_heading() {
        let palette = plain();
        assert_eq!(render_markdown("#hashtag", &palette), "#hashtag");
    }

    #[test]
    fn test_code_fence_is_indented_and_keeps_markdown() {
        let palette = plain();
        let input = "Run:\n```bash\n# not a heading\n- not a bullet\n```\ndone";
        let rendered = render_markdown(input, &palette);
        assert_eq!(
            rendered,
            "Run:\n  bash\n  # not a heading\n  - not a bullet\ndone"
        );
    }

    #[test]
    fn test_inline_markers_are_stripped() {
        let palette = plain();
        let rendered = render_markdown("Use **cargo** and `fmt` now", &palette);
        assert_eq!(rendered, "Use cargo and fmt now");
    }

    #[test]
    fn test_bullets_and_numbered_items() {
        let palette = plain();
        let rendered = render_markdown("- one\n  * two\n3. three", &palette);
        assert_eq!(rendered, "• one\n  • two\n3. three");
    }

    #[test]
    fn test_unclosed_bold_passes_through() {
        let palette = plain();
        assert_eq!(render_markdown("a ** b", &palette), "a ** b");
    }

    #[test]
    fn test_message_without_timestamp_shows_placeholder() {
        let palette = plain();
        let mut message = Message::user("hi");
        message.timestamp = None;
        let rendered = render_message(&message, Locale::En.strings(), &palette);
        assert!(rendered.starts_with("[--:--] "));
        assert!(rendered.ends_with("\nhi"));
    }

    #[test]
    fn test_conversation_row_flags() {
        let palette = plain();
        let mut conversation = Conversation::seeded(Locale::En);
        conversation.pinned = true;
        conversation.archived = true;

        let row = conversation_row(2, &conversation, true, true, &palette);
        assert!(row.starts_with("›   2. New chat"));
        assert!(row.ends_with("[pinned, archived, waiting]"));

        let quiet = conversation_row(1, &Conversation::seeded(Locale::En), false, false, &palette);
        assert!(!quiet.contains('['));
    }

    #[test]
    fn test_palettes_differ_by_mode() {
        assert_ne!(Palette::for_mode(true), Palette::for_mode(false));
    }
}
