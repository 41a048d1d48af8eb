//! Plain-text transcript export.

use chrono::{Local, TimeZone};

use super::message::MessageRole;
use super::model::Conversation;
use crate::locale::Locale;

/// Renders a conversation as `[HH:MM] Role: content` entries separated by a
/// blank line, using the local time zone.
pub fn export_transcript(conversation: &Conversation, locale: Locale) -> String {
    export_transcript_in(conversation, locale, &Local)
}

/// Same as [`export_transcript`] with an explicit time zone.
pub fn export_transcript_in<Tz>(conversation: &Conversation, locale: Locale, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let strings = locale.strings();
    conversation
        .messages
        .iter()
        .map(|message| {
            let time = message
                .timestamp
                .map(|ts| ts.with_timezone(tz).format("%H:%M").to_string())
                .unwrap_or_else(|| "--:--".to_string());
            let role = match message.role {
                MessageRole::User => strings.user_label,
                MessageRole::Assistant => strings.assistant_label,
            };
            format!("[{time}] {role}: {}", message.content)
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// File name suggested for an exported transcript.
pub fn transcript_file_name(conversation: &Conversation) -> String {
    let slug: String = conversation
        .title
        .chars()
        .map(|c| if c.is_alphanumeric() { c.to_ascii_lowercase() } else { '-' })
        .collect();
    let slug = slug
        .split('-')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-");
    let slug = if slug.is_empty() { "chat".to_string() } else { slug };
    format!("{}-{}.txt", slug, conversation.timestamp.format("%Y-%m-%d"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::Message;
    use chrono::{TimeZone, Utc};

    fn fixture() -> Conversation {
        let mut conv = Conversation::seeded(Locale::En);
        conv.title = "Trip: Ghent & Bruges".to_string();
        conv.timestamp = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        conv.messages = vec![
            Message {
                timestamp: Some(Utc.with_ymd_and_hms(2024, 3, 1, 9, 5, 0).unwrap()),
                ..Message::user("Hi there")
            },
            Message {
                timestamp: None,
                ..Message::assistant("Hello!")
            },
        ];
        conv
    }

    #[test]
    fn test_transcript_format() {
        let text = export_transcript_in(&fixture(), Locale::En, &Utc);
        assert_eq!(text, "[09:05] User: Hi there\n\n[--:--] Assistant: Hello!");
    }

    #[test]
    fn test_transcript_uses_localized_labels() {
        let text = export_transcript_in(&fixture(), Locale::Nl, &Utc);
        assert!(text.contains("Gebruiker: Hi there"));
        assert!(text.contains("Assistent: Hello!"));
    }

    #[test]
    fn test_file_name_slug() {
        assert_eq!(transcript_file_name(&fixture()), "trip-ghent-bruges-2024-03-01.txt");
    }
}
