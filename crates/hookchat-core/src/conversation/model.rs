//! Conversation domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::message::{Message, MessageRole, lenient_timestamp};
use crate::locale::Locale;

/// A locally persisted thread of messages.
///
/// `id` is the primary key of the stored list. `session_id` is sent to the
/// chat webhook so the remote workflow can find its own memory of earlier
/// turns; it is independent of `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: String,
    #[serde(default)]
    pub title: String,
    /// Last-touched time; bumped on every mutation.
    #[serde(default, deserialize_with = "touched_timestamp")]
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default)]
    pub session_id: String,
    #[serde(default)]
    pub pinned: bool,
    #[serde(default)]
    pub archived: bool,
}

fn touched_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_timestamp(deserializer)?.unwrap_or_default())
}

impl Conversation {
    /// Creates a conversation seeded with the localized welcome message.
    pub fn seeded(locale: Locale) -> Self {
        let strings = locale.strings();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title: strings.new_chat_title.to_string(),
            timestamp: Utc::now(),
            messages: vec![Message::assistant(strings.welcome)],
            session_id: uuid::Uuid::new_v4().to_string(),
            pinned: false,
            archived: false,
        }
    }

    /// Marks the conversation as touched now.
    pub fn touch(&mut self) {
        self.timestamp = Utc::now();
    }

    /// True when the conversation still holds only its assistant seed message.
    pub fn has_only_seed(&self) -> bool {
        matches!(self.messages.as_slice(), [only] if only.role == MessageRole::Assistant)
    }

    /// The first message typed by the user, if any.
    pub fn first_user_message(&self) -> Option<&Message> {
        self.messages.iter().find(|m| m.is_user())
    }

    /// The first assistant message that follows the first user message.
    pub fn first_reply(&self) -> Option<&Message> {
        let start = self.messages.iter().position(|m| m.is_user())?;
        self.messages[start + 1..]
            .iter()
            .find(|m| m.role == MessageRole::Assistant)
    }

    /// Position of the message with `message_id`.
    pub fn message_index(&self, message_id: &str) -> Option<usize> {
        self.messages
            .iter()
            .position(|m| m.id.as_deref() == Some(message_id))
    }

    /// Case-insensitive match against the title and every message body.
    pub fn matches(&self, query: &str) -> bool {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        self.title.to_lowercase().contains(&needle)
            || self
                .messages
                .iter()
                .any(|m| m.content.to_lowercase().contains(&needle))
    }
}

/// Orders conversations for display: pinned first, then most recently touched.
pub fn sidebar_order(conversations: &mut [Conversation]) {
    conversations.sort_by(|a, b| {
        b.pinned
            .cmp(&a.pinned)
            .then_with(|| b.timestamp.cmp(&a.timestamp))
    });
}
