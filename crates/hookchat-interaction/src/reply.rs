//! Normalisation of webhook payloads.
//!
//! n8n workflows answer in whatever shape their last node produces. These
//! helpers turn such payloads into plain reply text or a message history.

use serde_json::{Map, Value};

use hookchat_core::conversation::{Message, MessageRole};

/// Top-level fields that may carry the reply, in order of preference.
const REPLY_FIELDS: &[&str] = &[
    "answer",
    "response",
    "text",
    "message",
    "chatOutput",
    "reply",
    "content",
];

const HISTORY_FIELDS: &[&str] = &["messages", "chatHistory", "history"];
const HISTORY_TEXT_FIELDS: &[&str] = &["content", "text", "message"];

/// Where a reply was found inside a payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyShape {
    /// `{"output": {"answer": ...}}`
    NestedAnswer(String),
    /// One of the well-known top-level fields.
    Field(&'static str, String),
    /// `{"output": "..."}`
    Output(String),
    /// A bare JSON string.
    Plain(String),
    /// Nothing recognisable; the raw payload.
    Raw(String),
}

impl ReplyShape {
    pub fn into_text(self) -> String {
        match self {
            Self::NestedAnswer(text)
            | Self::Field(_, text)
            | Self::Output(text)
            | Self::Plain(text)
            | Self::Raw(text) => text,
        }
    }
}

/// Extracts the reply text from a response body.
///
/// Bodies that are not JSON are returned verbatim.
pub fn extract_reply(body: &str) -> String {
    match serde_json::from_str::<Value>(body) {
        Ok(value) => classify_reply(&value).into_text(),
        Err(_) => body.to_string(),
    }
}

/// Classifies a JSON payload by where its reply lives.
pub fn classify_reply(value: &Value) -> ReplyShape {
    find_reply(value).unwrap_or_else(|| ReplyShape::Raw(value.to_string()))
}

fn find_reply(value: &Value) -> Option<ReplyShape> {
    match value {
        Value::Object(map) => find_in_object(map),
        Value::Array(items) => items.first().and_then(find_reply),
        Value::String(text) => Some(ReplyShape::Plain(text.clone())),
        _ => None,
    }
}

fn find_in_object(map: &Map<String, Value>) -> Option<ReplyShape> {
    if let Some(answer) = map
        .get("output")
        .and_then(|output| output.get("answer"))
        .and_then(Value::as_str)
    {
        return Some(ReplyShape::NestedAnswer(answer.to_string()));
    }

    for field in REPLY_FIELDS {
        if let Some(text) = map.get(*field).and_then(Value::as_str) {
            return Some(ReplyShape::Field(*field, text.to_string()));
        }
    }

    map.get("output")
        .and_then(Value::as_str)
        .map(|text| ReplyShape::Output(text.to_string()))
}

/// Reads a session history payload.
///
/// Accepts `messages`, `chatHistory` or `history` arrays at the top level or
/// under `output`, or a bare array. Items are `{role|type, content|text|message}`;
/// items without text are skipped.
pub fn parse_history(value: &Value) -> Vec<Message> {
    let Some(items) = history_items(value) else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| {
            let content = HISTORY_TEXT_FIELDS
                .iter()
                .find_map(|field| item.get(*field).and_then(Value::as_str))?
                .trim();
            if content.is_empty() {
                return None;
            }
            let role = item
                .get("role")
                .or_else(|| item.get("type"))
                .and_then(Value::as_str)
                .map(MessageRole::parse_loose)
                .unwrap_or(MessageRole::Assistant);
            Some(Message::new(role, content))
        })
        .collect()
}

fn history_items(value: &Value) -> Option<&Vec<Value>> {
    match value {
        Value::Array(items) => Some(items),
        Value::Object(map) => HISTORY_FIELDS
            .iter()
            .find_map(|field| map.get(*field).and_then(Value::as_array))
            .or_else(|| map.get("output").and_then(history_items)),
        _ => None,
    }
}
