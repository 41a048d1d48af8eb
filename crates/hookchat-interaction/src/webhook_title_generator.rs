//! WebhookTitleGenerator - asks a dedicated webhook to name a conversation.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;

use hookchat_core::Locale;
use hookchat_core::conversation::Message;
use hookchat_core::conversation::title::{fallback_title, shorten_title};
use hookchat_core::gateway::{GatewayError, TitleGenerator};

use crate::http::{map_transport_error, read_body};

const TITLE_FIELDS: &[&str] = &["title", "response", "answer"];

#[derive(Debug, Serialize)]
struct TitleRequest<'a> {
    messages: Vec<TitleMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct TitleMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Clone)]
pub struct WebhookTitleGenerator {
    client: Client,
    url: String,
    timeout: Duration,
}

impl WebhookTitleGenerator {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: Client::new(),
            url: url.into(),
            timeout,
        }
    }

    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    async fn request_title(&self, messages: &[Message]) -> Result<String, GatewayError> {
        let request = TitleRequest {
            messages: opening_exchange(messages),
        };
        if request.messages.is_empty() {
            return Err(GatewayError::Malformed("no user message to title".to_string()));
        }

        let response = self
            .client
            .post(&self.url)
            .timeout(self.timeout)
            .json(&request)
            .send()
            .await
            .map_err(map_transport_error)?;

        let body_text = read_body(response).await?;
        let value: Value = serde_json::from_str(&body_text)
            .map_err(|e| GatewayError::Malformed(format!("title reply is not JSON: {e}")))?;

        read_title(&value)
            .ok_or_else(|| GatewayError::Malformed("title reply has no title".to_string()))
    }
}

/// The first user message and the first reply that follows it.
fn opening_exchange(messages: &[Message]) -> Vec<TitleMessage<'_>> {
    let Some(start) = messages.iter().position(Message::is_user) else {
        return Vec::new();
    };

    let mut exchange = vec![TitleMessage {
        role: messages[start].role.as_str(),
        content: &messages[start].content,
    }];
    if let Some(reply) = messages[start + 1..].iter().find(|m| !m.is_user()) {
        exchange.push(TitleMessage {
            role: reply.role.as_str(),
            content: &reply.content,
        });
    }
    exchange
}

/// First non-empty title found, cleaned and shortened.
fn read_title(value: &Value) -> Option<String> {
    let value = match value {
        Value::Array(items) => items.first()?,
        other => other,
    };
    TITLE_FIELDS
        .iter()
        .filter_map(|field| value.get(*field).and_then(Value::as_str))
        .map(shorten_title)
        .find(|title| !title.is_empty())
}

#[async_trait]
impl TitleGenerator for WebhookTitleGenerator {
    async fn generate_title(&self, messages: &[Message], locale: Locale) -> String {
        match self.request_title(messages).await {
            Ok(title) => title,
            Err(e) => {
                tracing::warn!(error = %e, "[WebhookTitleGenerator] Falling back to local title");
                fallback_title(messages, locale)
            }
        }
    }
}
