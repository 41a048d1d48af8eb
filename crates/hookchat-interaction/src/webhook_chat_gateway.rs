//! WebhookChatGateway - `ChatGateway` over an n8n chat webhook.
//!
//! Both operations POST JSON to the same URL; session loading adds
//! `?action=loadPreviousSession`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;

use hookchat_core::conversation::Message;
use hookchat_core::gateway::{ChatGateway, GatewayError};

use crate::http::{map_transport_error, read_body};
use crate::reply::{extract_reply, parse_history};

const SEND_ACTION: &str = "sendMessage";
const LOAD_ACTION: &str = "loadPreviousSession";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SendMessageRequest<'a> {
    chat_input: &'a str,
    session_id: &'a str,
    action: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LoadSessionRequest<'a> {
    session_id: &'a str,
}

#[derive(Clone)]
pub struct WebhookChatGateway {
    client: Client,
    url: String,
    timeout: Duration,
}

impl WebhookChatGateway {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: Client::new(),
            url: url.into(),
            timeout,
        }
    }

    /// Reuses an existing client (connection pool, proxy settings).
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl ChatGateway for WebhookChatGateway {
    async fn send_message(&self, session_id: &str, text: &str) -> Result<String, GatewayError> {
        let body = SendMessageRequest {
            chat_input: text,
            session_id,
            action: SEND_ACTION,
        };

        tracing::debug!(session_id, chars = text.chars().count(), "[WebhookChatGateway] Sending message");

        let response = self
            .client
            .post(&self.url)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .map_err(map_transport_error)?;

        let body_text = read_body(response).await?;
        Ok(extract_reply(&body_text))
    }

    async fn load_previous_session(&self, session_id: &str) -> Result<Vec<Message>, GatewayError> {
        let response = self
            .client
            .post(&self.url)
            .query(&[("action", LOAD_ACTION)])
            .timeout(self.timeout)
            .json(&LoadSessionRequest { session_id })
            .send()
            .await
            .map_err(map_transport_error)?;

        let body_text = read_body(response).await?;
        if body_text.trim().is_empty() {
            return Ok(Vec::new());
        }

        let value: Value = serde_json::from_str(&body_text)
            .map_err(|e| GatewayError::Malformed(format!("session history is not JSON: {e}")))?;
        let history = parse_history(&value);
        tracing::debug!(session_id, messages = history.len(), "[WebhookChatGateway] Loaded previous session");
        Ok(history)
    }
}
