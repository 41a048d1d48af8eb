//! Ports to the remote services the client talks to.
//!
//! The concrete HTTP implementations live in `hookchat-interaction`; the
//! application layer only sees these traits.

use async_trait::async_trait;
use thiserror::Error;

use crate::conversation::Message;
use crate::locale::Locale;

/// Failure of a remote call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// The request never produced a response (DNS, connect, timeout, ...).
    #[error("network failure: {0}")]
    Network(String),

    #[error("endpoint not found (HTTP 404)")]
    NotFound,

    #[error("unauthorized (HTTP {status})")]
    Unauthorized { status: u16 },

    #[error("server error (HTTP {status}): {body}")]
    Server { status: u16, body: String },

    #[error("HTTP error {status}: {body}")]
    Http { status: u16, body: String },

    /// A response arrived but its shape was unusable.
    #[error("malformed response: {0}")]
    Malformed(String),

    /// The call cannot be made (e.g. an API token is not configured).
    #[error("missing configuration: {0}")]
    MissingConfig(String),
}

/// Coarse failure classes used to pick the message shown in the chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureCategory {
    Network,
    NotFound,
    Unauthorized,
    Server,
    Generic,
}

impl GatewayError {
    /// Maps a non-success HTTP status to its error variant.
    pub fn from_status(status: u16, body: impl Into<String>) -> Self {
        match status {
            404 => Self::NotFound,
            401 | 403 => Self::Unauthorized { status },
            500..=599 => Self::Server {
                status,
                body: body.into(),
            },
            _ => Self::Http {
                status,
                body: body.into(),
            },
        }
    }

    pub fn category(&self) -> FailureCategory {
        match self {
            Self::Network(_) => FailureCategory::Network,
            Self::NotFound => FailureCategory::NotFound,
            Self::Unauthorized { .. } => FailureCategory::Unauthorized,
            Self::Server { .. } => FailureCategory::Server,
            Self::Http { .. } | Self::Malformed(_) | Self::MissingConfig(_) => {
                FailureCategory::Generic
            }
        }
    }
}

/// The chat webhook.
#[async_trait]
pub trait ChatGateway: Send + Sync {
    /// Sends one user message and returns the assistant's reply as plain text.
    ///
    /// No retry is performed; the caller decides how to surface failures.
    async fn send_message(&self, session_id: &str, text: &str) -> Result<String, GatewayError>;

    /// Fetches the turns the remote workflow remembers for `session_id`.
    async fn load_previous_session(&self, session_id: &str) -> Result<Vec<Message>, GatewayError>;
}

/// Produces a conversation title from its opening exchange.
///
/// Implementations never fail: any problem falls back to a locally derived
/// title (see [`crate::conversation::title::fallback_title`]).
#[async_trait]
pub trait TitleGenerator: Send + Sync {
    async fn generate_title(&self, messages: &[Message], locale: Locale) -> String;
}

/// IP-based country lookup.
#[async_trait]
pub trait GeoLocator: Send + Sync {
    /// Returns an ISO 3166-1 alpha-2 country code.
    async fn country_code(&self) -> Result<String, GatewayError>;
}
