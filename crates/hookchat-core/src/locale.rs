//! UI language and the localized strings the client shows.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::gateway::FailureCategory;

/// Supported UI languages.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Locale {
    #[default]
    En,
    Nl,
}

/// Country codes whose visitors get the Dutch UI.
const DUTCH_SPEAKING_COUNTRIES: &[&str] = &["NL", "BE", "SR"];

impl Locale {
    /// Maps an ISO 3166-1 alpha-2 country code to a UI language.
    pub fn from_country_code(code: &str) -> Self {
        let code = code.trim().to_ascii_uppercase();
        if DUTCH_SPEAKING_COUNTRIES.contains(&code.as_str()) {
            Locale::Nl
        } else {
            Locale::En
        }
    }

    /// Returns the string table for this locale.
    pub fn strings(self) -> &'static Translations {
        match self {
            Locale::En => &EN,
            Locale::Nl => &NL,
        }
    }
}

/// Static string table for one locale.
#[derive(Debug)]
pub struct Translations {
    pub welcome: &'static str,
    pub new_chat_title: &'static str,
    pub user_label: &'static str,
    pub assistant_label: &'static str,
    pub error_network: &'static str,
    pub error_not_found: &'static str,
    pub error_unauthorized: &'static str,
    pub error_server: &'static str,
    pub error_generic: &'static str,
    pub thinking: &'static str,
    pub reply_in_background: &'static str,
    pub conversation_deleted: &'static str,
    pub conversations_deleted: &'static str,
    pub conversation_archived: &'static str,
    pub conversation_restored: &'static str,
    pub transcript_exported: &'static str,
    pub title_updated: &'static str,
    pub no_conversations: &'static str,
    pub no_results: &'static str,
}

static EN: Translations = Translations {
    welcome: "Hello! How can I help you today?",
    new_chat_title: "New chat",
    user_label: "User",
    assistant_label: "Assistant",
    error_network: "I couldn't reach the server. Please check your internet connection and try again.",
    error_not_found: "The chat service could not be found (404). Please try again later.",
    error_unauthorized: "The chat service refused the request (authorization failed).",
    error_server: "The chat service ran into a problem. Please try again in a moment.",
    error_generic: "Sorry, something went wrong while sending your message. Please try again.",
    thinking: "Thinking...",
    reply_in_background: "New reply in",
    conversation_deleted: "Conversation deleted",
    conversations_deleted: "conversations deleted",
    conversation_archived: "Conversation archived",
    conversation_restored: "Conversation restored",
    transcript_exported: "Transcript exported to",
    title_updated: "Title updated",
    no_conversations: "No conversations yet.",
    no_results: "No conversations match your search.",
};

static NL: Translations = Translations {
    welcome: "Hallo! Waarmee kan ik je vandaag helpen?",
    new_chat_title: "Nieuwe chat",
    user_label: "Gebruiker",
    assistant_label: "Assistent",
    error_network: "Ik kon de server niet bereiken. Controleer je internetverbinding en probeer het opnieuw.",
    error_not_found: "De chatservice is niet gevonden (404). Probeer het later opnieuw.",
    error_unauthorized: "De chatservice weigerde het verzoek (autorisatie mislukt).",
    error_server: "De chatservice heeft een probleem. Probeer het zo opnieuw.",
    error_generic: "Sorry, er ging iets mis bij het versturen van je bericht. Probeer het opnieuw.",
    thinking: "Aan het nadenken...",
    reply_in_background: "Nieuw antwoord in",
    conversation_deleted: "Gesprek verwijderd",
    conversations_deleted: "gesprekken verwijderd",
    conversation_archived: "Gesprek gearchiveerd",
    conversation_restored: "Gesprek hersteld",
    transcript_exported: "Transcript opgeslagen in",
    title_updated: "Titel bijgewerkt",
    no_conversations: "Nog geen gesprekken.",
    no_results: "Geen gesprekken gevonden.",
};

impl Translations {
    /// The chat message shown in place of a reply when a send fails.
    pub fn failure_message(&self, category: FailureCategory) -> &'static str {
        match category {
            FailureCategory::Network => self.error_network,
            FailureCategory::NotFound => self.error_not_found,
            FailureCategory::Unauthorized => self.error_unauthorized,
            FailureCategory::Server => self.error_server,
            FailureCategory::Generic => self.error_generic,
        }
    }
}
