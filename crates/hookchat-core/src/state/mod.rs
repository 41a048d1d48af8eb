//! Application state that outlives a single run: the active conversation
//! pointer and the chosen UI language.

use async_trait::async_trait;

use crate::locale::Locale;

/// Repository for small pieces of global state.
///
/// Each value lives under its own key. Getters return `None` for absent or
/// malformed data; setters log failures instead of returning them.
#[async_trait]
pub trait StateRepository: Send + Sync {
    async fn get_active_conversation(&self) -> Option<String>;

    /// Stores the active conversation id, or clears it with `None`.
    async fn set_active_conversation(&self, conversation_id: Option<String>);

    async fn get_language(&self) -> Option<Locale>;

    async fn set_language(&self, locale: Locale);
}
