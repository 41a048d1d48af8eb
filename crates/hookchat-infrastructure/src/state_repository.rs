//! `StateRepository` backed by the local store.
//!
//! The active conversation id and the language choice each live under their
//! own key, as a bare JSON string.

use async_trait::async_trait;
use serde_json::Value;

use hookchat_core::Locale;
use hookchat_core::state::StateRepository;

use crate::config::StorageKeys;
use crate::storage::LocalStore;

#[derive(Clone)]
pub struct StateRepositoryImpl {
    store: LocalStore,
    active_key: String,
    language_key: String,
}

impl StateRepositoryImpl {
    pub fn new(store: LocalStore, keys: &StorageKeys) -> Self {
        Self {
            store,
            active_key: keys.active_conversation.clone(),
            language_key: keys.language.clone(),
        }
    }

    async fn get_string(&self, key: &str) -> Option<String> {
        let store = self.store.clone();
        let key = key.to_string();
        let value = tokio::task::spawn_blocking(move || store.get(&key))
            .await
            .map_err(|e| tracing::warn!(error = %e, "[StateRepository] Read task failed"))
            .ok()
            .flatten()?;

        match value {
            Value::String(s) if !s.is_empty() => Some(s),
            _ => None,
        }
    }

    async fn put(&self, key: &str, value: Option<Value>) {
        let store = self.store.clone();
        let key = key.to_string();
        let result = tokio::task::spawn_blocking(move || match value {
            Some(value) => {
                store.set(&key, &value);
            }
            None => store.remove(&key),
        })
        .await;

        if let Err(e) = result {
            tracing::warn!(error = %e, "[StateRepository] Write task failed");
        }
    }
}

#[async_trait]
impl StateRepository for StateRepositoryImpl {
    async fn get_active_conversation(&self) -> Option<String> {
        self.get_string(&self.active_key).await
    }

    async fn set_active_conversation(&self, conversation_id: Option<String>) {
        self.put(&self.active_key, conversation_id.map(Value::String))
            .await;
    }

    async fn get_language(&self) -> Option<Locale> {
        let raw = self.get_string(&self.language_key).await?;
        match raw.parse::<Locale>() {
            Ok(locale) => Some(locale),
            Err(_) => {
                tracing::warn!(value = %raw, "[StateRepository] Ignoring unknown stored language");
                None
            }
        }
    }

    async fn set_language(&self, locale: Locale) {
        self.put(&self.language_key, Some(Value::String(locale.to_string())))
            .await;
    }
}
