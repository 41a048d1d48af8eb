//! `SettingsRepository` backed by the local store.

use async_trait::async_trait;

use hookchat_core::settings::{Settings, SettingsRepository};

use crate::storage::LocalStore;

#[derive(Clone)]
pub struct JsonSettingsRepository {
    store: LocalStore,
    key: String,
}

impl JsonSettingsRepository {
    pub fn new(store: LocalStore, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }
}

#[async_trait]
impl SettingsRepository for JsonSettingsRepository {
    async fn load(&self) -> Settings {
        let store = self.store.clone();
        let key = self.key.clone();
        let Ok(Some(value)) = tokio::task::spawn_blocking(move || store.get(&key)).await else {
            return Settings::default();
        };

        serde_json::from_value(value).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "[SettingsRepository] Malformed settings, using defaults");
            Settings::default()
        })
    }

    async fn save(&self, settings: &Settings) {
        let value = match serde_json::to_value(settings) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(error = %e, "[SettingsRepository] Failed to serialize settings");
                return;
            }
        };

        let store = self.store.clone();
        let key = self.key.clone();
        if let Err(e) = tokio::task::spawn_blocking(move || store.set(&key, &value)).await {
            tracing::warn!(error = %e, "[SettingsRepository] Write task failed");
        }
    }
}
