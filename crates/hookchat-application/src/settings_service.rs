//! Cached access to the user's settings.

use std::sync::Arc;

use tokio::sync::RwLock;

use hookchat_core::settings::{Settings, SettingsRepository};

pub struct SettingsService {
    repository: Arc<dyn SettingsRepository>,
    current: RwLock<Settings>,
}

impl SettingsService {
    /// Loads the stored settings.
    pub async fn load(repository: Arc<dyn SettingsRepository>) -> Self {
        let current = repository.load().await;
        Self {
            repository,
            current: RwLock::new(current),
        }
    }

    pub async fn current(&self) -> Settings {
        *self.current.read().await
    }

    /// Flips dark mode, persists and returns the new value.
    pub async fn toggle_dark_mode(&self) -> bool {
        let mut current = self.current.write().await;
        current.dark_mode = !current.dark_mode;
        self.repository.save(&current).await;
        tracing::debug!(dark_mode = current.dark_mode, "[SettingsService] Toggled dark mode");
        current.dark_mode
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MockSettingsRepository {
        stored: Mutex<Option<Settings>>,
    }

    #[async_trait]
    impl SettingsRepository for MockSettingsRepository {
        async fn load(&self) -> Settings {
            self.stored.lock().unwrap().unwrap_or_default()
        }

        async fn save(&self, settings: &Settings) {
            *self.stored.lock().unwrap() = Some(*settings);
        }
    }

    #[tokio::test]
    async fn test_toggle_persists() {
        let repository = Arc::new(MockSettingsRepository::default());
        let service = SettingsService::load(repository.clone()).await;

        assert!(!service.current().await.dark_mode);
        assert!(service.toggle_dark_mode().await);
        assert_eq!(*repository.stored.lock().unwrap(), Some(Settings { dark_mode: true }));
        assert!(!service.toggle_dark_mode().await);
    }
}
