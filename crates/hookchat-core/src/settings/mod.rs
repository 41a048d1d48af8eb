//! User settings.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Process-wide user preferences, persisted independently of conversations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default)]
    pub dark_mode: bool,
}

/// Storage for [`Settings`].
///
/// Missing or unreadable data loads as `Settings::default()`; write failures
/// are logged by the implementation.
#[async_trait]
pub trait SettingsRepository: Send + Sync {
    async fn load(&self) -> Settings;

    async fn save(&self, settings: &Settings);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_shape() {
        let json = serde_json::to_value(Settings { dark_mode: true }).unwrap();
        assert_eq!(json, serde_json::json!({"darkMode": true}));

        let parsed: Settings = serde_json::from_str("{}").unwrap();
        assert!(!parsed.dark_mode);
    }
}
