//! Client configuration.
//!
//! Values come from `config.toml` in the hookchat config directory, then
//! environment variables override individual fields. A missing file yields
//! the defaults.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use hookchat_core::error::{ChatError, Result};

use crate::paths::HookchatPaths;

pub const DEFAULT_CHAT_WEBHOOK_URL: &str = "http://localhost:5678/webhook/chat";
pub const DEFAULT_TITLE_WEBHOOK_URL: &str = "http://localhost:5678/webhook/chat-title";
pub const DEFAULT_GEO_URL: &str = "https://ipinfo.io/json";

pub const ENV_CHAT_WEBHOOK_URL: &str = "HOOKCHAT_CHAT_WEBHOOK_URL";
pub const ENV_TITLE_WEBHOOK_URL: &str = "HOOKCHAT_TITLE_WEBHOOK_URL";
pub const ENV_GEO_URL: &str = "HOOKCHAT_GEO_URL";
pub const ENV_GEO_TOKEN: &str = "IPINFO_TOKEN";
pub const ENV_DATA_DIR: &str = "HOOKCHAT_DATA_DIR";

/// Root configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub chat_webhook_url: String,
    pub title_webhook_url: String,
    /// Per-request timeout for the webhooks, in seconds.
    pub request_timeout_secs: u64,
    /// Overrides the platform data directory for the local store.
    pub data_dir: Option<PathBuf>,
    pub geo: GeoConfig,
    pub storage: StorageKeys,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            chat_webhook_url: DEFAULT_CHAT_WEBHOOK_URL.to_string(),
            title_webhook_url: DEFAULT_TITLE_WEBHOOK_URL.to_string(),
            request_timeout_secs: 120,
            data_dir: None,
            geo: GeoConfig::default(),
            storage: StorageKeys::default(),
        }
    }
}

/// Geolocation lookup settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeoConfig {
    pub url: String,
    /// Bearer token; without one the lookup is skipped.
    pub token: Option<String>,
    pub timeout_ms: u64,
    pub max_attempts: u32,
    pub backoff_base_ms: u64,
}

impl Default for GeoConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_GEO_URL.to_string(),
            token: None,
            timeout_ms: 3000,
            max_attempts: 3,
            backoff_base_ms: 500,
        }
    }
}

/// Keys under which the local store keeps each value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageKeys {
    pub conversations: String,
    pub active_conversation: String,
    pub settings: String,
    pub language: String,
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self {
            conversations: "conversations".to_string(),
            active_conversation: "activeConversationId".to_string(),
            settings: "settings".to_string(),
            language: "language".to_string(),
        }
    }
}

impl AppConfig {
    /// Loads the config from the default location and applies the process
    /// environment.
    pub fn load() -> Result<Self> {
        let path = HookchatPaths::config_file().map_err(|e| ChatError::config(e.to_string()))?;
        let mut config = Self::load_from(&path)?;
        config.apply_env(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Loads the config file at `path`; a missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "[AppConfig] No config file, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| {
            ChatError::config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Overrides fields from environment-style lookups. Empty values are ignored.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(url) = get(ENV_CHAT_WEBHOOK_URL) {
            self.chat_webhook_url = url;
        }
        if let Some(url) = get(ENV_TITLE_WEBHOOK_URL) {
            self.title_webhook_url = url;
        }
        if let Some(url) = get(ENV_GEO_URL) {
            self.geo.url = url;
        }
        if let Some(token) = get(ENV_GEO_TOKEN) {
            self.geo.token = Some(token);
        }
        if let Some(dir) = get(ENV_DATA_DIR) {
            self.data_dir = Some(PathBuf::from(dir));
        }
    }

    /// Directory holding the local store.
    pub fn resolve_data_dir(&self) -> Result<PathBuf> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => HookchatPaths::store_dir().map_err(|e| ChatError::config(e.to_string())),
        }
    }
}
