//! Unified path management for hookchat files.
//!
//! # Directory Structure
//!
//! ```text
//! ~/.config/hookchat/          # Config directory
//! └── config.toml              # Webhook URLs, geolocation, storage keys
//!
//! ~/.local/share/hookchat/     # Data directory
//! ├── store/                   # Local key-value store
//! │   ├── conversations.json
//! │   ├── activeConversationId.json
//! │   ├── settings.json
//! │   └── language.json
//! └── logs/
//!     └── hookchat.log.YYYY-MM-DD
//! ```

use std::path::PathBuf;

const APP_DIR: &str = "hookchat";

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// Home directory could not be determined.
    HomeDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::HomeDirNotFound => write!(f, "Cannot find home directory"),
        }
    }
}

impl std::error::Error for PathError {}

pub struct HookchatPaths;

impl HookchatPaths {
    /// Returns the hookchat configuration directory (e.g. `~/.config/hookchat/`).
    pub fn config_dir() -> Result<PathBuf, PathError> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or(PathError::HomeDirNotFound)
    }

    /// Returns the hookchat data directory (e.g. `~/.local/share/hookchat/`).
    pub fn data_dir() -> Result<PathBuf, PathError> {
        dirs::data_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or(PathError::HomeDirNotFound)
    }

    pub fn config_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Default location of the local store.
    pub fn store_dir() -> Result<PathBuf, PathError> {
        Ok(Self::data_dir()?.join("store"))
    }

    pub fn log_dir() -> Result<PathBuf, PathError> {
        Ok(Self::data_dir()?.join("logs"))
    }
}
