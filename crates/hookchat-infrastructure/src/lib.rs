//! Infrastructure layer for hookchat: the on-disk key-value store and the
//! repositories built on it, configuration, platform paths and logging.

pub mod config;
pub mod conversation_repository;
pub mod logging;
pub mod paths;
pub mod settings_repository;
pub mod state_repository;
pub mod storage;

pub use crate::config::AppConfig;
pub use crate::conversation_repository::JsonConversationRepository;
pub use crate::settings_repository::JsonSettingsRepository;
pub use crate::state_repository::StateRepositoryImpl;
pub use crate::storage::LocalStore;
