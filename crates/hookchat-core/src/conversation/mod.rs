//! Conversation domain module.
//!
//! # Module Structure
//!
//! - `message`: Message types (`MessageRole`, `Message`)
//! - `model`: The `Conversation` entity and sidebar ordering
//! - `repository`: Repository trait for the persisted conversation list
//! - `title`: Title shortening and fallback rules
//! - `transcript`: Plain-text transcript export

mod message;
mod model;
mod repository;
pub mod title;
pub mod transcript;

pub use message::{Message, MessageRole};
pub use model::{Conversation, sidebar_order};
pub use repository::{ConversationRepository, ConversationUpdate, UpdateOutcome};
pub use transcript::{export_transcript, transcript_file_name};
