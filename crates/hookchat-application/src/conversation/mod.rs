//! Conversation state management.
//!
//! # Module Structure
//!
//! - `events`: `ChatEvent` notifications for the presentation layer
//! - `service`: `ConversationService`, the owner of in-memory chat state

mod events;
mod service;

pub use events::ChatEvent;
pub use service::{ConversationService, Transcript};
