//! Domain layer for hookchat.
//!
//! Holds the conversation model, localized strings, the error taxonomy and
//! the traits (repositories, gateways) the other crates implement or consume.

pub mod conversation;
pub mod error;
pub mod gateway;
pub mod locale;
pub mod settings;
pub mod state;
pub mod toast;

pub use error::ChatError;
pub use locale::Locale;
