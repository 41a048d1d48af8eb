//! Application services for hookchat: conversation state, locale
//! resolution, settings and toasts.

pub mod conversation;
pub mod locale_resolver;
pub mod settings_service;
pub mod toast_queue;

pub use conversation::{ChatEvent, ConversationService, Transcript};
pub use locale_resolver::{LocaleResolver, LocaleState, RetryPolicy};
pub use settings_service::SettingsService;
pub use toast_queue::ToastQueue;
