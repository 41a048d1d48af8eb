use hookchat_core::conversation::Message;

/// Notifications emitted by [`super::ConversationService`] after state changes.
///
/// Delivered over an unbounded channel; the presentation layer re-renders
/// from the service's getters when it receives one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatEvent {
    /// The in-memory list was replaced with the merged stored list.
    ConversationsChanged,
    ActiveChanged(Option<String>),
    PendingChanged {
        conversation_id: String,
        pending: bool,
    },
    /// A send resolved; `failed` marks a synthesized error message.
    ReplyReceived {
        conversation_id: String,
        message: Message,
        failed: bool,
    },
    TitleUpdated {
        conversation_id: String,
        title: String,
    },
}
