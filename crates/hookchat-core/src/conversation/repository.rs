//! Conversation repository trait.
//!
//! Defines the interface for persisting the conversation list.

use async_trait::async_trait;

use super::model::Conversation;

/// A mutation applied to the stored conversation list.
pub type ConversationUpdate = Box<dyn FnOnce(&mut Vec<Conversation>) + Send>;

/// What became of a [`ConversationRepository::update`].
pub enum UpdateOutcome {
    /// The update ran against the stored list. This is the merged list, even
    /// if writing it back failed (which is logged).
    Merged(Vec<Conversation>),
    /// The stored list could not be locked or read; the update never ran and
    /// is handed back so the caller can apply it to its own copy.
    Unavailable(ConversationUpdate),
}

impl UpdateOutcome {
    pub fn merged(self) -> Option<Vec<Conversation>> {
        match self {
            UpdateOutcome::Merged(list) => Some(list),
            UpdateOutcome::Unavailable(_) => None,
        }
    }

    /// The merged list, or `fallback` with the update applied to it.
    pub fn merged_or_apply(self, mut fallback: Vec<Conversation>) -> Vec<Conversation> {
        match self {
            UpdateOutcome::Merged(list) => list,
            UpdateOutcome::Unavailable(update) => {
                update(&mut fallback);
                fallback
            }
        }
    }
}

impl std::fmt::Debug for UpdateOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UpdateOutcome::Merged(list) => f.debug_tuple("Merged").field(&list.len()).finish(),
            UpdateOutcome::Unavailable(_) => f.write_str("Unavailable"),
        }
    }
}

/// An abstract store for the conversation list.
///
/// The list is persisted as a whole under one key. Implementations never
/// fail towards the caller: unreadable or malformed data loads as an empty
/// list and write failures are logged. The one exception is an `update` that
/// cannot reach the stored list at all, which reports
/// [`UpdateOutcome::Unavailable`] instead of merging into an empty list.
///
/// # Implementation Notes
///
/// `update` is the read-merge-write primitive every mutation goes through.
/// It must re-read the stored list immediately before applying the change so
/// concurrent writers (other in-flight sends, other processes) are not
/// clobbered. The default implementation does exactly that without any
/// locking; file-backed stores override it to hold a lock across the cycle.
#[async_trait]
pub trait ConversationRepository: Send + Sync {
    /// Loads every stored conversation, in stored order.
    async fn load_all(&self) -> Vec<Conversation>;

    /// Replaces the stored list.
    async fn save_all(&self, conversations: &[Conversation]);

    /// Re-reads the stored list, applies `update` and writes the result back.
    ///
    /// # Returns
    ///
    /// The merged list, so callers can converge their in-memory copy, or the
    /// untouched update when the store could not be reached.
    async fn update(&self, update: ConversationUpdate) -> UpdateOutcome {
        let mut conversations = self.load_all().await;
        update(&mut conversations);
        self.save_all(&conversations).await;
        UpdateOutcome::Merged(conversations)
    }
}
