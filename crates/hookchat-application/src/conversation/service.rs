use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::{Mutex, RwLock, mpsc};
use tokio::task::JoinHandle;

use hookchat_core::Locale;
use hookchat_core::conversation::{
    Conversation, ConversationRepository, ConversationUpdate, Message, UpdateOutcome,
    export_transcript, sidebar_order, transcript_file_name,
};
use hookchat_core::error::{ChatError, Result};
use hookchat_core::gateway::{ChatGateway, GatewayError, TitleGenerator};
use hookchat_core::state::StateRepository;

use super::events::ChatEvent;

/// A rendered transcript and the file name suggested for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transcript {
    pub file_name: String,
    pub content: String,
}

#[derive(Debug, Default)]
struct ViewState {
    conversations: Vec<Conversation>,
    active_id: Option<String>,
    /// In-flight sends per conversation id.
    pending: HashMap<String, usize>,
}

/// Owns the in-memory conversation list, the active pointer and the set of
/// conversations with in-flight sends.
///
/// Every mutation is a read-merge-write through
/// [`ConversationRepository::update`]; the merged list then replaces the
/// in-memory copy, so the store and memory converge after each change.
///
/// Cloning is cheap and clones share state; spawned send tasks hold a clone.
#[derive(Clone)]
pub struct ConversationService {
    repository: Arc<dyn ConversationRepository>,
    state_repository: Arc<dyn StateRepository>,
    gateway: Arc<dyn ChatGateway>,
    title_generator: Arc<dyn TitleGenerator>,
    view: Arc<RwLock<ViewState>>,
    /// Serialises store writes with the view replacement that follows them.
    mutation_lock: Arc<Mutex<()>>,
    locale: Arc<RwLock<Locale>>,
    events: Option<mpsc::UnboundedSender<ChatEvent>>,
}

impl ConversationService {
    pub fn new(
        repository: Arc<dyn ConversationRepository>,
        state_repository: Arc<dyn StateRepository>,
        gateway: Arc<dyn ChatGateway>,
        title_generator: Arc<dyn TitleGenerator>,
        locale: Locale,
    ) -> Self {
        Self {
            repository,
            state_repository,
            gateway,
            title_generator,
            view: Arc::new(RwLock::new(ViewState::default())),
            mutation_lock: Arc::new(Mutex::new(())),
            locale: Arc::new(RwLock::new(locale)),
            events: None,
        }
    }

    /// Routes [`ChatEvent`]s to `sender`.
    pub fn with_events(mut self, sender: mpsc::UnboundedSender<ChatEvent>) -> Self {
        self.events = Some(sender);
        self
    }

    /// Loads the stored list and active pointer into memory.
    ///
    /// A stored active id that no longer exists is replaced by the most
    /// recent non-archived conversation.
    pub async fn load(&self) {
        let conversations = self.repository.load_all().await;
        let stored_active = self.state_repository.get_active_conversation().await;

        let active_id = match stored_active {
            Some(id) if conversations.iter().any(|c| c.id == id) => Some(id),
            stale => {
                let replacement = most_recent_visible(&conversations);
                if replacement != stale {
                    self.state_repository
                        .set_active_conversation(replacement.clone())
                        .await;
                }
                replacement
            }
        };

        tracing::info!(
            conversations = conversations.len(),
            active = ?active_id,
            "[ConversationService] Loaded conversations"
        );

        {
            let mut view = self.view.write().await;
            view.conversations = conversations;
            view.active_id = active_id.clone();
        }
        self.emit(ChatEvent::ConversationsChanged);
        self.emit(ChatEvent::ActiveChanged(active_id));
    }

    // ---------------------------------------------------------------------
    // Reads
    // ---------------------------------------------------------------------

    /// All conversations in stored order.
    pub async fn conversations(&self) -> Vec<Conversation> {
        self.view.read().await.conversations.clone()
    }

    pub async fn conversation(&self, id: &str) -> Option<Conversation> {
        self.view
            .read()
            .await
            .conversations
            .iter()
            .find(|c| c.id == id)
            .cloned()
    }

    pub async fn active_id(&self) -> Option<String> {
        self.view.read().await.active_id.clone()
    }

    pub async fn active_conversation(&self) -> Option<Conversation> {
        let view = self.view.read().await;
        let id = view.active_id.as_deref()?;
        view.conversations.iter().find(|c| c.id == id).cloned()
    }

    /// Whether the *active* conversation is waiting for a reply.
    pub async fn is_loading(&self) -> bool {
        let view = self.view.read().await;
        view.active_id
            .as_ref()
            .is_some_and(|id| view.pending.get(id).is_some_and(|n| *n > 0))
    }

    pub async fn is_pending(&self, id: &str) -> bool {
        self.view.read().await.pending.get(id).is_some_and(|n| *n > 0)
    }

    /// Conversations for the sidebar: pinned first, then most recently touched.
    pub async fn sidebar(&self, include_archived: bool) -> Vec<Conversation> {
        let mut list: Vec<Conversation> = self
            .view
            .read()
            .await
            .conversations
            .iter()
            .filter(|c| include_archived || !c.archived)
            .cloned()
            .collect();
        sidebar_order(&mut list);
        list
    }

    /// Sidebar entries whose title or messages contain `query`.
    pub async fn search(&self, query: &str, include_archived: bool) -> Vec<Conversation> {
        self.sidebar(include_archived)
            .await
            .into_iter()
            .filter(|c| c.matches(query))
            .collect()
    }

    pub async fn locale(&self) -> Locale {
        *self.locale.read().await
    }

    /// Changes the language used for new conversations and error messages.
    pub async fn set_locale(&self, locale: Locale) {
        *self.locale.write().await = locale;
    }

    pub async fn export_transcript(&self, id: &str) -> Result<Transcript> {
        let conversation = self
            .conversation(id)
            .await
            .ok_or_else(|| ChatError::not_found("Conversation", id))?;
        let locale = self.locale().await;
        Ok(Transcript {
            file_name: transcript_file_name(&conversation),
            content: export_transcript(&conversation, locale),
        })
    }

    // ---------------------------------------------------------------------
    // Sending
    // ---------------------------------------------------------------------

    /// Sends `text` on behalf of the conversation `conversation_id`.
    ///
    /// The user message is stored immediately. The webhook call runs on a
    /// spawned task whose handle resolves to the assistant message appended
    /// to that same conversation, whatever is active by then. A failed call
    /// appends a localized error message instead. If the conversation was
    /// deleted in the meantime it is re-created from its state at send time.
    ///
    /// # Errors
    ///
    /// - `InvalidInput` when `text` is blank
    /// - `NotFound` when the conversation is unknown
    pub async fn send(
        &self,
        conversation_id: &str,
        session_id: &str,
        text: &str,
    ) -> Result<JoinHandle<Message>> {
        let text = text.trim().to_string();
        if text.is_empty() {
            return Err(ChatError::invalid_input("message is empty"));
        }

        let known = self.conversation(conversation_id).await;
        let user_message = Message::user(text.clone());
        let user_message_id = user_message.id.clone();

        let target = conversation_id.to_string();
        let merged = self
            .apply(Box::new(move |list| {
                if !list.iter().any(|c| c.id == target) {
                    // Only in memory (e.g. the last write failed); store it now.
                    match known {
                        Some(conversation) => list.insert(0, conversation),
                        None => return,
                    }
                }
                if let Some(conversation) = list.iter_mut().find(|c| c.id == target) {
                    conversation.messages.push(user_message);
                    conversation.touch();
                }
            }))
            .await;

        let snapshot = merged
            .into_iter()
            .find(|c| c.id == conversation_id)
            .ok_or_else(|| ChatError::not_found("Conversation", conversation_id))?;

        let position = snapshot
            .messages
            .iter()
            .rposition(|m| m.id == user_message_id)
            .unwrap_or_default();
        let first_exchange =
            matches!(&snapshot.messages[..position], [only] if !only.is_user());

        tracing::debug!(
            conversation_id,
            session_id,
            first_exchange,
            "[ConversationService] Staged user message"
        );

        self.mark_pending(conversation_id, true).await;

        let service = self.clone();
        let conversation_id = conversation_id.to_string();
        let session_id = session_id.to_string();
        Ok(tokio::spawn(async move {
            service
                .complete_send(conversation_id, session_id, text, snapshot, first_exchange)
                .await
        }))
    }

    /// Sends to the active conversation, starting a new one when none is active.
    pub async fn send_to_active(&self, text: &str) -> Result<JoinHandle<Message>> {
        if text.trim().is_empty() {
            return Err(ChatError::invalid_input("message is empty"));
        }
        let conversation = match self.active_conversation().await {
            Some(conversation) => conversation,
            None => self.new_conversation().await,
        };
        self.send(&conversation.id, &conversation.session_id, text)
            .await
    }

    async fn complete_send(
        self,
        conversation_id: String,
        session_id: String,
        text: String,
        snapshot: Conversation,
        first_exchange: bool,
    ) -> Message {
        let result = self
            .gateway
            .send_message(&session_id, &text)
            .await
            .and_then(|reply| {
                if reply.trim().is_empty() {
                    Err(GatewayError::Malformed("empty reply".to_string()))
                } else {
                    Ok(reply)
                }
            });

        let locale = self.locale().await;
        let (reply, failed) = match result {
            Ok(reply) => (Message::assistant(reply), false),
            Err(e) => {
                tracing::warn!(
                    conversation_id = %conversation_id,
                    error = %e,
                    "[ConversationService] Send failed"
                );
                let notice = locale.strings().failure_message(e.category());
                (Message::assistant(notice), true)
            }
        };

        let target = conversation_id.clone();
        let appended = reply.clone();
        let merged = self
            .apply(Box::new(move |list| {
                match list.iter_mut().find(|c| c.id == target) {
                    Some(conversation) => {
                        conversation.messages.push(appended);
                        conversation.touch();
                    }
                    None => {
                        tracing::info!(
                            conversation_id = %target,
                            "[ConversationService] Conversation vanished while pending, restoring it"
                        );
                        let mut restored = snapshot;
                        restored.messages.push(appended);
                        restored.touch();
                        list.insert(0, restored);
                    }
                }
            }))
            .await;

        self.mark_pending(&conversation_id, false).await;
        self.emit(ChatEvent::ReplyReceived {
            conversation_id: conversation_id.clone(),
            message: reply.clone(),
            failed,
        });

        if first_exchange && !failed {
            if let Some(conversation) = merged.into_iter().find(|c| c.id == conversation_id) {
                self.spawn_title_generation(conversation, locale);
            }
        }

        reply
    }

    fn spawn_title_generation(&self, conversation: Conversation, locale: Locale) {
        let service = self.clone();
        tokio::spawn(async move {
            let title = service
                .title_generator
                .generate_title(&conversation.messages, locale)
                .await;
            let title = title.trim().to_string();
            if title.is_empty() {
                return;
            }

            let patched = title.clone();
            let result = service
                .update_conversation(&conversation.id, false, move |c| c.title = patched)
                .await;
            match result {
                Ok(_) => service.emit(ChatEvent::TitleUpdated {
                    conversation_id: conversation.id,
                    title,
                }),
                Err(e) => tracing::debug!(
                    conversation_id = %conversation.id,
                    error = %e,
                    "[ConversationService] Skipping title update"
                ),
            }
        });
    }

    async fn mark_pending(&self, conversation_id: &str, pending: bool) {
        let still_pending = {
            let mut view = self.view.write().await;
            let count = view.pending.entry(conversation_id.to_string()).or_default();
            if pending {
                *count += 1;
            } else {
                *count = count.saturating_sub(1);
            }
            let still_pending = *count > 0;
            if !still_pending {
                view.pending.remove(conversation_id);
            }
            still_pending
        };
        self.emit(ChatEvent::PendingChanged {
            conversation_id: conversation_id.to_string(),
            pending: still_pending,
        });
    }

    // ---------------------------------------------------------------------
    // Conversation management
    // ---------------------------------------------------------------------

    /// Creates a seeded conversation, stores it first in the list and makes
    /// it active.
    pub async fn new_conversation(&self) -> Conversation {
        let conversation = Conversation::seeded(self.locale().await);
        let inserted = conversation.clone();
        self.apply(Box::new(move |list| list.insert(0, inserted)))
            .await;
        self.set_active(Some(conversation.id.clone())).await;
        tracing::debug!(id = %conversation.id, "[ConversationService] Created conversation");
        conversation
    }

    pub async fn select(&self, id: &str) -> Result<()> {
        if self.conversation(id).await.is_none() {
            return Err(ChatError::not_found("Conversation", id));
        }
        self.set_active(Some(id.to_string())).await;
        Ok(())
    }

    pub async fn rename(&self, id: &str, title: &str) -> Result<()> {
        let title = title.trim().to_string();
        if title.is_empty() {
            return Err(ChatError::invalid_input("title is empty"));
        }
        self.update_conversation(id, false, move |c| c.title = title)
            .await?;
        Ok(())
    }

    /// Flips the pin flag and returns the new value.
    pub async fn toggle_pin(&self, id: &str) -> Result<bool> {
        let conversation = self
            .update_conversation(id, false, |c| c.pinned = !c.pinned)
            .await?;
        Ok(conversation.pinned)
    }

    /// Archives or restores a conversation. Archiving the active one moves
    /// the active pointer to the most recent visible conversation.
    pub async fn set_archived(&self, id: &str, archived: bool) -> Result<()> {
        self.update_conversation(id, false, move |c| c.archived = archived)
            .await?;
        if archived && self.active_id().await.as_deref() == Some(id) {
            let next = most_recent_visible(&self.conversations().await);
            self.set_active(next).await;
        }
        Ok(())
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        if self.conversation(id).await.is_none() {
            return Err(ChatError::not_found("Conversation", id));
        }
        self.delete_many(&[id.to_string()]).await;
        Ok(())
    }

    /// Removes exactly the given ids and returns how many existed.
    ///
    /// Pending sends for removed conversations still complete and restore
    /// their conversation.
    pub async fn delete_many(&self, ids: &[String]) -> usize {
        let doomed: HashSet<String> = ids.iter().cloned().collect();

        let removed = Arc::new(AtomicUsize::new(0));
        let counter = removed.clone();
        let removed_ids = doomed.clone();
        let merged = self
            .apply(Box::new(move |list| {
                let before = list.len();
                list.retain(|c| !removed_ids.contains(&c.id));
                counter.store(before - list.len(), Ordering::SeqCst);
            }))
            .await;
        let existing = removed.load(Ordering::SeqCst);

        let active = self.active_id().await;
        if active.as_ref().is_some_and(|id| doomed.contains(id)) {
            self.set_active(most_recent_visible(&merged)).await;
        }

        tracing::info!(requested = doomed.len(), removed = existing, "[ConversationService] Deleted conversations");
        existing
    }

    pub async fn clear_all(&self) {
        self.apply(Box::new(|list| list.clear())).await;
        self.set_active(None).await;
        tracing::info!("[ConversationService] Cleared all conversations");
    }

    pub async fn edit_message(
        &self,
        conversation_id: &str,
        message_id: &str,
        content: &str,
    ) -> Result<()> {
        let content = content.trim().to_string();
        if content.is_empty() {
            return Err(ChatError::invalid_input("message is empty"));
        }
        self.ensure_message(conversation_id, message_id).await?;

        let message_id = message_id.to_string();
        self.update_conversation(conversation_id, true, move |c| {
            if let Some(index) = c.message_index(&message_id) {
                c.messages[index].content = content;
            }
        })
        .await?;
        Ok(())
    }

    pub async fn delete_message(&self, conversation_id: &str, message_id: &str) -> Result<()> {
        self.ensure_message(conversation_id, message_id).await?;

        let message_id = message_id.to_string();
        self.update_conversation(conversation_id, true, move |c| {
            if let Some(index) = c.message_index(&message_id) {
                c.messages.remove(index);
            }
        })
        .await?;
        Ok(())
    }

    /// Replaces a seed-only active conversation with the turns the remote
    /// workflow remembers for its session.
    ///
    /// Returns whether anything was restored. Failures are logged and leave
    /// local state untouched.
    pub async fn hydrate_active(&self) -> bool {
        let Some(active) = self.active_conversation().await else {
            return false;
        };
        if !active.has_only_seed() {
            return false;
        }

        let history = match self.gateway.load_previous_session(&active.session_id).await {
            Ok(history) if !history.is_empty() => history,
            Ok(_) => return false,
            Err(e) => {
                tracing::warn!(
                    conversation_id = %active.id,
                    error = %e,
                    "[ConversationService] Could not load previous session"
                );
                return false;
            }
        };

        let count = history.len();
        let target = active.id.clone();
        let merged = self
            .apply(Box::new(move |list| {
                if let Some(conversation) = list.iter_mut().find(|c| c.id == target) {
                    if conversation.has_only_seed() {
                        conversation.messages = history;
                    }
                }
            }))
            .await;

        let restored = merged
            .iter()
            .any(|c| c.id == active.id && !c.has_only_seed());
        if restored {
            tracing::info!(conversation_id = %active.id, messages = count, "[ConversationService] Restored previous session");
        }
        restored
    }

    // ---------------------------------------------------------------------
    // Internals
    // ---------------------------------------------------------------------

    /// Read-merge-write against the store, then adopt the merged list.
    ///
    /// If the store cannot be reached the update runs against the in-memory
    /// list instead, so the session keeps working unpersisted.
    async fn apply(&self, update: ConversationUpdate) -> Vec<Conversation> {
        let _guard = self.mutation_lock.lock().await;
        let merged = match self.repository.update(update).await {
            UpdateOutcome::Merged(merged) => merged,
            unavailable => {
                tracing::warn!("[ConversationService] Store unavailable, keeping changes in memory");
                let current = self.view.read().await.conversations.clone();
                unavailable.merged_or_apply(current)
            }
        };
        self.view.write().await.conversations = merged.clone();
        self.emit(ChatEvent::ConversationsChanged);
        merged
    }

    /// Applies `f` to one conversation.
    ///
    /// `touch` bumps the last-touched timestamp (message edits do, metadata
    /// changes such as pinning do not).
    async fn update_conversation<F>(&self, id: &str, touch: bool, f: F) -> Result<Conversation>
    where
        F: FnOnce(&mut Conversation) + Send + 'static,
    {
        if self.conversation(id).await.is_none() {
            return Err(ChatError::not_found("Conversation", id));
        }

        let target = id.to_string();
        let merged = self
            .apply(Box::new(move |list| {
                if let Some(conversation) = list.iter_mut().find(|c| c.id == target) {
                    f(conversation);
                    if touch {
                        conversation.touch();
                    }
                }
            }))
            .await;

        merged
            .into_iter()
            .find(|c| c.id == id)
            .ok_or_else(|| ChatError::not_found("Conversation", id))
    }

    async fn ensure_message(&self, conversation_id: &str, message_id: &str) -> Result<()> {
        let conversation = self
            .conversation(conversation_id)
            .await
            .ok_or_else(|| ChatError::not_found("Conversation", conversation_id))?;
        if conversation.message_index(message_id).is_none() {
            return Err(ChatError::not_found("Message", message_id));
        }
        Ok(())
    }

    async fn set_active(&self, id: Option<String>) {
        self.view.write().await.active_id = id.clone();
        self.state_repository.set_active_conversation(id.clone()).await;
        self.emit(ChatEvent::ActiveChanged(id));
    }

    fn emit(&self, event: ChatEvent) {
        if let Some(sender) = &self.events {
            // A dropped receiver only means nobody is listening any more.
            let _ = sender.send(event);
        }
    }
}

/// Most recently touched conversation that is not archived.
fn most_recent_visible(conversations: &[Conversation]) -> Option<String> {
    conversations
        .iter()
        .filter(|c| !c.archived)
        .max_by_key(|c| c.timestamp)
        .map(|c| c.id.clone())
}

#[cfg(test)]
#[path = "service_test.rs"]
mod tests;
