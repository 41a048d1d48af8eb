//! File-backed `ConversationRepository`.
//!
//! The whole conversation list lives under one key of the [`LocalStore`] as a
//! JSON array. Reads are lenient (see [`parse_conversations`]) and writes are
//! atomic; `update` serialises read-merge-write cycles with an async mutex
//! inside the process and an exclusive file lock across processes.

use std::collections::HashSet;
use std::sync::{Arc, Mutex as StdMutex};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;

use hookchat_core::conversation::{
    Conversation, ConversationRepository, ConversationUpdate, UpdateOutcome,
};

use crate::storage::LocalStore;

pub struct JsonConversationRepository {
    store: LocalStore,
    key: String,
    write_lock: Arc<Mutex<()>>,
}

impl JsonConversationRepository {
    pub fn new(store: LocalStore, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
            write_lock: Arc::new(Mutex::new(())),
        }
    }
}

/// Turns a stored value into a conversation list.
///
/// Anything but an array yields an empty list. Elements that fail to parse
/// are skipped, and only the first occurrence of a duplicated id is kept.
pub fn parse_conversations(value: Value) -> Vec<Conversation> {
    let Value::Array(items) = value else {
        if !value.is_null() {
            tracing::warn!("[ConversationRepository] Stored conversations are not an array, ignoring");
        }
        return Vec::new();
    };

    let mut seen = HashSet::new();
    let mut conversations = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        match serde_json::from_value::<Conversation>(item) {
            Ok(conversation) => {
                if seen.insert(conversation.id.clone()) {
                    conversations.push(conversation);
                } else {
                    tracing::warn!(
                        id = %conversation.id,
                        "[ConversationRepository] Dropping duplicate conversation id"
                    );
                }
            }
            Err(e) => {
                tracing::warn!(index, error = %e, "[ConversationRepository] Skipping malformed conversation");
            }
        }
    }
    conversations
}

#[async_trait]
impl ConversationRepository for JsonConversationRepository {
    async fn load_all(&self) -> Vec<Conversation> {
        let store = self.store.clone();
        let key = self.key.clone();
        match tokio::task::spawn_blocking(move || store.get(&key)).await {
            Ok(Some(value)) => parse_conversations(value),
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!(error = %e, "[ConversationRepository] Load task failed");
                Vec::new()
            }
        }
    }

    async fn save_all(&self, conversations: &[Conversation]) {
        let value = match serde_json::to_value(conversations) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(error = %e, "[ConversationRepository] Failed to serialize conversations");
                return;
            }
        };

        let _guard = self.write_lock.lock().await;
        let store = self.store.clone();
        let key = self.key.clone();
        if let Err(e) = tokio::task::spawn_blocking(move || store.set(&key, &value)).await {
            tracing::warn!(error = %e, "[ConversationRepository] Save task failed");
        }
    }

    async fn update(&self, update: ConversationUpdate) -> UpdateOutcome {
        let _guard = self.write_lock.lock().await;
        let store = self.store.clone();
        let key = self.key.clone();

        // Handed back untouched when the store cannot be reached.
        let pending = Arc::new(StdMutex::new(Some(update)));
        let slot = pending.clone();

        let joined = tokio::task::spawn_blocking(move || {
            let mut merged = None;
            let result = store.update(&key, Value::Array(Vec::new()), |value| {
                let mut conversations = parse_conversations(std::mem::take(value));
                if let Some(update) = slot.lock().ok().and_then(|mut slot| slot.take()) {
                    update(&mut conversations);
                }
                merged = Some(conversations.clone());
                *value = serde_json::to_value(&conversations)?;
                Ok(())
            });
            (merged, result)
        })
        .await;

        let failure = match joined {
            Ok((Some(merged), Ok(_))) => return UpdateOutcome::Merged(merged),
            Ok((Some(merged), Err(e))) => {
                tracing::warn!(error = %e, "[ConversationRepository] Failed to write merged conversations");
                return UpdateOutcome::Merged(merged);
            }
            Ok((None, Err(e))) => e.to_string(),
            Ok((None, Ok(_))) => "update did not run".to_string(),
            Err(e) => e.to_string(),
        };
        tracing::warn!(error = %failure, "[ConversationRepository] Store unavailable, update not applied");

        let update = pending.lock().ok().and_then(|mut slot| slot.take());
        UpdateOutcome::Unavailable(update.unwrap_or_else(|| Box::new(|_: &mut Vec<Conversation>| {})))
    }
}
