//! Self-expiring notifications.

use chrono::{DateTime, Utc};

use hookchat_core::toast::{Toast, ToastKind};

/// Holds the toasts currently on screen.
///
/// Expiry is evaluated against the `now` the caller passes in, so the
/// presentation layer decides when to redraw.
#[derive(Debug, Default)]
pub struct ToastQueue {
    next_id: u64,
    toasts: Vec<Toast>,
}

impl ToastQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a toast created now and returns its id.
    pub fn push(&mut self, message: impl Into<String>, kind: ToastKind) -> u64 {
        self.push_at(message, kind, Utc::now())
    }

    pub fn push_at(&mut self, message: impl Into<String>, kind: ToastKind, now: DateTime<Utc>) -> u64 {
        self.next_id += 1;
        self.toasts.push(Toast {
            id: self.next_id,
            message: message.into(),
            kind,
            created_at: now,
        });
        self.next_id
    }

    /// Toasts that have not expired at `now`, oldest first.
    pub fn active(&self, now: DateTime<Utc>) -> Vec<&Toast> {
        self.toasts.iter().filter(|t| !t.is_expired(now)).collect()
    }

    pub fn dismiss(&mut self, id: u64) -> bool {
        let before = self.toasts.len();
        self.toasts.retain(|t| t.id != id);
        self.toasts.len() != before
    }

    /// Drops expired toasts and returns them.
    pub fn prune(&mut self, now: DateTime<Utc>) -> Vec<Toast> {
        let (expired, alive): (Vec<Toast>, Vec<Toast>) = std::mem::take(&mut self.toasts)
            .into_iter()
            .partition(|t| t.is_expired(now));
        self.toasts = alive;
        expired
    }

    /// Removes and returns every toast still alive at `now`.
    pub fn drain_active(&mut self, now: DateTime<Utc>) -> Vec<Toast> {
        self.prune(now);
        std::mem::take(&mut self.toasts)
    }

    pub fn is_empty(&self) -> bool {
        self.toasts.is_empty()
    }
}
