//! # Notifications
//!
//! Transient messages for the operator ("Café adicionado", "Pagamento
//! insuficiente"). The session pushes them, the UI drains and shows them
//! as toasts. Oldest entries are dropped once the queue is full.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Queue capacity before the oldest notification is dropped.
pub const MAX_PENDING_NOTIFICATIONS: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum NotificationLevel {
    Success,
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    pub level: NotificationLevel,
    pub message: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct NotificationQueue {
    pending: VecDeque<Notification>,
}

impl NotificationQueue {
    pub fn new() -> Self {
        NotificationQueue::default()
    }

    pub fn push(&mut self, level: NotificationLevel, message: impl Into<String>) {
        if self.pending.len() == MAX_PENDING_NOTIFICATIONS {
            self.pending.pop_front();
        }
        self.pending.push_back(Notification {
            id: Uuid::new_v4().to_string(),
            level,
            message: message.into(),
            created_at: Utc::now(),
        });
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.push(NotificationLevel::Success, message);
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.push(NotificationLevel::Info, message);
    }

    pub fn warning(&mut self, message: impl Into<String>) {
        self.push(NotificationLevel::Warning, message);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(NotificationLevel::Error, message);
    }

    /// Takes every pending notification, oldest first.
    pub fn drain(&mut self) -> Vec<Notification> {
        self.pending.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_in_order() {
        let mut queue = NotificationQueue::new();
        queue.success("added");
        queue.error("failed");

        let drained = queue.drain();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].level, NotificationLevel::Success);
        assert_eq!(drained[1].message, "failed");
        assert!(queue.is_empty());
    }

    #[test]
    fn test_oldest_dropped_when_full() {
        let mut queue = NotificationQueue::new();
        for i in 0..MAX_PENDING_NOTIFICATIONS + 3 {
            queue.info(format!("n{}", i));
        }

        assert_eq!(queue.len(), MAX_PENDING_NOTIFICATIONS);
        assert_eq!(queue.drain()[0].message, "n3");
    }
}
