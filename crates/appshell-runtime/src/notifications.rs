//! Posted user notifications. Session invalidation cancels all of them.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

pub trait Notifier: Send + Sync {
    fn cancel_all(&self);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub id: u32,
    pub title: String,
}

#[derive(Debug, Default)]
pub struct NotificationCenter {
    posted: Mutex<Vec<Notification>>,
    next_id: AtomicU32,
}

impl NotificationCenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn post(&self, title: impl Into<String>) -> u32 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let title = title.into();
        tracing::debug!(id, %title, "notification posted");
        self.lock().push(Notification { id, title });
        id
    }

    pub fn cancel(&self, id: u32) -> bool {
        let mut posted = self.lock();
        let before = posted.len();
        posted.retain(|n| n.id != id);
        posted.len() != before
    }

    pub fn active(&self) -> Vec<Notification> {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Notification>> {
        self.posted.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Notifier for NotificationCenter {
    fn cancel_all(&self) {
        let mut posted = self.lock();
        if !posted.is_empty() {
            tracing::info!(count = posted.len(), "cancelling all notifications");
        }
        posted.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn post_and_cancel() {
        let center = NotificationCenter::new();
        let first = center.post("order shipped");
        let second = center.post("new message");
        assert_ne!(first, second);
        assert!(center.cancel(first));
        assert!(!center.cancel(first));
        assert_eq!(center.active().len(), 1);
    }

    #[test]
    fn cancel_all_clears_everything() {
        let center = NotificationCenter::new();
        center.post("a");
        center.post("b");
        center.cancel_all();
        assert!(center.active().is_empty());
        // No-op when empty.
        center.cancel_all();
    }
}
