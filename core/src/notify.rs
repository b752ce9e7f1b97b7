//! Notification list
//!
//! Session-scoped toast queue. Not persisted: notifications die with the
//! process, like the original's in-memory store.

use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct Notification {
    pub id: String,
    pub title: String,
    pub body: String,
    pub app_id: String,
    pub persistent: bool,
    pub timestamp: u64,
}

#[derive(Debug, Default)]
pub struct NotificationStore {
    items: Vec<Notification>,
    seen: usize,
}

impl NotificationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, title: &str, body: &str, app_id: &str, persistent: bool, now: u64) {
        self.items.push(Notification {
            id: Uuid::new_v4().to_string(),
            title: title.to_string(),
            body: body.to_string(),
            app_id: app_id.to_string(),
            persistent,
            timestamp: now,
        });
    }

    pub fn all(&self) -> &[Notification] {
        &self.items
    }

    /// Notifications pushed since the last drain, for the front end to show.
    pub fn drain_new(&mut self) -> Vec<Notification> {
        let fresh = self.items[self.seen..].to_vec();
        self.seen = self.items.len();
        fresh
    }

    pub fn dismiss(&mut self, id: &str) {
        self.items.retain(|item| item.id != id);
        self.seen = self.seen.min(self.items.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_returns_only_new_items() {
        let mut store = NotificationStore::new();
        store.push("a", "first", "system", false, 1);
        assert_eq!(store.drain_new().len(), 1);

        store.push("b", "second", "system", false, 2);
        store.push("c", "third", "system", false, 3);
        let fresh = store.drain_new();
        assert_eq!(fresh.len(), 2);
        assert_eq!(fresh[0].title, "b");
        assert!(store.drain_new().is_empty());
    }
}
