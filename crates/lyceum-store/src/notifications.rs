use serde::Serialize;

use lyceum_shared::protocol::Notification;
use lyceum_shared::types::{MessageId, NotificationId};

/// The notifications of the current user, newest first.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct NotificationList {
    items: Vec<Notification>,
}

impl NotificationList {
    /// Build a list from a server response. Later duplicates of an id are
    /// dropped.
    pub fn new(mut items: Vec<Notification>) -> Self {
        let mut seen = std::collections::HashSet::new();
        items.retain(|n| seen.insert(n.id));
        items.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));
        Self { items }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Notification> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: NotificationId) -> Option<&Notification> {
        self.items.iter().find(|n| n.id == id)
    }

    /// Notifications pointing at `message`.
    pub fn for_message(&self, message: MessageId) -> impl Iterator<Item = &Notification> {
        self.items.iter().filter(move |n| n.message_id == message)
    }

    pub fn unread_count(&self) -> usize {
        self.items.iter().filter(|n| n.read_state.is_unread()).count()
    }

    /// Value for the unread badge; `None` hides it.
    pub fn badge(&self) -> Option<usize> {
        match self.unread_count() {
            0 => None,
            n => Some(n),
        }
    }
}
