//! The in-memory Conversation Store.
//!
//! The store holds exactly one snapshot: the conversations and
//! notifications of the most recent successful refresh. Snapshots replace
//! each other wholesale, nothing is merged.

use serde::Serialize;
use tracing::debug;

use lyceum_shared::protocol::{Message, Notification};
use lyceum_shared::types::UserId;

use crate::conversations::{group_conversations, Conversation};
use crate::notifications::NotificationList;

/// Raw data of one refresh, before grouping.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub inbox: Vec<Message>,
    pub notifications: Vec<Notification>,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct ConversationStore {
    owner: Option<UserId>,
    conversations: Vec<Conversation>,
    notifications: NotificationList,
    /// Ticket of the snapshot currently held; 0 before the first refresh.
    #[serde(skip)]
    applied_ticket: u64,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the contents with `snapshot` unless a snapshot with a newer
    /// ticket has already been applied. Returns whether it was applied.
    pub fn replace_if_newer(&mut self, ticket: u64, me: UserId, snapshot: Snapshot) -> bool {
        if ticket <= self.applied_ticket {
            debug!(
                ticket,
                applied = self.applied_ticket,
                "Discarding stale snapshot"
            );
            return false;
        }

        self.owner = Some(me);
        self.conversations = group_conversations(me, &snapshot.inbox);
        self.notifications = NotificationList::new(snapshot.notifications);
        self.applied_ticket = ticket;
        true
    }

    /// User the current snapshot belongs to; `None` until the first refresh.
    pub fn owner(&self) -> Option<UserId> {
        self.owner
    }

    pub fn conversations(&self) -> &[Conversation] {
        &self.conversations
    }

    pub fn conversation_with(&self, counterpart: UserId) -> Option<&Conversation> {
        self.conversations
            .iter()
            .find(|c| c.counterpart_id == counterpart)
    }

    pub fn notifications(&self) -> &NotificationList {
        &self.notifications
    }

    pub fn applied_ticket(&self) -> u64 {
        self.applied_ticket
    }

    pub fn is_loaded(&self) -> bool {
        self.applied_ticket > 0
    }
}
