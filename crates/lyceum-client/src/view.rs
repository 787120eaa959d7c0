//! Pure rendering of store state into a presentable inbox.
//!
//! [`render`] is a function of the store alone: rendering the same state
//! twice yields equal views, which is what makes refreshes idempotent from
//! the UI's point of view.

use std::fmt;

use chrono::NaiveDateTime;
use serde::Serialize;

use lyceum_shared::constants::TIMESTAMP_DISPLAY_FORMAT;
use lyceum_shared::protocol::{Message, Notification};
use lyceum_shared::types::{MessageId, NotificationId, UserId};
use lyceum_store::{Conversation, ConversationStore};

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct InboxView {
    pub conversations: Vec<ConversationView>,
    pub notifications: Vec<NotificationView>,
    /// Unread badge; `None` when hidden.
    pub badge: Option<usize>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ConversationView {
    pub counterpart_id: UserId,
    pub counterpart: String,
    pub last_activity: Option<String>,
    pub messages: Vec<MessageLine>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MessageLine {
    pub id: MessageId,
    pub from: String,
    pub content: String,
    pub timestamp: String,
    pub outbound: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NotificationView {
    pub id: NotificationId,
    pub message_id: MessageId,
    pub sender: String,
    pub content: String,
    pub timestamp: String,
    pub read: bool,
}

pub fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format(TIMESTAMP_DISPLAY_FORMAT).to_string()
}

fn display_name(name: &str, id: UserId) -> String {
    if name.trim().is_empty() {
        format!("User {id}")
    } else {
        name.to_string()
    }
}

fn render_message(me: Option<UserId>, message: &Message) -> MessageLine {
    let outbound = me == Some(message.sender_id);
    MessageLine {
        id: message.id,
        from: if outbound {
            "me".to_string()
        } else {
            display_name(&message.sender_username, message.sender_id)
        },
        content: message.content.clone(),
        timestamp: format_timestamp(&message.timestamp),
        outbound,
    }
}

pub fn render_conversation(me: Option<UserId>, conversation: &Conversation) -> ConversationView {
    ConversationView {
        counterpart_id: conversation.counterpart_id,
        counterpart: display_name(
            &conversation.counterpart_username,
            conversation.counterpart_id,
        ),
        last_activity: conversation.last_activity().as_ref().map(format_timestamp),
        messages: conversation
            .messages
            .iter()
            .map(|m| render_message(me, m))
            .collect(),
    }
}

pub fn render_notification(notification: &Notification) -> NotificationView {
    NotificationView {
        id: notification.id,
        message_id: notification.message_id,
        sender: notification.sender_username.clone(),
        content: notification.content.clone(),
        timestamp: format_timestamp(&notification.timestamp),
        read: !notification.read_state.is_unread(),
    }
}

pub fn render(store: &ConversationStore) -> InboxView {
    let me = store.owner();
    InboxView {
        conversations: store
            .conversations()
            .iter()
            .map(|c| render_conversation(me, c))
            .collect(),
        notifications: store
            .notifications()
            .iter()
            .map(render_notification)
            .collect(),
        badge: store.notifications().badge(),
    }
}

impl fmt::Display for ConversationView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "== {} (#{}) - {} message(s)",
            self.counterpart,
            self.counterpart_id,
            self.messages.len()
        )?;
        for line in &self.messages {
            let arrow = if line.outbound { "->" } else { "<-" };
            writeln!(
                f,
                "  [{}] {} {} #{}: {}",
                line.timestamp, arrow, line.from, line.id, line.content
            )?;
        }
        Ok(())
    }
}

impl fmt::Display for NotificationView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mark = if self.read { "[x]" } else { "[ ]" };
        write!(
            f,
            "{mark} #{} {} from {}: {} (message #{})",
            self.id, self.timestamp, self.sender, self.content, self.message_id
        )
    }
}

impl InboxView {
    pub fn badge_label(&self) -> String {
        match self.badge {
            Some(n) => format!("{n} unread"),
            None => "no unread notifications".to_string(),
        }
    }
}

impl fmt::Display for InboxView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Inbox ({})", self.badge_label())?;
        if self.conversations.is_empty() {
            writeln!(f, "  (no messages)")?;
        }
        for conversation in &self.conversations {
            write!(f, "{conversation}")?;
        }
        Ok(())
    }
}
