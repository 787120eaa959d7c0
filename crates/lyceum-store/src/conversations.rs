//! Grouping of flat message lists into per-counterpart conversations.
//!
//! Everything here is a pure function of its input: the same message list
//! always produces the same groups in the same order.

use std::collections::{BTreeMap, HashSet};

use chrono::NaiveDateTime;
use serde::Serialize;

use lyceum_shared::protocol::Message;
use lyceum_shared::types::UserId;

/// All messages exchanged with one counterpart, oldest first.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Conversation {
    pub counterpart_id: UserId,
    /// Most recent non-empty name seen for the counterpart. Empty when the
    /// server never supplied one.
    pub counterpart_username: String,
    pub messages: Vec<Message>,
}

impl Conversation {
    /// Timestamp of the newest message.
    pub fn last_activity(&self) -> Option<NaiveDateTime> {
        self.messages.last().map(|m| m.timestamp)
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// The other party of `message` as seen from `me`: the sender of inbound
/// messages, the receiver of outbound ones.
pub fn counterpart_of(me: UserId, message: &Message) -> UserId {
    if message.sender_id == me {
        message.receiver_id
    } else {
        message.sender_id
    }
}

fn counterpart_name(me: UserId, message: &Message) -> Option<&str> {
    let name = if message.sender_id == me {
        message.receiver_username.as_deref().unwrap_or_default()
    } else {
        message.sender_username.as_str()
    };
    Some(name.trim()).filter(|n| !n.is_empty())
}

/// Group `messages` by counterpart relative to `me`.
///
/// Duplicate message ids keep their first occurrence. Messages inside a
/// group are ordered by `(timestamp, id)`; groups are ordered by most recent
/// activity, ties broken by ascending counterpart id.
pub fn group_conversations(me: UserId, messages: &[Message]) -> Vec<Conversation> {
    let mut seen = HashSet::new();
    let mut groups: BTreeMap<UserId, Vec<Message>> = BTreeMap::new();

    for message in messages {
        if !seen.insert(message.id) {
            continue;
        }
        groups
            .entry(counterpart_of(me, message))
            .or_default()
            .push(message.clone());
    }

    let mut conversations: Vec<Conversation> = groups
        .into_iter()
        .map(|(counterpart_id, mut msgs)| {
            msgs.sort_by_key(|m| (m.timestamp, m.id));
            let counterpart_username = msgs
                .iter()
                .rev()
                .find_map(|m| counterpart_name(me, m))
                .unwrap_or_default()
                .to_string();
            Conversation {
                counterpart_id,
                counterpart_username,
                messages: msgs,
            }
        })
        .collect();

    conversations.sort_by(|a, b| {
        b.last_activity()
            .cmp(&a.last_activity())
            .then(a.counterpart_id.cmp(&b.counterpart_id))
    });
    conversations
}

/// Merge both directions of a two-party exchange into one conversation.
///
/// `outgoing` holds messages `me -> counterpart`, `incoming` the reverse.
/// Messages belonging to neither direction are ignored.
pub fn merge_thread(
    me: UserId,
    counterpart: UserId,
    outgoing: &[Message],
    incoming: &[Message],
) -> Conversation {
    let relevant: Vec<Message> = outgoing
        .iter()
        .chain(incoming)
        .filter(|m| {
            (m.sender_id == me && m.receiver_id == counterpart)
                || (m.sender_id == counterpart && m.receiver_id == me)
        })
        .cloned()
        .collect();

    group_conversations(me, &relevant)
        .into_iter()
        .find(|c| c.counterpart_id == counterpart)
        .unwrap_or(Conversation {
            counterpart_id: counterpart,
            counterpart_username: String::new(),
            messages: Vec::new(),
        })
}
