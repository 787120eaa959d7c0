//! # lyceum-store
//!
//! In-memory state of the messaging client: the current user's messages
//! grouped into conversations, plus their notifications and unread count.
//!
//! The store is plain data. Callers wrap it in whatever lock suits them and
//! replace its contents on every refresh through
//! [`ConversationStore::replace_if_newer`].

pub mod conversations;
pub mod notifications;
pub mod store;

pub use conversations::{counterpart_of, group_conversations, merge_thread, Conversation};
pub use notifications::NotificationList;
pub use store::{ConversationStore, Snapshot};
