//! JSON shapes exchanged with the classroom server.
//!
//! Field names follow the server's camelCase DTOs. Timestamps are local
//! date-times without an offset (`2024-05-01T10:15:30`, optional fraction).

use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize};

use crate::types::{ClassroomId, MessageId, NotificationId, ReadState, RoleId, UserId};

/// A delivered message as returned by the message endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: MessageId,
    pub content: String,
    pub timestamp: NaiveDateTime,
    pub sender_id: UserId,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub sender_username: String,
    pub receiver_id: UserId,
    #[serde(default)]
    pub receiver_username: Option<String>,
}

/// A read-tracked pointer to a message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: NotificationId,
    pub message_id: MessageId,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub content: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub sender_username: String,
    pub timestamp: NaiveDateTime,
    #[serde(default)]
    pub sender_id: Option<UserId>,
    #[serde(default)]
    pub receiver_id: Option<UserId>,
    #[serde(rename = "notify", default)]
    pub read_state: ReadState,
}

/// Body of `POST /messages/send`. The server echoes the same shape back.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SendMessage {
    pub content: String,
    pub sender_id: UserId,
    pub receiver_id: UserId,
}

/// Body of id-addressed deletes (`DELETE /notifications/delete`).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct IdBody {
    pub id: i64,
}

/// `GET /messages/current/student`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CurrentStudent {
    pub id: RoleId,
    #[serde(default)]
    pub username: Option<String>,
}

/// `GET /messages/get-user-name/{id}`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UsernameLookup {
    pub id: UserId,
    pub username: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserRef {
    pub id: UserId,
}

/// `GET /messages/{roleId}/userId`
///
/// Depending on server version this is a bare number, a flat object, the
/// role entity with a nested `user`, or the teacher entity itself. The
/// entity omits `user`; its own `id` is the one the server hands out.
/// Variants are tried in order, so a nested `user.id` wins over `id`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum UserIdLookup {
    Bare(UserId),
    Nested { user: UserRef },
    #[serde(rename_all = "camelCase")]
    Flat { user_id: UserId },
    Entity { id: UserId },
}

impl UserIdLookup {
    pub fn user_id(&self) -> UserId {
        match self {
            Self::Bare(id) => *id,
            Self::Nested { user } => user.id,
            Self::Flat { user_id } => *user_id,
            Self::Entity { id } => *id,
        }
    }
}

/// `GET /classrooms/classrooms/{teacherId}`, one entry per classroom.
/// Only the id is read; the rest of the entity is ignored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Classroom {
    pub id: ClassroomId,
}

/// `GET /messages/classroom/{classroomId}`, one entry per enrolled student.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StudentRef {
    pub username: String,
    pub id: UserId,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
