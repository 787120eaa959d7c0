//! # lyceum-shared
//!
//! Types shared by every Lyceum crate: identifiers, the JSON shapes of the
//! classroom server's messaging endpoints, notification read state, and
//! the content rules applied before a message is sent.

pub mod constants;
pub mod error;
pub mod protocol;
pub mod types;

pub use error::{validate_content, ValidationError};
pub use protocol::{Classroom, Message, Notification, SendMessage, StudentRef};
pub use types::{
    ClassroomId, MessageId, NotificationId, ReadAction, ReadState, Role, RoleId, UserId,
    UserIdentity,
};
