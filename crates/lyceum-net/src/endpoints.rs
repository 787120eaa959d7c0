//! Path builders for the classroom server's messaging endpoints.
//!
//! Paths are relative to the configured base URL. Free-text segments
//! (usernames) are percent-encoded.

use lyceum_shared::types::{ClassroomId, MessageId, NotificationId, Role, RoleId, UserId};

pub const SEND_MESSAGE: &str = "/messages/send";
pub const DELETE_NOTIFICATION: &str = "/notifications/delete";

pub fn current_principal(role: Role) -> String {
    format!("/messages/current/{}", role.as_path_segment())
}

pub fn user_id_for_role(role_id: RoleId) -> String {
    format!("/messages/{role_id}/userId")
}

pub fn username_for(user_id: UserId) -> String {
    format!("/messages/get-user-name/{user_id}")
}

pub fn user_id_for_username(username: &str) -> String {
    format!("/messages/user/{}", urlencoding::encode(username))
}

pub fn teacher_classrooms(teacher: RoleId) -> String {
    format!("/classrooms/classrooms/{teacher}")
}

pub fn classroom_students(classroom: ClassroomId) -> String {
    format!("/messages/classroom/{classroom}")
}

pub fn message(id: MessageId) -> String {
    format!("/messages/message/{id}")
}

pub fn inbox(receiver: UserId) -> String {
    format!("/messages/receiver/{receiver}")
}

pub fn outbox(sender: UserId) -> String {
    format!("/messages/sender/{sender}")
}

pub fn thread(sender: UserId, receiver: UserId) -> String {
    format!("/messages/sender/{sender}/receiver/{receiver}")
}

pub fn notifications(receiver: UserId) -> String {
    format!("/notifications/receiver/{receiver}")
}

pub fn mark_read(id: NotificationId) -> String {
    format!("/notifications/read/{id}")
}

pub fn mark_unread(id: NotificationId) -> String {
    format!("/notifications/unread/{id}")
}

pub fn mark_all_read(receiver: UserId) -> String {
    format!("/notifications/read/all/{receiver}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_paths() {
        assert_eq!(current_principal(Role::Student), "/messages/current/student");
        assert_eq!(current_principal(Role::Teacher), "/messages/current/teacher");
        assert_eq!(user_id_for_role(RoleId(12)), "/messages/12/userId");
        assert_eq!(username_for(UserId(42)), "/messages/get-user-name/42");
    }

    #[test]
    fn test_classroom_paths() {
        assert_eq!(teacher_classrooms(RoleId(12)), "/classrooms/classrooms/12");
        assert_eq!(classroom_students(ClassroomId(4)), "/messages/classroom/4");
    }

    #[test]
    fn test_message_paths() {
        assert_eq!(message(MessageId(9)), "/messages/message/9");
        assert_eq!(inbox(UserId(42)), "/messages/receiver/42");
        assert_eq!(outbox(UserId(42)), "/messages/sender/42");
        assert_eq!(thread(UserId(7), UserId(42)), "/messages/sender/7/receiver/42");
    }

    #[test]
    fn test_notification_paths() {
        assert_eq!(notifications(UserId(42)), "/notifications/receiver/42");
        assert_eq!(mark_read(NotificationId(5)), "/notifications/read/5");
        assert_eq!(mark_unread(NotificationId(5)), "/notifications/unread/5");
        assert_eq!(mark_all_read(UserId(42)), "/notifications/read/all/42");
    }

    #[test]
    fn test_username_is_encoded() {
        assert_eq!(user_id_for_username("anna"), "/messages/user/anna");
        assert_eq!(
            user_id_for_username("anna maria/x"),
            "/messages/user/anna%20maria%2Fx"
        );
    }
}
