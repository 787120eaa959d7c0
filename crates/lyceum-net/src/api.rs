//! The seam between the messaging engine and the classroom server.
//!
//! [`SchoolApi`] lists every endpoint the client consumes. [`crate::HttpApi`]
//! is the production implementation; tests drive the engine with an
//! in-memory fake.

use async_trait::async_trait;

use lyceum_shared::protocol::{
    Classroom, CurrentStudent, Message, Notification, SendMessage, StudentRef,
};
use lyceum_shared::types::{ClassroomId, MessageId, NotificationId, RoleId, UserId};

use crate::error::Result;

#[async_trait]
pub trait SchoolApi: Send + Sync {
    /// `GET /messages/current/student`
    async fn current_student(&self) -> Result<CurrentStudent>;

    /// `GET /messages/current/teacher`
    async fn current_teacher(&self) -> Result<RoleId>;

    /// `GET /messages/{teacherId}/userId`. Teacher ids only.
    async fn user_id_for_role(&self, role_id: RoleId) -> Result<UserId>;

    /// `GET /messages/get-user-name/{userId}`
    async fn username_for(&self, user_id: UserId) -> Result<String>;

    /// `GET /messages/user/{username}`
    async fn user_id_for_username(&self, username: &str) -> Result<UserId>;

    /// `GET /classrooms/classrooms/{teacherId}`
    async fn teacher_classrooms(&self, teacher: RoleId) -> Result<Vec<Classroom>>;

    /// `GET /messages/classroom/{classroomId}`
    async fn classroom_students(&self, classroom: ClassroomId) -> Result<Vec<StudentRef>>;

    /// `GET /messages/message/{id}`
    async fn message(&self, id: MessageId) -> Result<Message>;

    /// `GET /messages/receiver/{userId}`
    async fn inbox(&self, receiver: UserId) -> Result<Vec<Message>>;

    /// `GET /messages/sender/{userId}`
    async fn outbox(&self, sender: UserId) -> Result<Vec<Message>>;

    /// `GET /messages/sender/{senderId}/receiver/{receiverId}`
    async fn thread(&self, sender: UserId, receiver: UserId) -> Result<Vec<Message>>;

    /// `POST /messages/send`
    async fn send_message(&self, body: &SendMessage) -> Result<SendMessage>;

    /// `GET /notifications/receiver/{userId}`
    async fn notifications(&self, receiver: UserId) -> Result<Vec<Notification>>;

    /// `PUT /notifications/read/{id}`
    async fn mark_read(&self, id: NotificationId) -> Result<()>;

    /// `PUT /notifications/unread/{id}`
    async fn mark_unread(&self, id: NotificationId) -> Result<()>;

    /// `PUT /notifications/read/all/{receiverId}`
    async fn mark_all_read(&self, receiver: UserId) -> Result<()>;

    /// `DELETE /notifications/delete`
    async fn delete_notification(&self, id: NotificationId) -> Result<()>;
}
