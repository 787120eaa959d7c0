//! In-memory classroom server used by the unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use tokio::sync::Notify;

use lyceum_net::{ApiError, SchoolApi};
use lyceum_shared::protocol::{
    Classroom, CurrentStudent, Message, Notification, SendMessage, StudentRef,
};
use lyceum_shared::types::{ClassroomId, MessageId, NotificationId, ReadState, RoleId, UserId};

pub fn at(day: u32, hour: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 5, day)
        .unwrap()
        .and_hms_opt(hour, 0, 0)
        .unwrap()
}

pub fn msg(id: i64, from: i64, to: i64, ts: NaiveDateTime) -> Message {
    Message {
        id: MessageId(id),
        content: format!("message {id}"),
        timestamp: ts,
        sender_id: UserId(from),
        sender_username: format!("user{from}"),
        receiver_id: UserId(to),
        receiver_username: Some(format!("user{to}")),
    }
}

pub fn note(id: i64, day: u32, state: ReadState) -> Notification {
    Notification {
        id: NotificationId(id),
        message_id: MessageId(100 + id),
        content: format!("notification {id}"),
        sender_username: "maria".into(),
        timestamp: at(day, 9),
        sender_id: Some(UserId(7)),
        receiver_id: Some(UserId(42)),
        read_state: state,
    }
}

fn server_error() -> ApiError {
    ApiError::Server {
        status: 500,
        message: Some("Internal Server Error".into()),
    }
}

/// Fake server for user 42 (student role id 3, teacher role id 12 with
/// classrooms 4 and 5).
pub struct FakeSchool {
    calls: Mutex<Vec<String>>,
    pub student: Mutex<Option<CurrentStudent>>,
    pub teacher: Mutex<Option<RoleId>>,
    pub user_ids: Mutex<HashMap<RoleId, UserId>>,
    pub usernames: Mutex<HashMap<UserId, String>>,
    pub directory: Mutex<HashMap<String, UserId>>,
    pub classrooms: Mutex<HashMap<RoleId, Vec<ClassroomId>>>,
    pub classroom_students: Mutex<HashMap<ClassroomId, Vec<StudentRef>>>,
    pub messages: Mutex<Vec<Message>>,
    pub notifications: Mutex<Vec<Notification>>,
    pub sent: Mutex<Vec<SendMessage>>,
    pub fail_send: AtomicBool,
    pub fail_sync: AtomicBool,
    pub fail_mutations: AtomicBool,
    /// When set, `send_message` waits for a notification before answering.
    pub send_gate: Mutex<Option<Arc<Notify>>>,
    /// Same for `user_id_for_username`.
    pub lookup_gate: Mutex<Option<Arc<Notify>>>,
}

impl FakeSchool {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            student: Mutex::new(Some(CurrentStudent {
                id: RoleId(3),
                username: Some("anna".into()),
            })),
            teacher: Mutex::new(Some(RoleId(12))),
            // only teachers go through the role-id exchange
            user_ids: Mutex::new(HashMap::from([(RoleId(12), UserId(42))])),
            usernames: Mutex::new(HashMap::from([(UserId(42), "anna".to_string())])),
            directory: Mutex::new(HashMap::from([
                ("anna".to_string(), UserId(42)),
                ("maria".to_string(), UserId(7)),
            ])),
            classrooms: Mutex::new(HashMap::from([(
                RoleId(12),
                vec![ClassroomId(4), ClassroomId(5)],
            )])),
            classroom_students: Mutex::new(HashMap::new()),
            messages: Mutex::new(Vec::new()),
            notifications: Mutex::new(Vec::new()),
            sent: Mutex::new(Vec::new()),
            fail_send: AtomicBool::new(false),
            fail_sync: AtomicBool::new(false),
            fail_mutations: AtomicBool::new(false),
            send_gate: Mutex::new(None),
            lookup_gate: Mutex::new(None),
        }
    }

    /// Three messages from user 7, two from user 9, all to user 42, and
    /// two notifications (5 unread, 6 read).
    pub fn with_inbox() -> Self {
        let fake = Self::new();
        *fake.messages.lock().unwrap() = vec![
            msg(1, 7, 42, at(1, 9)),
            msg(2, 9, 42, at(1, 10)),
            msg(3, 7, 42, at(2, 9)),
            msg(4, 9, 42, at(2, 10)),
            msg(5, 7, 42, at(3, 9)),
        ];
        *fake.notifications.lock().unwrap() =
            vec![note(5, 1, ReadState::Unread), note(6, 2, ReadState::Read)];
        fake
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of recorded calls starting with `prefix`.
    pub fn count(&self, prefix: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    fn set_state(&self, id: NotificationId, state: ReadState) -> Result<(), ApiError> {
        if self.fail_mutations.load(Ordering::SeqCst) {
            return Err(server_error());
        }
        for n in self.notifications.lock().unwrap().iter_mut() {
            if n.id == id {
                n.read_state = state;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl SchoolApi for FakeSchool {
    async fn current_student(&self) -> Result<CurrentStudent, ApiError> {
        self.record("current_student");
        self.student.lock().unwrap().clone().ok_or_else(server_error)
    }

    async fn current_teacher(&self) -> Result<RoleId, ApiError> {
        self.record("current_teacher");
        (*self.teacher.lock().unwrap()).ok_or_else(server_error)
    }

    async fn user_id_for_role(&self, role_id: RoleId) -> Result<UserId, ApiError> {
        self.record(format!("user_id_for_role {role_id}"));
        self.user_ids
            .lock()
            .unwrap()
            .get(&role_id)
            .copied()
            .ok_or_else(|| ApiError::NotFound(format!("user for role id {role_id}")))
    }

    async fn username_for(&self, user_id: UserId) -> Result<String, ApiError> {
        self.record(format!("username_for {user_id}"));
        self.usernames
            .lock()
            .unwrap()
            .get(&user_id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("username for user {user_id}")))
    }

    async fn user_id_for_username(&self, username: &str) -> Result<UserId, ApiError> {
        self.record(format!("user_id_for_username {username}"));
        let gate = self.lookup_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.directory
            .lock()
            .unwrap()
            .get(username)
            .copied()
            .ok_or(ApiError::Server {
                status: 404,
                message: None,
            })
    }

    async fn teacher_classrooms(&self, teacher: RoleId) -> Result<Vec<Classroom>, ApiError> {
        self.record(format!("teacher_classrooms {teacher}"));
        let rooms = self.classrooms.lock().unwrap().get(&teacher).cloned();
        rooms
            .map(|ids| ids.into_iter().map(|id| Classroom { id }).collect())
            .ok_or_else(server_error)
    }

    async fn classroom_students(&self, classroom: ClassroomId) -> Result<Vec<StudentRef>, ApiError> {
        self.record(format!("classroom_students {classroom}"));
        self.classroom_students
            .lock()
            .unwrap()
            .get(&classroom)
            .cloned()
            .ok_or(ApiError::Server {
                status: 404,
                message: None,
            })
    }

    async fn message(&self, id: MessageId) -> Result<Message, ApiError> {
        self.record(format!("message {id}"));
        self.messages
            .lock()
            .unwrap()
            .iter()
            .find(|m| m.id == id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("message {id}")))
    }

    async fn inbox(&self, receiver: UserId) -> Result<Vec<Message>, ApiError> {
        self.record(format!("inbox {receiver}"));
        if self.fail_sync.load(Ordering::SeqCst) {
            return Err(server_error());
        }
        Ok(self
            .messages
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.receiver_id == receiver)
            .cloned()
            .collect())
    }

    async fn outbox(&self, sender: UserId) -> Result<Vec<Message>, ApiError> {
        self.record(format!("outbox {sender}"));
        Ok(self
            .messages
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.sender_id == sender)
            .cloned()
            .collect())
    }

    async fn thread(&self, sender: UserId, receiver: UserId) -> Result<Vec<Message>, ApiError> {
        self.record(format!("thread {sender} {receiver}"));
        Ok(self
            .messages
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.sender_id == sender && m.receiver_id == receiver)
            .cloned()
            .collect())
    }

    async fn send_message(&self, body: &SendMessage) -> Result<SendMessage, ApiError> {
        self.record(format!("send_message {} {}", body.sender_id, body.receiver_id));
        let gate = self.send_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if self.fail_send.load(Ordering::SeqCst) {
            return Err(server_error());
        }
        self.sent.lock().unwrap().push(body.clone());
        Ok(body.clone())
    }

    async fn notifications(&self, receiver: UserId) -> Result<Vec<Notification>, ApiError> {
        self.record(format!("notifications {receiver}"));
        if self.fail_sync.load(Ordering::SeqCst) {
            return Err(server_error());
        }
        Ok(self.notifications.lock().unwrap().clone())
    }

    async fn mark_read(&self, id: NotificationId) -> Result<(), ApiError> {
        self.record(format!("mark_read {id}"));
        self.set_state(id, ReadState::Read)
    }

    async fn mark_unread(&self, id: NotificationId) -> Result<(), ApiError> {
        self.record(format!("mark_unread {id}"));
        self.set_state(id, ReadState::Unread)
    }

    async fn mark_all_read(&self, receiver: UserId) -> Result<(), ApiError> {
        self.record(format!("mark_all_read {receiver}"));
        if self.fail_mutations.load(Ordering::SeqCst) {
            return Err(server_error());
        }
        for n in self.notifications.lock().unwrap().iter_mut() {
            n.read_state = ReadState::Read;
        }
        Ok(())
    }

    async fn delete_notification(&self, id: NotificationId) -> Result<(), ApiError> {
        self.record(format!("delete_notification {id}"));
        if self.fail_mutations.load(Ordering::SeqCst) {
            return Err(server_error());
        }
        let mut list = self.notifications.lock().unwrap();
        let before = list.len();
        list.retain(|n| n.id != id);
        if list.len() == before {
            return Err(server_error());
        }
        Ok(())
    }
}
