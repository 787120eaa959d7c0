//! `reqwest`-backed implementation of [`SchoolApi`].

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, COOKIE};
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use lyceum_shared::protocol::{
    Classroom, CurrentStudent, IdBody, Message, Notification, SendMessage, StudentRef,
    UserIdLookup, UsernameLookup,
};
use lyceum_shared::types::{ClassroomId, MessageId, NotificationId, RoleId, UserId};

use crate::api::SchoolApi;
use crate::endpoints;
use crate::error::{extract_error_message, ApiError, Result};

/// HTTP client for the classroom server.
///
/// Cheap to clone: the underlying `reqwest::Client` shares its connection
/// pool. Requests carry the session cookie given at construction and have
/// no timeout.
#[derive(Clone)]
pub struct HttpApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpApi {
    /// Build a client for `base_url`, authenticating with `session_cookie`
    /// (the raw `Cookie` header value, e.g. `JSESSIONID=...`) when given.
    pub fn new(base_url: &str, session_cookie: Option<&str>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        if let Some(cookie) = session_cookie {
            let value = HeaderValue::from_str(cookie)
                .map_err(|e| ApiError::InvalidConfig(format!("session cookie: {e}")))?;
            headers.insert(COOKIE, value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        debug!(path, "GET");
        let resp = self.client.get(self.url(path)).send().await?;
        decode(path, resp).await
    }

    async fn execute(&self, path: &str, request: RequestBuilder) -> Result<Response> {
        let resp = request.send().await?;
        ensure_success(path, resp).await
    }
}

async fn ensure_success(path: &str, resp: Response) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let body = resp.text().await.unwrap_or_default();
    let message = extract_error_message(&body);
    warn!(path, status = status.as_u16(), message = ?message, "Request failed");
    Err(ApiError::Server {
        status: status.as_u16(),
        message,
    })
}

async fn decode<T: DeserializeOwned>(path: &str, resp: Response) -> Result<T> {
    let resp = ensure_success(path, resp).await?;
    let bytes = resp.bytes().await?;
    // An empty 2xx body reads as `null`.
    let body: &[u8] = if bytes.iter().all(u8::is_ascii_whitespace) {
        &b"null"[..]
    } else {
        &bytes[..]
    };
    serde_json::from_slice(body).map_err(|e| ApiError::Decode(format!("{path}: {e}")))
}

#[async_trait]
impl SchoolApi for HttpApi {
    async fn current_student(&self) -> Result<CurrentStudent> {
        let path = endpoints::current_principal(lyceum_shared::Role::Student);
        let student: Option<CurrentStudent> = self.get_json(&path).await?;
        student.ok_or_else(|| ApiError::NotFound("current student".into()))
    }

    async fn current_teacher(&self) -> Result<RoleId> {
        let path = endpoints::current_principal(lyceum_shared::Role::Teacher);
        let id: Option<RoleId> = self.get_json(&path).await?;
        id.ok_or_else(|| ApiError::NotFound("current teacher".into()))
    }

    async fn user_id_for_role(&self, role_id: RoleId) -> Result<UserId> {
        let lookup: Option<UserIdLookup> =
            self.get_json(&endpoints::user_id_for_role(role_id)).await?;
        lookup
            .map(|l| l.user_id())
            .ok_or_else(|| ApiError::NotFound(format!("user for role id {role_id}")))
    }

    async fn username_for(&self, user_id: UserId) -> Result<String> {
        let lookup: Option<UsernameLookup> =
            self.get_json(&endpoints::username_for(user_id)).await?;
        lookup
            .map(|l| l.username)
            .ok_or_else(|| ApiError::NotFound(format!("username for user {user_id}")))
    }

    async fn user_id_for_username(&self, username: &str) -> Result<UserId> {
        let id: Option<UserId> = self
            .get_json(&endpoints::user_id_for_username(username))
            .await?;
        id.ok_or_else(|| ApiError::NotFound(format!("user {username}")))
    }

    async fn teacher_classrooms(&self, teacher: RoleId) -> Result<Vec<Classroom>> {
        let list: Option<Vec<Classroom>> =
            self.get_json(&endpoints::teacher_classrooms(teacher)).await?;
        Ok(list.unwrap_or_default())
    }

    async fn classroom_students(&self, classroom: ClassroomId) -> Result<Vec<StudentRef>> {
        let list: Option<Vec<StudentRef>> =
            self.get_json(&endpoints::classroom_students(classroom)).await?;
        Ok(list.unwrap_or_default())
    }

    async fn message(&self, id: MessageId) -> Result<Message> {
        let msg: Option<Message> = self.get_json(&endpoints::message(id)).await?;
        msg.ok_or_else(|| ApiError::NotFound(format!("message {id}")))
    }

    async fn inbox(&self, receiver: UserId) -> Result<Vec<Message>> {
        let list: Option<Vec<Message>> = self.get_json(&endpoints::inbox(receiver)).await?;
        Ok(list.unwrap_or_default())
    }

    async fn outbox(&self, sender: UserId) -> Result<Vec<Message>> {
        let list: Option<Vec<Message>> = self.get_json(&endpoints::outbox(sender)).await?;
        Ok(list.unwrap_or_default())
    }

    async fn thread(&self, sender: UserId, receiver: UserId) -> Result<Vec<Message>> {
        let list: Option<Vec<Message>> =
            self.get_json(&endpoints::thread(sender, receiver)).await?;
        Ok(list.unwrap_or_default())
    }

    async fn send_message(&self, body: &SendMessage) -> Result<SendMessage> {
        let path = endpoints::SEND_MESSAGE;
        debug!(path, sender = %body.sender_id, receiver = %body.receiver_id, "POST");
        let resp = self.client.post(self.url(path)).json(body).send().await?;
        let echoed: Option<SendMessage> = decode(path, resp).await?;
        Ok(echoed.unwrap_or_else(|| body.clone()))
    }

    async fn notifications(&self, receiver: UserId) -> Result<Vec<Notification>> {
        let list: Option<Vec<Notification>> =
            self.get_json(&endpoints::notifications(receiver)).await?;
        Ok(list.unwrap_or_default())
    }

    async fn mark_read(&self, id: NotificationId) -> Result<()> {
        let path = endpoints::mark_read(id);
        debug!(path = %path, "PUT");
        self.execute(&path, self.client.put(self.url(&path))).await?;
        Ok(())
    }

    async fn mark_unread(&self, id: NotificationId) -> Result<()> {
        let path = endpoints::mark_unread(id);
        debug!(path = %path, "PUT");
        self.execute(&path, self.client.put(self.url(&path))).await?;
        Ok(())
    }

    async fn mark_all_read(&self, receiver: UserId) -> Result<()> {
        let path = endpoints::mark_all_read(receiver);
        debug!(path = %path, "PUT");
        self.execute(&path, self.client.put(self.url(&path))).await?;
        Ok(())
    }

    async fn delete_notification(&self, id: NotificationId) -> Result<()> {
        let path = endpoints::DELETE_NOTIFICATION;
        debug!(path, id = %id, "DELETE");
        let request = self
            .client
            .delete(self.url(path))
            .json(&IdBody { id: id.0 });
        self.execute(path, request).await?;
        Ok(())
    }
}
