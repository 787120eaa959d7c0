//! Outgoing messages.
//!
//! The composer validates content locally, keeps a single send in flight,
//! and refreshes the sender's inbox after the server accepts a message.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{info, warn};

use lyceum_net::SchoolApi;
use lyceum_shared::protocol::SendMessage;
use lyceum_shared::types::UserId;
use lyceum_shared::validate_content;

use crate::error::{ClientError, Result};
use crate::events::{Control, ToastKind, UiEvent, UiEvents};
use crate::sync::SyncEngine;

/// Clears the in-flight flag on drop.
struct SendGuard<'a>(&'a AtomicBool);

impl<'a> SendGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for SendGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct Composer {
    api: Arc<dyn SchoolApi>,
    sync: Arc<SyncEngine>,
    events: UiEvents,
    sending: AtomicBool,
    draft: Mutex<String>,
}

impl Composer {
    pub fn new(api: Arc<dyn SchoolApi>, sync: Arc<SyncEngine>, events: UiEvents) -> Self {
        Self {
            api,
            sync,
            events,
            sending: AtomicBool::new(false),
            draft: Mutex::new(String::new()),
        }
    }

    pub fn draft(&self) -> String {
        self.draft
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set_draft(&self, text: impl Into<String>) {
        *self.draft.lock().unwrap_or_else(PoisonError::into_inner) = text.into();
    }

    fn clear_draft(&self) {
        self.draft
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.events.emit(UiEvent::DraftCleared);
    }

    pub fn is_sending(&self) -> bool {
        self.sending.load(Ordering::Acquire)
    }

    fn validate(&self, content: &str) -> Result<()> {
        validate_content(content).map_err(|e| {
            self.events.emit(UiEvent::ValidationFailed {
                reason: e.to_string(),
            });
            ClientError::from(e)
        })
    }

    /// Take the in-flight slot and disable the trigger.
    fn begin(&self) -> Option<SendGuard<'_>> {
        let guard = SendGuard::acquire(&self.sending)?;
        self.events.set_control(Control::SendButton, false);
        self.events.emit(UiEvent::Busy { active: true });
        Some(guard)
    }

    fn finish(&self, _guard: SendGuard<'_>) {
        self.events.emit(UiEvent::Busy { active: false });
        self.events.set_control(Control::SendButton, true);
    }

    /// Send `content` from `sender` to `receiver`.
    ///
    /// Invalid content is rejected before any request is made. On success
    /// the draft is cleared and the sender's inbox refreshed once; a failed
    /// refresh at that point is only logged. On failure the draft is kept.
    pub async fn send(
        &self,
        sender: UserId,
        receiver: UserId,
        content: &str,
    ) -> Result<SendMessage> {
        self.validate(content)?;

        let Some(guard) = self.begin() else {
            warn!(sender = %sender, receiver = %receiver, "Send already in flight");
            return Err(ClientError::Busy);
        };
        let result = self.deliver(sender, receiver, content).await;
        self.finish(guard);
        result
    }

    /// Send the current draft.
    pub async fn submit_draft(&self, sender: UserId, receiver: UserId) -> Result<SendMessage> {
        let draft = self.draft();
        self.send(sender, receiver, &draft).await
    }

    /// Reply to `username`, resolving their user id first.
    ///
    /// The trigger is disabled before the lookup, so a reply holds the same
    /// in-flight slot as a send from its first request to its last.
    pub async fn reply(&self, sender: UserId, username: &str, content: &str) -> Result<SendMessage> {
        self.validate(content)?;

        let Some(guard) = self.begin() else {
            warn!(sender = %sender, username, "Send already in flight");
            return Err(ClientError::Busy);
        };
        let result = match self.api.user_id_for_username(username).await {
            Ok(receiver) => self.deliver(sender, receiver, content).await,
            Err(e) => {
                warn!(username, error = %e, "Could not resolve reply recipient");
                self.events
                    .toast(ToastKind::Error, format!("Unknown recipient {username}"));
                Err(e.into())
            }
        };
        self.finish(guard);
        result
    }

    /// POST the message; the caller holds the in-flight slot.
    async fn deliver(&self, sender: UserId, receiver: UserId, content: &str) -> Result<SendMessage> {
        let body = SendMessage {
            content: content.to_string(),
            sender_id: sender,
            receiver_id: receiver,
        };
        match self.api.send_message(&body).await {
            Ok(echo) => {
                info!(sender = %sender, receiver = %receiver, chars = content.chars().count(), "Message sent");
                self.clear_draft();
                self.events.toast(ToastKind::Success, "Message sent");
                if let Err(e) = self.sync.refresh(sender).await {
                    warn!(error = %e, "Refresh after send failed");
                }
                Ok(echo)
            }
            Err(e) => {
                warn!(sender = %sender, receiver = %receiver, error = %e, "Failed to send message");
                self.events
                    .toast(ToastKind::Error, format!("Failed to send message: {e}"));
                Err(e.into())
            }
        }
    }
}
