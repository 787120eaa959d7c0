//! Events published to the UI layer.
//!
//! The messaging module never touches presentation directly: it pushes
//! [`UiEvent`]s into an unbounded channel and whatever front-end owns the
//! receiver decides how to show them.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::mpsc;

use lyceum_shared::{NotificationId, UserIdentity};

use crate::view::InboxView;

/// A control the user can trigger, disabled while its request is in flight.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum Control {
    SendButton,
    Notification(NotificationId),
    MarkAllRead,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ToastKind {
    Success,
    Error,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum UiEvent {
    IdentityResolved { identity: UserIdentity },
    /// Identity resolution failed; the module will not sync.
    SessionHalted { reason: String },
    Rendered { view: InboxView },
    Busy { active: bool },
    ControlDisabled { control: Control },
    ControlEnabled { control: Control },
    Toast { id: u64, kind: ToastKind, text: String },
    ToastDismissed { id: u64 },
    DraftCleared,
    ValidationFailed { reason: String },
    Alert { text: String },
}

pub type EventSender = mpsc::UnboundedSender<UiEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<UiEvent>;

pub fn emit_event(tx: &EventSender, event: UiEvent) {
    if let Err(e) = tx.send(event) {
        tracing::warn!(event = ?e.0, "Failed to emit event, UI receiver closed");
    }
}

/// Cloneable handle for publishing UI events, including self-dismissing
/// toasts.
#[derive(Clone)]
pub struct UiEvents {
    tx: EventSender,
    toast_ttl: Duration,
    next_toast: Arc<AtomicU64>,
}

impl UiEvents {
    pub fn new(tx: EventSender, toast_ttl: Duration) -> Self {
        Self {
            tx,
            toast_ttl,
            next_toast: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn channel(toast_ttl: Duration) -> (Self, EventReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx, toast_ttl), rx)
    }

    pub fn emit(&self, event: UiEvent) {
        emit_event(&self.tx, event);
    }

    /// Show a toast and schedule its dismissal. Returns the toast id.
    ///
    /// Must be called from within a tokio runtime.
    pub fn toast(&self, kind: ToastKind, text: impl Into<String>) -> u64 {
        let id = self.next_toast.fetch_add(1, Ordering::Relaxed) + 1;
        self.emit(UiEvent::Toast {
            id,
            kind,
            text: text.into(),
        });

        let tx = self.tx.clone();
        let ttl = self.toast_ttl;
        tokio::spawn(async move {
            tokio::time::sleep(ttl).await;
            if tx.send(UiEvent::ToastDismissed { id }).is_err() {
                tracing::debug!(id, "Toast dismissed after UI closed");
            }
        });
        id
    }

    pub fn alert(&self, text: impl Into<String>) {
        self.emit(UiEvent::Alert { text: text.into() });
    }

    pub fn set_control(&self, control: Control, enabled: bool) {
        self.emit(if enabled {
            UiEvent::ControlEnabled { control }
        } else {
            UiEvent::ControlDisabled { control }
        });
    }
}
