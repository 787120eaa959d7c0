//! Read/unread toggling and deletion of notifications.
//!
//! Transitions are always sent to the server, even when the local state
//! already matches: both are idempotent there. The local state is never
//! patched; the refresh that follows a successful mutation brings it in.

use std::collections::HashSet;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, info, warn};

use lyceum_net::{ApiError, SchoolApi};
use lyceum_shared::types::{NotificationId, ReadAction, UserId};

use crate::error::{ClientError, Result};
use crate::events::{Control, UiEvents};
use crate::sync::SyncEngine;

/// Removes a control from the pending set on drop.
struct PendingGuard<'a> {
    pending: &'a Mutex<HashSet<Control>>,
    control: Control,
}

impl<'a> PendingGuard<'a> {
    fn acquire(pending: &'a Mutex<HashSet<Control>>, control: Control) -> Option<Self> {
        let inserted = pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(control);
        inserted.then_some(Self { pending, control })
    }
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.control);
    }
}

pub struct NotificationActions {
    api: Arc<dyn SchoolApi>,
    sync: Arc<SyncEngine>,
    events: UiEvents,
    pending: Mutex<HashSet<Control>>,
}

impl NotificationActions {
    pub fn new(api: Arc<dyn SchoolApi>, sync: Arc<SyncEngine>, events: UiEvents) -> Self {
        Self {
            api,
            sync,
            events,
            pending: Mutex::new(HashSet::new()),
        }
    }

    pub fn is_pending(&self, id: NotificationId) -> bool {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&Control::Notification(id))
    }

    /// Checkbox handler: checked marks read, unchecked marks unread.
    pub async fn toggle(&self, owner: UserId, id: NotificationId, checked: bool) -> Result<()> {
        self.transition(owner, id, ReadAction::from_checked(checked))
            .await
    }

    pub async fn mark_read(&self, owner: UserId, id: NotificationId) -> Result<()> {
        self.transition(owner, id, ReadAction::MarkRead).await
    }

    pub async fn mark_unread(&self, owner: UserId, id: NotificationId) -> Result<()> {
        self.transition(owner, id, ReadAction::MarkUnread).await
    }

    async fn transition(&self, owner: UserId, id: NotificationId, action: ReadAction) -> Result<()> {
        let current = self
            .sync
            .store()
            .read()
            .await
            .notifications()
            .get(id)
            .map(|n| n.read_state);
        debug!(
            id = %id,
            from = ?current,
            to = ?current.map(|s| s.apply(action)),
            "Notification transition"
        );

        let request = async {
            match action {
                ReadAction::MarkRead => self.api.mark_read(id).await,
                ReadAction::MarkUnread => self.api.mark_unread(id).await,
            }
        };
        self.mutate(owner, Control::Notification(id), request).await
    }

    /// Delete a notification, whatever its read state.
    pub async fn delete(&self, owner: UserId, id: NotificationId) -> Result<()> {
        let request = self.api.delete_notification(id);
        self.mutate(owner, Control::Notification(id), request).await
    }

    pub async fn mark_all_read(&self, owner: UserId) -> Result<()> {
        let request = self.api.mark_all_read(owner);
        self.mutate(owner, Control::MarkAllRead, request).await
    }

    async fn mutate<F>(&self, owner: UserId, control: Control, request: F) -> Result<()>
    where
        F: Future<Output = std::result::Result<(), ApiError>>,
    {
        let Some(_guard) = PendingGuard::acquire(&self.pending, control) else {
            warn!(control = ?control, "Notification action already in flight");
            return Err(ClientError::Busy);
        };
        self.events.set_control(control, false);

        let result = match request.await {
            Ok(()) => {
                info!(control = ?control, "Notification updated");
                if let Err(e) = self.sync.refresh(owner).await {
                    warn!(error = %e, "Refresh after notification update failed");
                }
                Ok(())
            }
            Err(e) => {
                warn!(control = ?control, error = %e, "Notification update failed");
                self.events.alert(format!("Could not update notification: {e}"));
                Err(e.into())
            }
        };

        self.events.set_control(control, true);
        result
    }
}
