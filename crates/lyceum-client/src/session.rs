//! Wiring of the messaging components for one logged-in session.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use lyceum_net::SchoolApi;
use lyceum_shared::protocol::{Message, SendMessage};
use lyceum_shared::types::{MessageId, NotificationId, UserId};
use lyceum_shared::UserIdentity;
use lyceum_store::Conversation;

use crate::composer::Composer;
use crate::config::ClientConfig;
use crate::directory::RecipientDirectory;
use crate::error::Result;
use crate::events::{UiEvent, UiEvents};
use crate::identity::IdentityResolver;
use crate::notifications::NotificationActions;
use crate::sync::SyncEngine;
use crate::view::InboxView;

pub struct MessagingModule {
    identity: IdentityResolver,
    sync: Arc<SyncEngine>,
    composer: Composer,
    notifications: NotificationActions,
    directory: RecipientDirectory,
    events: UiEvents,
    poll_interval: Option<Duration>,
    poller: Mutex<Option<JoinHandle<()>>>,
}

impl MessagingModule {
    pub fn new(api: Arc<dyn SchoolApi>, config: &ClientConfig, events: UiEvents) -> Self {
        let sync = Arc::new(SyncEngine::new(api.clone(), events.clone()));
        Self {
            identity: IdentityResolver::new(api.clone(), config.role),
            composer: Composer::new(api.clone(), sync.clone(), events.clone()),
            notifications: NotificationActions::new(api.clone(), sync.clone(), events.clone()),
            directory: RecipientDirectory::new(api, config.role),
            sync,
            events,
            poll_interval: config.poll_interval,
            poller: Mutex::new(None),
        }
    }

    /// Resolve the identity and load the inbox.
    ///
    /// An identity failure halts the module: nothing is fetched and every
    /// later operation fails with the same error. A failed initial load is
    /// reported but leaves the module usable.
    pub async fn start(&self) -> Result<UserIdentity> {
        let identity = match self.identity.resolve().await {
            Ok(identity) => identity,
            Err(e) => {
                error!(error = %e, "Messaging halted");
                self.events.emit(UiEvent::SessionHalted {
                    reason: e.to_string(),
                });
                return Err(e);
            }
        };
        self.events.emit(UiEvent::IdentityResolved {
            identity: identity.clone(),
        });

        if let Err(e) = self.sync.refresh(identity.user_id).await {
            self.events.alert(format!("Could not load messages: {e}"));
        }

        if let Some(every) = self.poll_interval {
            info!(secs = every.as_secs(), "Background refresh enabled");
            let handle = self.sync.spawn_polling(identity.user_id, every);
            let previous = self
                .poller
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .replace(handle);
            if let Some(previous) = previous {
                previous.abort();
            }
        }

        Ok(identity)
    }

    /// Stop background refreshing.
    pub fn stop(&self) {
        let handle = self
            .poller
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            handle.abort();
            info!("Background refresh stopped");
        }
    }

    async fn me(&self) -> Result<UserId> {
        Ok(self.identity.resolve().await?.user_id)
    }

    pub fn composer(&self) -> &Composer {
        &self.composer
    }

    pub fn sync(&self) -> &Arc<SyncEngine> {
        &self.sync
    }

    pub async fn identity(&self) -> Result<UserIdentity> {
        self.identity.resolve().await
    }

    pub async fn refresh(&self) -> Result<InboxView> {
        let me = self.me().await?;
        self.sync.refresh(me).await?;
        Ok(self.sync.view().await)
    }

    pub async fn view(&self) -> InboxView {
        self.sync.view().await
    }

    pub async fn sent(&self) -> Result<Vec<Conversation>> {
        let me = self.me().await?;
        self.sync.sent(me).await
    }

    pub async fn thread(&self, counterpart: UserId) -> Result<Conversation> {
        let me = self.me().await?;
        self.sync.thread(me, counterpart).await
    }

    pub async fn message(&self, id: MessageId) -> Result<Message> {
        self.me().await?;
        self.sync.message(id).await
    }

    pub async fn send(&self, receiver: UserId, content: &str) -> Result<SendMessage> {
        let me = self.me().await?;
        self.composer.send(me, receiver, content).await
    }

    pub async fn reply(&self, username: &str, content: &str) -> Result<SendMessage> {
        let me = self.me().await?;
        self.composer.reply(me, username, content).await
    }

    /// Students a teacher can message, by username.
    pub async fn recipients(&self) -> Result<BTreeMap<String, UserId>> {
        self.me().await?;
        self.directory.load().await
    }

    pub async fn toggle(&self, id: NotificationId, checked: bool) -> Result<()> {
        let me = self.me().await?;
        self.notifications.toggle(me, id, checked).await
    }

    pub async fn delete_notification(&self, id: NotificationId) -> Result<()> {
        let me = self.me().await?;
        self.notifications.delete(me, id).await
    }

    pub async fn mark_all_read(&self) -> Result<()> {
        let me = self.me().await?;
        self.notifications.mark_all_read(me).await
    }
}

impl Drop for MessagingModule {
    fn drop(&mut self) {
        if let Some(handle) = self
            .poller
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            warn!("Messaging module dropped while polling");
            handle.abort();
        }
    }
}
