//! Fetch, replace, render.
//!
//! Every refresh takes a ticket when it starts. The store only accepts a
//! snapshot whose ticket is newer than the one it holds, so a slow response
//! can never overwrite the result of a later refresh.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use lyceum_net::SchoolApi;
use lyceum_shared::protocol::Message;
use lyceum_shared::types::{MessageId, UserId};
use lyceum_store::{group_conversations, merge_thread, Conversation, ConversationStore, Snapshot};

use crate::error::Result;
use crate::events::{UiEvent, UiEvents};
use crate::view::{render, InboxView};

pub struct SyncEngine {
    api: Arc<dyn SchoolApi>,
    store: RwLock<ConversationStore>,
    events: UiEvents,
    last_ticket: AtomicU64,
}

impl SyncEngine {
    pub fn new(api: Arc<dyn SchoolApi>, events: UiEvents) -> Self {
        Self {
            api,
            store: RwLock::new(ConversationStore::new()),
            events,
            last_ticket: AtomicU64::new(0),
        }
    }

    fn next_ticket(&self) -> u64 {
        self.last_ticket.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Fetch inbox and notifications for `user_id` and replace the store.
    ///
    /// On failure the store and the last published view are left as they
    /// were.
    pub async fn refresh(&self, user_id: UserId) -> Result<()> {
        let ticket = self.next_ticket();
        debug!(ticket, user_id = %user_id, "Refresh started");

        let fetched = futures::try_join!(self.api.inbox(user_id), self.api.notifications(user_id));
        let (inbox, notifications) = match fetched {
            Ok(data) => data,
            Err(e) => {
                warn!(ticket, user_id = %user_id, error = %e, "Refresh failed, keeping last state");
                return Err(e.into());
            }
        };

        self.apply(
            ticket,
            user_id,
            Snapshot {
                inbox,
                notifications,
            },
        )
        .await;
        Ok(())
    }

    /// Apply a fetched snapshot and publish the new view. Returns `false`
    /// when the snapshot was stale and discarded.
    async fn apply(&self, ticket: u64, user_id: UserId, snapshot: Snapshot) -> bool {
        let mut store = self.store.write().await;
        if !store.replace_if_newer(ticket, user_id, snapshot) {
            return false;
        }

        let view = render(&store);
        info!(
            ticket,
            conversations = view.conversations.len(),
            notifications = view.notifications.len(),
            unread = store.notifications().unread_count(),
            "Inbox refreshed"
        );
        // Published under the lock so views reach the UI in ticket order.
        self.events.emit(UiEvent::Rendered { view });
        true
    }

    /// Render the current store contents.
    pub async fn view(&self) -> InboxView {
        render(&*self.store.read().await)
    }

    /// Unread count of the last applied snapshot.
    pub async fn unread_count(&self) -> usize {
        self.store.read().await.notifications().unread_count()
    }

    pub fn store(&self) -> &RwLock<ConversationStore> {
        &self.store
    }

    /// Messages sent by `me`, grouped by receiver. Does not touch the store.
    pub async fn sent(&self, me: UserId) -> Result<Vec<Conversation>> {
        let outbox = self.api.outbox(me).await?;
        debug!(user_id = %me, count = outbox.len(), "Fetched outbox");
        Ok(group_conversations(me, &outbox))
    }

    /// Both directions of the exchange between `me` and `counterpart`.
    pub async fn thread(&self, me: UserId, counterpart: UserId) -> Result<Conversation> {
        let (outgoing, incoming) = futures::try_join!(
            self.api.thread(me, counterpart),
            self.api.thread(counterpart, me)
        )?;
        Ok(merge_thread(me, counterpart, &outgoing, &incoming))
    }

    pub async fn message(&self, id: MessageId) -> Result<Message> {
        Ok(self.api.message(id).await?)
    }

    /// Refresh `user_id` every `every` until the returned task is aborted.
    /// The first refresh happens one full interval after the call.
    pub fn spawn_polling(self: &Arc<Self>, user_id: UserId, every: Duration) -> JoinHandle<()> {
        let engine = Arc::clone(self);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + every, every);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if let Err(e) = engine.refresh(user_id).await {
                    debug!(error = %e, "Background refresh failed");
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClientError;
    use crate::testing::{at, msg, FakeSchool};

    fn engine(fake: &Arc<FakeSchool>) -> (Arc<SyncEngine>, crate::events::EventReceiver) {
        let (events, rx) = UiEvents::channel(Duration::from_millis(10));
        (Arc::new(SyncEngine::new(fake.clone(), events)), rx)
    }

    #[tokio::test]
    async fn test_refresh_groups_inbox() {
        let fake = Arc::new(FakeSchool::with_inbox());
        let (sync, mut rx) = engine(&fake);

        sync.refresh(UserId(42)).await.unwrap();

        let view = sync.view().await;
        assert_eq!(view.conversations.len(), 2);
        let sizes: Vec<(i64, usize)> = view
            .conversations
            .iter()
            .map(|c| (c.counterpart_id.0, c.messages.len()))
            .collect();
        assert_eq!(sizes, vec![(7, 3), (9, 2)]);

        let ids: Vec<i64> = view.conversations[0].messages.iter().map(|m| m.id.0).collect();
        assert_eq!(ids, vec![1, 3, 5]);
        assert_eq!(view.badge, Some(1));

        assert_eq!(rx.recv().await, Some(UiEvent::Rendered { view }));
    }

    #[tokio::test]
    async fn test_consecutive_refreshes_render_identically() {
        let fake = Arc::new(FakeSchool::with_inbox());
        let (sync, mut rx) = engine(&fake);

        sync.refresh(UserId(42)).await.unwrap();
        sync.refresh(UserId(42)).await.unwrap();

        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        assert_eq!(first, second);
        assert_eq!(fake.count("inbox 42"), 2);
        assert_eq!(fake.count("notifications 42"), 2);
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_last_state() {
        let fake = Arc::new(FakeSchool::with_inbox());
        let (sync, mut rx) = engine(&fake);

        sync.refresh(UserId(42)).await.unwrap();
        let before = sync.view().await;
        let _ = rx.recv().await;

        fake.fail_sync.store(true, Ordering::SeqCst);
        fake.messages.lock().unwrap().clear();
        let err = sync.refresh(UserId(42)).await.unwrap_err();

        assert!(matches!(err, ClientError::Api(_)));
        assert_eq!(sync.view().await, before);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_stale_snapshot_discarded() {
        let fake = Arc::new(FakeSchool::new());
        let (sync, mut rx) = engine(&fake);

        let older = sync.next_ticket();
        let newer = sync.next_ticket();

        let fresh = Snapshot {
            inbox: vec![msg(2, 9, 42, at(2, 9))],
            notifications: vec![],
        };
        let stale = Snapshot {
            inbox: vec![msg(1, 7, 42, at(1, 9))],
            notifications: vec![],
        };

        assert!(sync.apply(newer, UserId(42), fresh).await);
        assert!(!sync.apply(older, UserId(42), stale).await);

        let view = sync.view().await;
        assert_eq!(view.conversations.len(), 1);
        assert_eq!(view.conversations[0].counterpart_id, UserId(9));

        // only the applied snapshot was published
        assert!(matches!(rx.recv().await, Some(UiEvent::Rendered { .. })));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_thread_merges_both_directions() {
        let fake = Arc::new(FakeSchool::with_inbox());
        fake.messages
            .lock()
            .unwrap()
            .push(msg(10, 42, 7, at(2, 12)));
        let (sync, _rx) = engine(&fake);

        let thread = sync.thread(UserId(42), UserId(7)).await.unwrap();
        let ids: Vec<i64> = thread.messages.iter().map(|m| m.id.0).collect();
        assert_eq!(ids, vec![1, 3, 10, 5]);
        assert_eq!(fake.count("thread"), 2);
    }

    #[tokio::test]
    async fn test_sent_groups_by_receiver() {
        let fake = Arc::new(FakeSchool::new());
        *fake.messages.lock().unwrap() = vec![
            msg(1, 42, 7, at(1, 9)),
            msg(2, 42, 9, at(1, 10)),
            msg(3, 42, 7, at(1, 11)),
        ];
        let (sync, _rx) = engine(&fake);

        let sent = sync.sent(UserId(42)).await.unwrap();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].counterpart_id, UserId(7));
        assert_eq!(sent[0].len(), 2);
        // outbox does not replace the inbox snapshot
        assert!(!sync.store().read().await.is_loaded());
    }

    #[tokio::test]
    async fn test_polling_refreshes() {
        let fake = Arc::new(FakeSchool::with_inbox());
        let (sync, mut rx) = engine(&fake);

        let handle = sync.spawn_polling(UserId(42), Duration::from_millis(10));
        let event = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .unwrap();
        handle.abort();

        assert!(matches!(event, Some(UiEvent::Rendered { .. })));
        assert!(fake.count("inbox 42") >= 1);
    }
}
