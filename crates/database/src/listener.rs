//! One `LISTEN` connection per database, fanned out to every session
//! subscription.

use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use futures::StreamExt;
use live_map::store::{PositionChange, Subscription};
use model::session::SessionId;
use sqlx::postgres::PgListener;
use tokio::{sync::broadcast, task::JoinHandle, time};
use tokio_stream::wrappers::BroadcastStream;

use crate::data_model::session::SessionNotification;

const FEED_CAPACITY: usize = 256;
const RETRY_DELAY: Duration = Duration::from_secs(2);

/// Broadcast of session changes. Resetting it ends every open
/// subscription, so followers resubscribe and reread their row.
pub struct SessionFeed {
    changes: Mutex<broadcast::Sender<PositionChange>>,
}

impl Default for SessionFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionFeed {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(FEED_CAPACITY);
        Self {
            changes: Mutex::new(changes),
        }
    }

    fn changes(&self) -> MutexGuard<'_, broadcast::Sender<PositionChange>> {
        self.changes.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn publish(&self, change: PositionChange) {
        // no receivers is not an error
        let _ = self.changes().send(change);
    }

    /// Drops the current channel. Notifications may have been missed.
    pub fn reset(&self) {
        let (changes, _) = broadcast::channel(FEED_CAPACITY);
        *self.changes() = changes;
    }

    pub fn subscriber_count(&self) -> usize {
        self.changes().receiver_count()
    }

    pub fn subscribe(&self, id: &SessionId) -> Subscription {
        let changes = BroadcastStream::new(self.changes().subscribe())
            .take_while(|change| {
                let alive = match change {
                    Ok(_) => true,
                    Err(why) => {
                        // lagged, resubscribe to resync from the row
                        log::warn!("session feed subscriber {}", why);
                        false
                    }
                };
                futures::future::ready(alive)
            })
            .filter_map(|change| futures::future::ready(change.ok()))
            .boxed();
        Subscription::new(id.clone(), changes)
    }
}

/// Owns the task forwarding notifications into a [`SessionFeed`].
pub(crate) struct FeedTask(JoinHandle<()>);

impl Drop for FeedTask {
    fn drop(&mut self) {
        self.0.abort();
    }
}

impl FeedTask {
    pub(crate) fn spawn(listener: PgListener, feed: Arc<SessionFeed>) -> Self {
        Self(tokio::spawn(forward(listener, feed)))
    }
}

async fn forward(mut listener: PgListener, feed: Arc<SessionFeed>) {
    loop {
        match listener.try_recv().await {
            Ok(Some(notification)) => {
                if let Some(change) = SessionNotification::parse(notification.payload())
                    .and_then(SessionNotification::into_change)
                {
                    feed.publish(change);
                }
            }
            Ok(None) => {
                // the next receive reconnects and listens again
                log::warn!("session listener connection lost, reconnecting");
                feed.reset();
            }
            Err(why) => {
                log::warn!("session listener failed: {}", why);
                feed.reset();
                time::sleep(RETRY_DELAY).await;
            }
        }
    }
}
