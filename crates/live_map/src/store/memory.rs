use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard, PoisonError},
};

use async_trait::async_trait;
use futures::StreamExt;
use model::{position::Position, session::SessionId};
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;

use super::{
    ChangeKind, PositionChange, SessionStore, StoreError, StoreResult, Subscription,
};

/// Session store kept in process memory. Changes are broadcast to every
/// open subscription.
pub struct MemoryStore {
    rows: Mutex<HashMap<SessionId, Position>>,
    changes: broadcast::Sender<PositionChange>,
    unavailable: Mutex<bool>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(64);
        Self {
            rows: Mutex::new(HashMap::new()),
            changes,
            unavailable: Mutex::new(false),
        }
    }

    fn rows(&self) -> MutexGuard<'_, HashMap<SessionId, Position>> {
        self.rows.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn insert(&self, id: SessionId, position: Position) {
        self.rows().insert(id.clone(), position);
        self.publish(id, ChangeKind::Insert, position);
    }

    /// Updates the row and notifies subscribers. Unknown ids are ignored.
    pub fn update(&self, id: SessionId, position: Position) -> bool {
        let updated = match self.rows().get_mut(&id) {
            Some(row) => {
                *row = position;
                true
            }
            None => false,
        };
        if updated {
            self.publish(id, ChangeKind::Update, position);
        }
        updated
    }

    /// Makes every subsequent read fail, as if the backend went away.
    pub fn set_unavailable(&self, unavailable: bool) {
        *self.unavailable.lock().unwrap_or_else(PoisonError::into_inner) = unavailable;
    }

    pub fn subscriber_count(&self) -> usize {
        self.changes.receiver_count()
    }

    fn publish(&self, session: SessionId, kind: ChangeKind, position: Position) {
        // no receivers is not an error
        let _ = self.changes.send(PositionChange {
            session,
            kind,
            position,
        });
    }

    fn is_unavailable(&self) -> bool {
        *self.unavailable.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Debug, thiserror::Error)]
#[error("memory store switched to unavailable")]
struct Unavailable;

#[async_trait]
impl SessionStore for MemoryStore {
    async fn fetch_position(&self, id: &SessionId) -> StoreResult<Option<Position>> {
        if self.is_unavailable() {
            return Err(StoreError::other(Unavailable));
        }
        Ok(self.rows().get(id).copied())
    }

    async fn subscribe(&self, id: &SessionId) -> StoreResult<Subscription> {
        if self.is_unavailable() {
            return Err(StoreError::other(Unavailable));
        }
        let changes = BroadcastStream::new(self.changes.subscribe())
            .filter_map(|change| async move {
                match change {
                    Ok(change) => Some(change),
                    Err(why) => {
                        log::warn!("subscription lagged: {}", why);
                        None
                    }
                }
            })
            .boxed();
        Ok(Subscription::new(id.clone(), changes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reads_stored_rows() {
        let store = MemoryStore::new();
        let id = SessionId::from("s1");
        assert_eq!(store.fetch_position(&id).await.unwrap(), None);
        store.insert(id.clone(), Position::new(1.0, 2.0));
        assert_eq!(
            store.fetch_position(&id).await.unwrap(),
            Some(Position::new(1.0, 2.0))
        );
    }

    #[tokio::test]
    async fn subscriptions_only_see_updates_of_their_session() {
        let store = MemoryStore::new();
        let s1 = SessionId::from("s1");
        let s2 = SessionId::from("s2");
        store.insert(s1.clone(), Position::new(0.0, 0.0));
        store.insert(s2.clone(), Position::new(0.0, 0.0));

        let mut subscription = store.subscribe(&s1).await.unwrap();
        assert_eq!(store.subscriber_count(), 1);
        store.update(s2.clone(), Position::new(9.0, 9.0));
        store.insert(s1.clone(), Position::new(5.0, 5.0));
        store.update(s1.clone(), Position::new(1.0, 1.0));

        assert_eq!(subscription.next().await, Some(Position::new(1.0, 1.0)));
        subscription.close();
        assert_eq!(store.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn unavailable_store_fails_reads() {
        let store = MemoryStore::new();
        store.set_unavailable(true);
        let result = store.fetch_position(&SessionId::from("s1")).await;
        assert!(matches!(result, Err(StoreError::Unavailable(_))));
    }
}
