//! Backend seam for live tracked sessions.

use std::{error, fmt, time::Duration};

use async_trait::async_trait;
use futures::{stream::BoxStream, StreamExt};
use model::{position::Position, session::SessionId};
use thiserror::Error;

pub mod memory;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no stored position for the session")]
    NotFound,
    #[error("initial read did not complete within {0:?}")]
    Timeout(Duration),
    #[error("session store unavailable: {0}")]
    Unavailable(Box<dyn error::Error + Send + Sync>),
}

impl StoreError {
    pub fn other<T: error::Error + Send + Sync + 'static>(why: T) -> Self {
        Self::Unavailable(Box::new(why))
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

/// A pushed change notification.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionChange {
    pub session: SessionId,
    pub kind: ChangeKind,
    pub position: Position,
}

/// A stream of change events scoped to one session. Dropping or closing it
/// releases the underlying channel.
pub struct Subscription {
    session: SessionId,
    changes: BoxStream<'static, PositionChange>,
}

impl Subscription {
    pub fn new(session: SessionId, changes: BoxStream<'static, PositionChange>) -> Self {
        Self { session, changes }
    }

    /// Next update for this session. Events for other sessions and non
    /// update events are skipped. `None` once the transport is gone.
    pub async fn next(&mut self) -> Option<Position> {
        while let Some(change) = self.changes.next().await {
            if change.session == self.session && change.kind == ChangeKind::Update {
                return Some(change.position);
            }
            log::trace!("skipping unrelated change {:?}", change);
        }
        None
    }

    pub fn close(self) {
        log::debug!("releasing subscription for session {}", self.session);
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

#[async_trait]
pub trait SessionStore: Send + Sync + 'static {
    /// One-shot read of the stored position. `Ok(None)` if there is no row.
    async fn fetch_position(&self, id: &SessionId) -> StoreResult<Option<Position>>;

    /// Opens a change subscription for `id`.
    async fn subscribe(&self, id: &SessionId) -> StoreResult<Subscription>;
}
