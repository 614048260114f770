//! Live tracking of a single session.
//!
//! [`open_live_session`] performs the one-shot read of the stored position
//! and, if there is one, follows the change subscription for that id until
//! the returned [`LiveSessionHandle`] is closed. A failed or empty read is
//! terminal: the state becomes [`SessionViewState::NotFound`] and nothing
//! is retried.

use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Local};
use model::{
    position::Position,
    session::{SessionId, SessionStatus, TrackingSession},
};
use serde::Serialize;
use tokio::{sync::watch, task::JoinHandle, time};
use tokio_util::sync::CancellationToken;

use crate::{
    config::TrackingConfig,
    store::{SessionStore, StoreError, StoreResult, Subscription},
    MapError,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", tag = "status")]
pub enum SessionViewState {
    Loading,
    #[serde(rename_all = "camelCase")]
    Found {
        position: Position,
        last_updated: DateTime<Local>,
    },
    NotFound,
}

impl SessionViewState {
    fn found(position: Position) -> Self {
        Self::Found {
            position,
            last_updated: Local::now(),
        }
    }

    pub fn position(&self) -> Option<Position> {
        match self {
            Self::Found { position, .. } => Some(*position),
            _ => None,
        }
    }

    pub fn last_updated(&self) -> Option<DateTime<Local>> {
        match self {
            Self::Found { last_updated, .. } => Some(*last_updated),
            _ => None,
        }
    }

    pub fn status(&self) -> SessionStatus {
        match self {
            Self::Loading => SessionStatus::Loading,
            Self::Found { .. } => SessionStatus::Found,
            Self::NotFound => SessionStatus::NotFound,
        }
    }

    pub fn to_session(&self, id: SessionId) -> TrackingSession {
        TrackingSession {
            id,
            position: self.position(),
            last_updated: self.last_updated(),
            status: self.status(),
        }
    }
}

/// Link to the position on an external map.
pub fn external_map_link(position: Position) -> String {
    format!(
        "https://maps.google.com/?q={},{}",
        position.latitude, position.longitude
    )
}

pub fn updated_label(last_updated: &DateTime<Local>) -> String {
    format!("Updated {}", last_updated.format("%H:%M:%S"))
}

/// Owns the task following one session. Must be closed with
/// [`LiveSessionHandle::close`]; dropping it only signals cancellation.
pub struct LiveSessionHandle {
    id: SessionId,
    state: watch::Receiver<SessionViewState>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl LiveSessionHandle {
    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn state(&self) -> SessionViewState {
        self.state.borrow().clone()
    }

    pub fn watch(&self) -> watch::Receiver<SessionViewState> {
        self.state.clone()
    }

    /// Releases the subscription and waits until the session task is gone.
    /// No update is applied after this returns.
    pub async fn close(mut self) -> Result<(), MapError> {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            task.await?;
        }
        log::debug!("closed live session {}", self.id);
        Ok(())
    }
}

impl Drop for LiveSessionHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

pub fn open_live_session<S>(
    store: Arc<S>,
    id: SessionId,
    config: TrackingConfig,
) -> LiveSessionHandle
where
    S: SessionStore + ?Sized,
{
    let (state_tx, state_rx) = watch::channel(SessionViewState::Loading);
    let cancel = CancellationToken::new();
    log::debug!("opening live session {}", id);

    let task = tokio::spawn(run_session(
        store,
        id.clone(),
        config,
        state_tx,
        cancel.clone(),
    ));

    LiveSessionHandle {
        id,
        state: state_rx,
        cancel,
        task: Some(task),
    }
}

async fn initial_read<S>(
    store: &S,
    id: &SessionId,
    timeout: Option<Duration>,
) -> StoreResult<Position>
where
    S: SessionStore + ?Sized,
{
    let read = store.fetch_position(id);
    let result = match timeout {
        Some(limit) => time::timeout(limit, read)
            .await
            .map_err(|_| StoreError::Timeout(limit))?,
        None => read.await,
    };
    result?.ok_or(StoreError::NotFound)
}

enum FollowOutcome {
    Cancelled,
    Ended { delivered: usize },
}

async fn follow(
    subscription: &mut Subscription,
    state: &watch::Sender<SessionViewState>,
    cancel: &CancellationToken,
) -> FollowOutcome {
    let mut delivered = 0;
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return FollowOutcome::Cancelled,
            next = subscription.next() => match next {
                Some(position) => {
                    delivered += 1;
                    state.send_replace(SessionViewState::found(position));
                }
                None => return FollowOutcome::Ended { delivered },
            },
        }
    }
}

async fn run_session<S>(
    store: Arc<S>,
    id: SessionId,
    config: TrackingConfig,
    state: watch::Sender<SessionViewState>,
    cancel: CancellationToken,
) where
    S: SessionStore + ?Sized,
{
    let initial = tokio::select! {
        _ = cancel.cancelled() => return,
        result = initial_read(store.as_ref(), &id, config.initial_read_timeout) => result,
    };
    match initial {
        Ok(position) => {
            state.send_replace(SessionViewState::found(position));
        }
        Err(why) => {
            // absent rows and failed reads look the same to the viewer
            log::warn!("session {} not found: {}", id, why);
            state.send_replace(SessionViewState::NotFound);
            return;
        }
    }

    let mut failures = 0;
    let mut backoff = Duration::ZERO;
    let mut reconnecting = false;
    loop {
        let subscription = tokio::select! {
            _ = cancel.cancelled() => return,
            result = store.subscribe(&id) => result,
        };
        match subscription {
            Ok(mut subscription) => {
                log::debug!("subscribed to changes of session {}", id);
                // updates pushed while unsubscribed are lost, catch up from the row
                if reconnecting {
                    let resync = tokio::select! {
                        _ = cancel.cancelled() => return,
                        result = store.fetch_position(&id) => result,
                    };
                    match resync {
                        Ok(Some(position)) => {
                            state.send_replace(SessionViewState::found(position));
                        }
                        Ok(None) => log::debug!("session {} has no position to resync", id),
                        Err(why) => log::warn!("could not resync session {}: {}", id, why),
                    }
                }
                let outcome = follow(&mut subscription, &state, &cancel).await;
                subscription.close();
                match outcome {
                    FollowOutcome::Cancelled => return,
                    FollowOutcome::Ended { delivered } => {
                        log::warn!(
                            "subscription of session {} ended after {} updates",
                            id,
                            delivered
                        );
                        if delivered > 0 {
                            failures = 0;
                            backoff = Duration::ZERO;
                        }
                    }
                }
            }
            Err(why) => {
                log::warn!("could not subscribe to session {}: {}", id, why);
            }
        }

        reconnecting = true;
        failures += 1;
        if failures > config.resubscribe_attempts {
            log::error!(
                "giving up on session {} after {} failed subscriptions",
                id,
                failures
            );
            return;
        }
        backoff = config.backoff(backoff);
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = time::sleep(backoff) => {}
        }
    }
}

/// Keeps at most one live session open and switches between ids.
pub struct TrackingViewer<S: SessionStore + ?Sized> {
    store: Arc<S>,
    config: TrackingConfig,
    current: Option<LiveSessionHandle>,
}

impl<S: SessionStore + ?Sized> TrackingViewer<S> {
    pub fn new(store: Arc<S>, config: TrackingConfig) -> Self {
        Self {
            store,
            config,
            current: None,
        }
    }

    pub fn current(&self) -> Option<&LiveSessionHandle> {
        self.current.as_ref()
    }

    /// Closes the session of another id before the new one is opened.
    pub async fn switch_to(&mut self, id: SessionId) -> Result<&LiveSessionHandle, MapError> {
        let handle = match self.current.take() {
            Some(handle) if handle.id() == &id => handle,
            previous => {
                if let Some(previous) = previous {
                    previous.close().await?;
                }
                open_live_session(self.store.clone(), id, self.config.clone())
            }
        };
        Ok(&*self.current.insert(handle))
    }

    pub async fn close(&mut self) -> Result<(), MapError> {
        match self.current.take() {
            Some(handle) => handle.close().await,
            None => Ok(()),
        }
    }
}
