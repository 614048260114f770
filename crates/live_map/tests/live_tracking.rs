use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use async_trait::async_trait;
use futures::{stream, StreamExt};
use live_map::{
    config::{TrackingConfig, ViewportConfig},
    engine::{CameraMotion, Scene},
    markers::IconSet,
    open_live_session,
    store::{memory::MemoryStore, PositionChange, SessionStore, StoreResult, Subscription},
    view::TrackingView,
    SessionViewState, TrackingViewer,
};
use model::{position::Position, session::SessionId};
use tokio::{sync::watch, time};

async fn wait_until<F>(
    states: &mut watch::Receiver<SessionViewState>,
    predicate: F,
) -> SessionViewState
where
    F: Fn(&SessionViewState) -> bool,
{
    time::timeout(Duration::from_secs(5), async {
        loop {
            {
                let state = states.borrow_and_update();
                if predicate(&state) {
                    return state.clone();
                }
            }
            if states.changed().await.is_err() {
                return states.borrow().clone();
            }
        }
    })
    .await
    .expect("session state in time")
}

async fn wait_for_subscribers(store: &MemoryStore, count: usize) {
    time::timeout(Duration::from_secs(5), async {
        while store.subscriber_count() != count {
            time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("subscribers in time")
}

#[tokio::test]
async fn missing_session_is_not_found() {
    let store = Arc::new(MemoryStore::new());
    let handle = open_live_session(store.clone(), SessionId::from("s1"), TrackingConfig::default());
    let mut states = handle.watch();

    let state = wait_until(&mut states, |state| state != &SessionViewState::Loading).await;
    assert_eq!(state, SessionViewState::NotFound);
    assert_eq!(handle.state().position(), None);
    // terminal, nothing subscribed
    assert_eq!(store.subscriber_count(), 0);
    handle.close().await.unwrap();
}

#[tokio::test]
async fn failed_read_is_not_found() {
    let store = Arc::new(MemoryStore::new());
    store.insert(SessionId::from("s1"), Position::new(1.0, 1.0));
    store.set_unavailable(true);
    let handle = open_live_session(store, SessionId::from("s1"), TrackingConfig::default());
    let mut states = handle.watch();
    let state = wait_until(&mut states, |state| state != &SessionViewState::Loading).await;
    assert_eq!(state, SessionViewState::NotFound);
    handle.close().await.unwrap();
}

#[tokio::test]
async fn pushed_updates_pan_without_a_second_fly() {
    let store = Arc::new(MemoryStore::new());
    let id = SessionId::from("s2");
    store.insert(id.clone(), Position::new(10.0, 76.0));

    let handle = open_live_session(store.clone(), id.clone(), TrackingConfig::default());
    let mut states = handle.watch();
    let mut view: TrackingView<Vec<CameraMotion>, Vec<Scene>> = TrackingView::new(
        Vec::new(),
        Vec::new(),
        ViewportConfig::default(),
        IconSet::default(),
    );

    let first = wait_until(&mut states, |state| state.position().is_some()).await;
    assert_eq!(first.position(), Some(Position::new(10.0, 76.0)));
    view.apply(first.clone());

    wait_for_subscribers(&store, 1).await;
    time::sleep(Duration::from_millis(5)).await;
    assert!(store.update(id.clone(), Position::new(10.01, 76.01)));

    let second = wait_until(&mut states, |state| {
        state.position() == Some(Position::new(10.01, 76.01))
    })
    .await;
    assert!(second.last_updated() > first.last_updated());
    view.apply(second);

    let motions: Vec<_> = view.viewport().camera()[1..].to_vec();
    assert_eq!(motions.len(), 2);
    assert!(motions[0].is_fly());
    assert_eq!(
        motions[1],
        CameraMotion::Pan {
            target: Position::new(10.01, 76.01)
        }
    );

    handle.close().await.unwrap();
    wait_for_subscribers(&store, 0).await;
}

#[tokio::test]
async fn switching_ids_releases_the_old_subscription_first() {
    let store = Arc::new(MemoryStore::new());
    let s3 = SessionId::from("s3");
    let s4 = SessionId::from("s4");
    store.insert(s3.clone(), Position::new(1.0, 1.0));
    store.insert(s4.clone(), Position::new(2.0, 2.0));

    let mut viewer = TrackingViewer::new(store.clone(), TrackingConfig::default());
    let mut states = viewer.switch_to(s3.clone()).await.unwrap().watch();
    wait_until(&mut states, |state| state.position().is_some()).await;
    wait_for_subscribers(&store, 1).await;

    // same id keeps the open session
    viewer.switch_to(s3.clone()).await.unwrap();
    assert_eq!(store.subscriber_count(), 1);

    let mut states = viewer.switch_to(s4.clone()).await.unwrap().watch();
    // the s3 subscription is gone before s4 subscribes
    assert!(store.subscriber_count() <= 1);
    let state = wait_until(&mut states, |state| state.position().is_some()).await;
    assert_eq!(state.position(), Some(Position::new(2.0, 2.0)));
    wait_for_subscribers(&store, 1).await;

    store.update(s3, Position::new(9.0, 9.0));
    store.update(s4.clone(), Position::new(2.5, 2.5));
    let state = wait_until(&mut states, |state| {
        state.position() == Some(Position::new(2.5, 2.5))
    })
    .await;
    assert_eq!(viewer.current().unwrap().id(), &s4);
    assert_eq!(state.position(), Some(Position::new(2.5, 2.5)));

    viewer.close().await.unwrap();
    wait_for_subscribers(&store, 0).await;
}

/// A store whose initial read never completes.
struct PendingStore;

#[async_trait]
impl SessionStore for PendingStore {
    async fn fetch_position(&self, _id: &SessionId) -> StoreResult<Option<Position>> {
        futures::future::pending().await
    }

    async fn subscribe(&self, id: &SessionId) -> StoreResult<Subscription> {
        Ok(Subscription::new(id.clone(), stream::empty::<PositionChange>().boxed()))
    }
}

#[tokio::test]
async fn unresolved_read_stays_loading_without_timeout() {
    let handle = open_live_session(
        Arc::new(PendingStore),
        SessionId::from("s5"),
        TrackingConfig::default(),
    );
    time::sleep(Duration::from_millis(50)).await;
    assert_eq!(handle.state(), SessionViewState::Loading);
    // closing cancels the pending read
    time::timeout(Duration::from_secs(1), handle.close())
        .await
        .expect("close in time")
        .unwrap();
}

#[tokio::test]
async fn read_timeout_ends_in_not_found() {
    let config = TrackingConfig {
        initial_read_timeout: Some(Duration::from_millis(20)),
        ..TrackingConfig::default()
    };
    let handle = open_live_session(Arc::new(PendingStore), SessionId::from("s6"), config);
    let mut states = handle.watch();
    let state = wait_until(&mut states, |state| state != &SessionViewState::Loading).await;
    assert_eq!(state, SessionViewState::NotFound);
    handle.close().await.unwrap();
}

/// Serves a fixed position but every subscription ends right away.
struct DroppingStore {
    subscriptions: AtomicUsize,
}

#[async_trait]
impl SessionStore for DroppingStore {
    async fn fetch_position(&self, _id: &SessionId) -> StoreResult<Option<Position>> {
        Ok(Some(Position::new(3.0, 3.0)))
    }

    async fn subscribe(&self, id: &SessionId) -> StoreResult<Subscription> {
        self.subscriptions.fetch_add(1, Ordering::SeqCst);
        Ok(Subscription::new(id.clone(), stream::empty::<PositionChange>().boxed()))
    }
}

#[tokio::test]
async fn lost_subscriptions_are_retried_a_bounded_number_of_times() {
    let store = Arc::new(DroppingStore {
        subscriptions: AtomicUsize::new(0),
    });
    let config = TrackingConfig {
        initial_read_timeout: None,
        resubscribe_attempts: 2,
        resubscribe_backoff: Duration::from_millis(5),
    };
    let handle = open_live_session(store.clone(), SessionId::from("s7"), config);
    let mut states = handle.watch();

    // the task ends once it gives up, closing the state channel
    time::timeout(Duration::from_secs(5), async {
        while states.changed().await.is_ok() {}
    })
    .await
    .expect("task gives up in time");

    assert_eq!(store.subscriptions.load(Ordering::SeqCst), 3);
    // the last known position stays visible
    assert_eq!(handle.state().position(), Some(Position::new(3.0, 3.0)));
    handle.close().await.unwrap();
}

/// The row moves while the first subscription is down; later
/// subscriptions stay open without delivering anything.
struct GapStore {
    row: std::sync::Mutex<Position>,
    subscriptions: AtomicUsize,
}

#[async_trait]
impl SessionStore for GapStore {
    async fn fetch_position(&self, _id: &SessionId) -> StoreResult<Option<Position>> {
        Ok(Some(*self.row.lock().unwrap()))
    }

    async fn subscribe(&self, id: &SessionId) -> StoreResult<Subscription> {
        let changes = if self.subscriptions.fetch_add(1, Ordering::SeqCst) == 0 {
            *self.row.lock().unwrap() = Position::new(2.0, 2.0);
            stream::empty::<PositionChange>().boxed()
        } else {
            stream::pending::<PositionChange>().boxed()
        };
        Ok(Subscription::new(id.clone(), changes))
    }
}

#[tokio::test]
async fn resubscribing_catches_up_with_the_stored_position() {
    let store = Arc::new(GapStore {
        row: std::sync::Mutex::new(Position::new(1.0, 1.0)),
        subscriptions: AtomicUsize::new(0),
    });
    let config = TrackingConfig {
        initial_read_timeout: None,
        resubscribe_attempts: 2,
        resubscribe_backoff: Duration::from_millis(5),
    };
    let handle = open_live_session(store.clone(), SessionId::from("s8"), config);
    let mut states = handle.watch();

    let state = wait_until(&mut states, |state| {
        state.position() == Some(Position::new(2.0, 2.0))
    })
    .await;
    assert_eq!(state.position(), Some(Position::new(2.0, 2.0)));
    assert_eq!(store.subscriptions.load(Ordering::SeqCst), 2);
    handle.close().await.unwrap();
}
