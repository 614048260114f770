use std::convert::Infallible;

use axum::{
    extract::{Path, State},
    response::sse::{Event, KeepAlive, Sse},
    routing::{get, on},
    Router,
};
use axum_extra::TypedHeader;
use futures::stream::{Stream, StreamExt};
use live_map::{
    open_live_session,
    tracking::{external_map_link, updated_label},
    SessionViewState,
};
use model::session::{SessionId, TrackingSession};
use serde::Serialize;
use tokio_stream::wrappers::WatchStream;
use tower_http::trace::TraceLayer;

use crate::{
    common::{route_not_found, METHOD_FILTER_ALL},
    WebState,
};

pub(crate) fn routes(state: WebState) -> Router {
    Router::new()
        .route("/:id", get(sse_handler))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .fallback_service(on(METHOD_FILTER_ALL, route_not_found))
}

/// One server sent event per published session state.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct TrackEvent {
    session: TrackingSession,
    map_link: Option<String>,
    updated_label: Option<String>,
}

impl TrackEvent {
    fn new(id: &SessionId, state: &SessionViewState) -> Self {
        Self {
            session: state.to_session(id.clone()),
            map_link: state.position().map(external_map_link),
            updated_label: state.last_updated().as_ref().map(updated_label),
        }
    }

    fn into_event(self) -> Event {
        let status = self.session.status;
        Event::default()
            .event("session")
            .json_data(self)
            .unwrap_or_else(|why| {
                log::error!("could not serialize session event: {}", why);
                Event::default().comment(format!("{:?}", status))
            })
    }
}

async fn sse_handler(
    TypedHeader(user_agent): TypedHeader<headers::UserAgent>,
    State(WebState {
        database,
        map_config,
        ..
    }): State<WebState>,
    Path(id): Path<String>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    log::info!("`{}` is following session {}", user_agent.as_str(), id);

    let id = SessionId::new(id);
    let handle = open_live_session(database, id.clone(), map_config.tracking);

    // the session lives exactly as long as the client stays connected
    let stream = WatchStream::new(handle.watch()).map(move |state| {
        let event = TrackEvent::new(handle.id(), &state);
        Ok::<_, Infallible>(event.into_event())
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
