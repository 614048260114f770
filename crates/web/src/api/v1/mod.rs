use axum::{
    routing::{get, on},
    Router,
};
use model::{hazard::HazardReport, session::TrackingSession};

use crate::{
    common::{route_not_found, schema, METHOD_FILTER_ALL},
    WebState,
};

mod hazards;
mod track;

pub(crate) fn routes(state: WebState) -> Router {
    Router::new()
        .nest_service("/track", track::routes(state.clone()))
        .nest_service("/hazards", hazards::routes(state.clone()))
        .route("/schema/session", get(schema::<TrackingSession>))
        .route("/schema/hazard", get(schema::<HazardReport>))
        .with_state(state)
        .fallback_service(on(METHOD_FILTER_ALL, route_not_found))
}
