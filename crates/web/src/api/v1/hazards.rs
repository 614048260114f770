use axum::{
    extract::{OriginalUri, Path, State},
    http::Method,
    routing::{get, on},
    Json, Router,
};
use live_map::markers::{HazardDetail, Marker, MarkerInputs, MarkerRenderer};
use model::hazard::HazardReport;
use utility::id::Id;

use crate::{
    common::{route_not_found, RouteErrorResponse, RouteResult, VecResponse, METHOD_FILTER_ALL},
    WebState,
};

pub(crate) fn routes(state: WebState) -> Router {
    Router::new()
        .route("/", get(hazard_markers))
        .route("/:id", get(hazard_detail))
        .with_state(state)
        .fallback_service(on(METHOD_FILTER_ALL, route_not_found))
}

/// Reports with malformed coordinates are left out.
fn render_hazards(markers: &MarkerRenderer, reports: &[HazardReport]) -> Vec<Marker> {
    markers.render(&MarkerInputs {
        hazards: reports,
        ..Default::default()
    })
}

async fn hazard_markers(
    OriginalUri(original_uri): OriginalUri,
    State(WebState {
        database, markers, ..
    }): State<WebState>,
) -> RouteResult<Json<VecResponse<Marker>>> {
    let reports = database.reviews().await.map_err(|why| {
        RouteErrorResponse::from(why)
            .with_method(&Method::GET)
            .with_message("Could not query hazard reports.")
            .with_uri(original_uri.path())
    })?;
    log::debug!("rendering {} hazard reports", reports.len());
    Ok(VecResponse::non_paginated(render_hazards(&markers, &reports)).json())
}

async fn hazard_detail(
    OriginalUri(original_uri): OriginalUri,
    State(WebState {
        database, markers, ..
    }): State<WebState>,
    Path(id): Path<String>,
) -> RouteResult<Json<HazardDetail>> {
    let report = database
        .review(Id::new(id))
        .await
        .map_err(|why| {
            RouteErrorResponse::from(why)
                .with_method(&Method::GET)
                .with_uri(original_uri.path())
        })?;
    Ok(Json(markers.hazard_detail(&report)))
}

#[cfg(test)]
mod tests {
    use live_map::markers::{IconSet, MarkerKind};
    use model::ExampleData;

    use super::*;

    #[test]
    fn renders_only_reports_with_coordinates() {
        let valid = HazardReport::example_data();
        let malformed = HazardReport {
            id: Id::from("broken"),
            coordinates: Some("abc,77.6".to_owned()),
            ..HazardReport::example_data()
        };
        let missing = HazardReport {
            id: Id::from("missing"),
            coordinates: None,
            ..HazardReport::example_data()
        };

        let markers = render_hazards(
            &MarkerRenderer::new(IconSet::default()),
            &[valid.clone(), malformed, missing],
        );
        assert_eq!(markers.len(), 1);
        assert_eq!(markers[0].kind, MarkerKind::Hazard(valid.id));
    }
}
