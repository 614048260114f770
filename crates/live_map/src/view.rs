//! The two composed views: trip planning and live tracking.

use std::sync::Arc;

use model::{
    hazard::HazardReport,
    position::Position,
    route::{RouteOption, RouteStep},
};
use tokio::sync::watch;

use crate::{
    config::ViewportConfig,
    engine::{Camera, CameraMotion, MapSurface, Scene},
    interaction::{InteractionBridge, MapEvent},
    markers::{HazardDetail, IconSet, MarkerInputs, MarkerKind, MarkerRenderer},
    routes::{self, RouteLayer},
    tracking::SessionViewState,
    viewport::{RecenterToken, ViewportController, ViewportState},
};

/// Inputs of the trip planning view. Each is processed on its own, in the
/// order they arrive.
#[derive(Debug, Clone)]
pub enum PlanningEvent {
    Position(Option<Position>),
    Recenter(RecenterToken),
    Routes(Vec<RouteOption>),
    SelectRoute(Option<usize>),
    FitBounds(Vec<Position>),
    Endpoints {
        start: Option<Position>,
        end: Option<Position>,
    },
    Picked(Option<Position>),
    Hazards(Vec<HazardReport>),
    Interaction(MapEvent),
    CloseDetail,
}

#[derive(Default)]
struct PlanningState {
    position: Option<Position>,
    routes: Vec<RouteOption>,
    selected: Option<usize>,
    start: Option<Position>,
    end: Option<Position>,
    picked: Option<Position>,
    hazards: Vec<HazardReport>,
    detail: Option<HazardDetail>,
}

pub struct TripPlanningView<C: Camera, S: MapSurface> {
    viewport: ViewportController<C>,
    markers: MarkerRenderer,
    routes: RouteLayer,
    bridge: InteractionBridge,
    surface: S,
    state: PlanningState,
}

impl<C: Camera, S: MapSurface> TripPlanningView<C, S> {
    pub fn new(
        camera: C,
        surface: S,
        config: ViewportConfig,
        icons: IconSet,
        bridge: InteractionBridge,
    ) -> Self {
        let on_select = bridge
            .route_select_handler()
            .cloned()
            .unwrap_or_else(|| Arc::new(|_| {}));
        Self {
            viewport: ViewportController::new(camera, config),
            markers: MarkerRenderer::new(icons),
            routes: RouteLayer::new(on_select),
            bridge,
            surface,
            state: PlanningState::default(),
        }
    }

    pub fn viewport(&self) -> &ViewportController<C> {
        &self.viewport
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn route_layer(&self) -> &RouteLayer {
        &self.routes
    }

    pub fn selected_steps(&self) -> &[RouteStep] {
        routes::selected_steps(&self.state.routes, self.state.selected)
    }

    /// Applies one event and redraws. Returns the camera motion it caused.
    pub fn process(&mut self, event: PlanningEvent) -> Option<CameraMotion> {
        let motion = match event {
            PlanningEvent::Position(position) => {
                self.state.position = position;
                self.viewport.observe(position)
            }
            PlanningEvent::Recenter(token) => self.viewport.recenter(token),
            PlanningEvent::FitBounds(positions) => self.viewport.fit_bounds(&positions),
            PlanningEvent::Routes(routes) => {
                self.state.routes = routes;
                None
            }
            PlanningEvent::SelectRoute(selected) => {
                self.state.selected = selected;
                None
            }
            PlanningEvent::Endpoints { start, end } => {
                self.state.start = start;
                self.state.end = end;
                None
            }
            PlanningEvent::Picked(picked) => {
                self.state.picked = picked;
                None
            }
            PlanningEvent::Hazards(hazards) => {
                self.state.hazards = hazards;
                None
            }
            PlanningEvent::Interaction(event) => {
                if let MapEvent::MarkerClick(MarkerKind::Hazard(id)) = &event {
                    self.state.detail = self
                        .state
                        .hazards
                        .iter()
                        .find(|report| &report.id == id)
                        .map(|report| self.markers.hazard_detail(report));
                }
                self.bridge.dispatch(&event);
                None
            }
            PlanningEvent::CloseDetail => {
                self.state.detail = None;
                None
            }
        };
        self.redraw();
        motion
    }

    pub fn scene(&self) -> Scene {
        let state = &self.state;
        let selected = routes::valid_selection(&state.routes, state.selected);
        let next_turn = selected
            .zip(state.position)
            .and_then(|(index, position)| routes::next_turn(&state.routes[index], position));
        let markers = self.markers.render(&MarkerInputs {
            self_position: state.position,
            start: state.start,
            end: state.end,
            picked: state.picked,
            next_turn,
            hazards: &state.hazards,
            ..Default::default()
        });
        Scene {
            markers,
            routes: self.routes.render_valid(&state.routes, selected),
            detail: state.detail.clone(),
        }
    }

    fn redraw(&mut self) {
        let scene = self.scene();
        self.surface.draw(&scene);
    }
}

/// Dedicated view following one live session.
pub struct TrackingView<C: Camera, S: MapSurface> {
    viewport: ViewportController<C>,
    markers: MarkerRenderer,
    surface: S,
    state: SessionViewState,
}

impl<C: Camera, S: MapSurface> TrackingView<C, S> {
    pub fn new(camera: C, surface: S, config: ViewportConfig, icons: IconSet) -> Self {
        Self {
            viewport: ViewportController::new(camera, config),
            markers: MarkerRenderer::new(icons),
            surface,
            state: SessionViewState::Loading,
        }
    }

    pub fn state(&self) -> &SessionViewState {
        &self.state
    }

    pub fn viewport(&self) -> &ViewportController<C> {
        &self.viewport
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn apply(&mut self, state: SessionViewState) -> Option<CameraMotion> {
        let motion = match state.position() {
            Some(position) => self.viewport.observe(Some(position)),
            // the camera keeps its last view while loading or not found
            None if self.viewport.state() == ViewportState::Uninitialized => None,
            None => self.viewport.observe(None),
        };
        let scene = Scene {
            markers: self.markers.render(&MarkerInputs {
                live_position: state.position(),
                ..Default::default()
            }),
            ..Default::default()
        };
        self.state = state;
        self.surface.draw(&scene);
        motion
    }

    /// Applies every state published for the session until it ends.
    pub async fn follow(&mut self, mut states: watch::Receiver<SessionViewState>) {
        let current = states.borrow_and_update().clone();
        self.apply(current);
        while states.changed().await.is_ok() {
            let next = states.borrow_and_update().clone();
            self.apply(next);
        }
    }
}
