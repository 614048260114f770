//! Candidate route rendering with isolation of the selected route.

use model::{
    position::Position,
    route::{RouteOption, RouteStep},
};
use serde::Serialize;

use crate::interaction::SelectionHandler;

/// Colors of unselected routes, picked by `index % 3`.
pub const ROUTE_PALETTE: [&str; 3] = ["#4F46E5", "#0D9488", "#E11D48"];
/// Color of the selected route. Deliberately not part of the palette.
pub const SELECTED_ROUTE_COLOR: &str = "#1D4ED8";
pub const DASH_PATTERN: &str = "10, 10";

#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PathStyle {
    pub color: &'static str,
    pub weight: u32,
    pub opacity: f64,
    pub dash_array: Option<&'static str>,
}

impl PathStyle {
    fn candidate(index: usize) -> Self {
        Self {
            color: ROUTE_PALETTE[index % ROUTE_PALETTE.len()],
            weight: 5,
            opacity: 0.7,
            dash_array: Some(DASH_PATTERN),
        }
    }

    fn selected() -> Self {
        Self {
            color: SELECTED_ROUTE_COLOR,
            weight: 6,
            opacity: 1.0,
            dash_array: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutePath {
    /// Index into the route list this path was rendered from.
    pub index: usize,
    pub points: Vec<Position>,
    pub style: PathStyle,
    pub selected: bool,
}

pub struct RouteLayer {
    on_select: SelectionHandler,
}

impl RouteLayer {
    pub fn new(on_select: SelectionHandler) -> Self {
        Self { on_select }
    }

    pub fn render(&self, routes: &[RouteOption], selected: Option<usize>) -> Vec<RoutePath> {
        self.render_valid(routes, valid_selection(routes, selected))
    }

    /// Like [`RouteLayer::render`] for a selection already passed through
    /// [`valid_selection`]. An index out of range still shows every route.
    pub fn render_valid(&self, routes: &[RouteOption], valid: Option<usize>) -> Vec<RoutePath> {
        match valid.and_then(|index| Some((index, routes.get(index)?))) {
            Some((index, route)) => vec![RoutePath {
                index,
                points: route.geometry().to_vec(),
                style: PathStyle::selected(),
                selected: true,
            }],
            None => routes
                .iter()
                .enumerate()
                .map(|(index, route)| RoutePath {
                    index,
                    points: route.geometry().to_vec(),
                    style: PathStyle::candidate(index),
                    selected: false,
                })
                .collect(),
        }
    }

    /// A click on a rendered path. Only invokes the selection callback.
    pub fn click(&self, path: &RoutePath) {
        (self.on_select)(path.index);
    }

    pub fn selection_handler(&self) -> SelectionHandler {
        self.on_select.clone()
    }
}

/// Out of range selections are treated as no selection.
pub fn valid_selection(routes: &[RouteOption], selected: Option<usize>) -> Option<usize> {
    match selected {
        Some(index) if index < routes.len() => Some(index),
        Some(index) => {
            log::warn!(
                "ignoring route selection {} with only {} routes",
                index,
                routes.len()
            );
            None
        }
        None => None,
    }
}

pub fn selected_steps(routes: &[RouteOption], selected: Option<usize>) -> &[RouteStep] {
    valid_selection(routes, selected)
        .map(|index| routes[index].steps())
        .unwrap_or(&[])
}

/// Start of the first step beyond the geometry point closest to `position`.
pub fn next_turn(route: &RouteOption, position: Position) -> Option<Position> {
    let nearest = route
        .geometry()
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| {
            a.distance_km(&position)
                .partial_cmp(&b.distance_km(&position))
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .map(|(index, _)| index)?;
    route
        .steps()
        .iter()
        .find(|step| step.way_points.0 > nearest)
        .map(|step| route.step_start(step))
}
