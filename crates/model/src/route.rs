use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{position::Position, ModelError};

/// One instruction of a route. `way_points` index into the geometry of the
/// route option the step belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RouteStep {
    pub instruction: String,
    /// meters
    pub distance: f64,
    /// seconds
    pub duration: f64,
    #[serde(rename = "type")]
    pub maneuver_type: u16,
    pub way_points: (usize, usize),
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct RawRouteOption {
    geometry: Vec<Position>,
    distance: f64,
    duration: f64,
    #[serde(default)]
    steps: Vec<RouteStep>,
}

/// A precomputed route candidate. The geometry is never empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", try_from = "RawRouteOption")]
pub struct RouteOption {
    geometry: Vec<Position>,
    distance: f64,
    duration: f64,
    steps: Vec<RouteStep>,
}

impl RouteOption {
    pub fn new(
        geometry: Vec<Position>,
        distance: f64,
        duration: f64,
        steps: Vec<RouteStep>,
    ) -> Result<Self, ModelError> {
        if geometry.is_empty() {
            return Err(ModelError::EmptyGeometry);
        }
        let len = geometry.len();
        if let Some(step) = steps
            .iter()
            .find(|step| step.way_points.0 >= len || step.way_points.1 >= len)
        {
            return Err(ModelError::WaypointOutOfRange {
                index: step.way_points.0.max(step.way_points.1),
                len,
            });
        }
        Ok(Self {
            geometry,
            distance,
            duration,
            steps,
        })
    }

    pub fn geometry(&self) -> &[Position] {
        &self.geometry
    }

    pub fn distance(&self) -> f64 {
        self.distance
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn steps(&self) -> &[RouteStep] {
        &self.steps
    }

    pub fn start(&self) -> Position {
        self.geometry[0]
    }

    pub fn end(&self) -> Position {
        self.geometry[self.geometry.len() - 1]
    }

    /// The position a step begins at.
    pub fn step_start(&self, step: &RouteStep) -> Position {
        self.geometry[step.way_points.0]
    }
}

impl TryFrom<RawRouteOption> for RouteOption {
    type Error = ModelError;

    fn try_from(raw: RawRouteOption) -> Result<Self, Self::Error> {
        Self::new(raw.geometry, raw.distance, raw.duration, raw.steps)
    }
}
