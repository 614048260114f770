//! Seams towards the map rendering engine.
//!
//! The engine draws tiles and animates the camera; this crate only decides
//! *which* camera motion happens and *what* is drawn. [`Camera`] is owned
//! exclusively by a [`ViewportController`](crate::viewport::ViewportController),
//! [`MapSurface`] receives fully rendered [`Scene`]s.

use std::time::Duration;

use model::position::{Bounds, Position};
use serde::Serialize;

use crate::{markers::Marker, routes::RoutePath};

/// Camera primitives of the rendering engine.
pub trait Camera: Send {
    /// Animated combined pan and zoom.
    fn fly_to(&mut self, target: Position, zoom: f64, duration: Duration);

    /// Animated translation, zoom stays as it is.
    fn pan_to(&mut self, target: Position);

    /// Frames `bounds` leaving `padding` pixels on each side.
    fn fit_bounds(&mut self, bounds: Bounds, padding: (u32, u32));

    /// Jumps without animation. Only used for the initial view.
    fn set_view(&mut self, center: Position, zoom: f64);
}

/// Receives every scene after it was rendered.
pub trait MapSurface: Send {
    fn draw(&mut self, scene: &Scene);
}

/// A camera motion issued by the viewport controller.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum CameraMotion {
    SetView {
        center: Position,
        zoom: f64,
    },
    Fly {
        target: Position,
        zoom: f64,
        duration: Duration,
    },
    Pan {
        target: Position,
    },
    FitBounds {
        bounds: Bounds,
        padding: (u32, u32),
    },
}

impl CameraMotion {
    pub fn apply<C: Camera + ?Sized>(&self, camera: &mut C) {
        match self {
            CameraMotion::SetView { center, zoom } => camera.set_view(*center, *zoom),
            CameraMotion::Fly {
                target,
                zoom,
                duration,
            } => camera.fly_to(*target, *zoom, *duration),
            CameraMotion::Pan { target } => camera.pan_to(*target),
            CameraMotion::FitBounds { bounds, padding } => {
                camera.fit_bounds(*bounds, *padding)
            }
        }
    }

    pub fn is_fly(&self) -> bool {
        matches!(self, CameraMotion::Fly { .. })
    }

    pub fn is_pan(&self) -> bool {
        matches!(self, CameraMotion::Pan { .. })
    }
}

/// Records motions instead of animating anything. Handy for headless use.
impl Camera for Vec<CameraMotion> {
    fn fly_to(&mut self, target: Position, zoom: f64, duration: Duration) {
        self.push(CameraMotion::Fly {
            target,
            zoom,
            duration,
        });
    }

    fn pan_to(&mut self, target: Position) {
        self.push(CameraMotion::Pan { target });
    }

    fn fit_bounds(&mut self, bounds: Bounds, padding: (u32, u32)) {
        self.push(CameraMotion::FitBounds { bounds, padding });
    }

    fn set_view(&mut self, center: Position, zoom: f64) {
        self.push(CameraMotion::SetView { center, zoom });
    }
}

/// Everything drawn on top of the base map at one point in time.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
    pub markers: Vec<Marker>,
    pub routes: Vec<RoutePath>,
    pub detail: Option<crate::markers::HazardDetail>,
}

impl MapSurface for Vec<Scene> {
    fn draw(&mut self, scene: &Scene) {
        self.push(scene.clone());
    }
}
