//! Camera motion policy.
//!
//! The first fix after being uninitialized flies (pan + zoom), every later
//! fix pans. Losing the position re-arms the fly. An explicit recenter,
//! signalled by a changed [`RecenterToken`], always flies, independent of
//! whether the position moved.

use model::position::{Bounds, Position};
use serde::{Deserialize, Serialize};

use crate::{
    config::ViewportConfig,
    engine::{Camera, CameraMotion},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ViewportState {
    Uninitialized,
    FirstFixFlown,
    Tracking,
}

/// Value the caller changes whenever the user asks to recenter. Only a
/// change in value triggers a fly, repeating the same token does nothing.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct RecenterToken(pub u64);

impl RecenterToken {
    pub fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

pub struct ViewportController<C: Camera> {
    camera: C,
    config: ViewportConfig,
    state: ViewportState,
    position: Option<Position>,
    recenter_token: RecenterToken,
}

impl<C: Camera> ViewportController<C> {
    /// Takes ownership of the camera and shows the configured default view.
    pub fn new(camera: C, config: ViewportConfig) -> Self {
        let mut controller = Self {
            camera,
            state: ViewportState::Uninitialized,
            position: None,
            recenter_token: RecenterToken::default(),
            config,
        };
        controller.apply(CameraMotion::SetView {
            center: controller.config.default_center,
            zoom: controller.config.default_zoom,
        });
        controller
    }

    pub fn state(&self) -> ViewportState {
        self.state
    }

    pub fn position(&self) -> Option<Position> {
        self.position
    }

    pub fn camera(&self) -> &C {
        &self.camera
    }

    pub fn config(&self) -> &ViewportConfig {
        &self.config
    }

    /// Flies to the first fix. Does nothing once initialized.
    pub fn initialize(&mut self, position: Position) -> Option<CameraMotion> {
        if self.state != ViewportState::Uninitialized {
            return None;
        }
        self.position = Some(position);
        self.state = ViewportState::FirstFixFlown;
        let motion = CameraMotion::Fly {
            target: position,
            zoom: self.config.target_zoom,
            duration: self.config.fly_duration,
        };
        self.apply(motion.clone());
        Some(motion)
    }

    /// Pans to an organic fix, or flies if this is the first one.
    pub fn update(&mut self, position: Position) -> CameraMotion {
        if let Some(motion) = self.initialize(position) {
            return motion;
        }
        self.position = Some(position);
        self.state = ViewportState::Tracking;
        let motion = CameraMotion::Pan { target: position };
        self.apply(motion.clone());
        motion
    }

    /// Feeds a possibly absent position. Absence re-arms the initial fly.
    pub fn observe(&mut self, position: Option<Position>) -> Option<CameraMotion> {
        match position {
            Some(position) => Some(self.update(position)),
            None => {
                self.reset();
                None
            }
        }
    }

    pub fn reset(&mut self) {
        if self.state != ViewportState::Uninitialized {
            log::debug!("position lost, re-arming initial fly");
        }
        self.state = ViewportState::Uninitialized;
        self.position = None;
    }

    /// Forces a fly to the current position when `token` differs from the
    /// last one seen. Without a position the token is only recorded.
    pub fn recenter(&mut self, token: RecenterToken) -> Option<CameraMotion> {
        if token == self.recenter_token {
            return None;
        }
        self.recenter_token = token;
        let position = self.position?;
        let motion = CameraMotion::Fly {
            target: position,
            zoom: self.config.target_zoom,
            duration: self.config.recenter_duration,
        };
        self.apply(motion.clone());
        Some(motion)
    }

    /// Frames all positions. An empty list is a no-op.
    pub fn fit_bounds(&mut self, positions: &[Position]) -> Option<CameraMotion> {
        let Some(bounds) = Bounds::containing(positions) else {
            log::debug!("ignoring fit to empty bounds");
            return None;
        };
        let motion = CameraMotion::FitBounds {
            bounds,
            padding: self.config.fit_padding,
        };
        self.apply(motion.clone());
        Some(motion)
    }

    fn apply(&mut self, motion: CameraMotion) {
        log::trace!("camera motion: {:?}", motion);
        motion.apply(&mut self.camera);
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use proptest::prelude::*;

    use super::*;

    fn controller() -> ViewportController<Vec<CameraMotion>> {
        ViewportController::new(Vec::new(), ViewportConfig::default())
    }

    fn motions(controller: &ViewportController<Vec<CameraMotion>>) -> &[CameraMotion] {
        // skip the initial set view
        &controller.camera()[1..]
    }

    #[test]
    fn starts_on_default_view() {
        let controller = controller();
        assert_eq!(
            controller.camera().as_slice(),
            &[CameraMotion::SetView {
                center: Position::new(20.5937, 78.9629),
                zoom: 5.0
            }]
        );
        assert_eq!(controller.state(), ViewportState::Uninitialized);
    }

    #[test]
    fn first_fix_flies_then_pans() {
        let mut controller = controller();
        let first = controller.update(Position::new(10.0, 76.0));
        assert_eq!(
            first,
            CameraMotion::Fly {
                target: Position::new(10.0, 76.0),
                zoom: 16.0,
                duration: Duration::from_millis(1500),
            }
        );
        assert_eq!(controller.state(), ViewportState::FirstFixFlown);

        let second = controller.update(Position::new(10.01, 76.01));
        assert_eq!(
            second,
            CameraMotion::Pan {
                target: Position::new(10.01, 76.01)
            }
        );
        assert_eq!(controller.state(), ViewportState::Tracking);
    }

    #[test]
    fn initialize_only_acts_once() {
        let mut controller = controller();
        assert!(controller.initialize(Position::new(1.0, 1.0)).is_some());
        assert!(controller.initialize(Position::new(2.0, 2.0)).is_none());
        assert_eq!(motions(&controller).len(), 1);
    }

    #[test]
    fn losing_the_position_rearms_the_fly() {
        let mut controller = controller();
        controller.observe(Some(Position::new(1.0, 1.0)));
        controller.observe(Some(Position::new(1.1, 1.1)));
        assert_eq!(controller.observe(None), None);
        assert_eq!(controller.state(), ViewportState::Uninitialized);
        let motion = controller.observe(Some(Position::new(1.2, 1.2))).unwrap();
        assert!(motion.is_fly());
    }

    #[test]
    fn recenter_flies_even_without_movement() {
        let mut controller = controller();
        let position = Position::new(12.9, 77.6);
        controller.update(position);
        controller.update(position);

        let motion = controller.recenter(RecenterToken(1)).unwrap();
        assert_eq!(
            motion,
            CameraMotion::Fly {
                target: position,
                zoom: 16.0,
                duration: Duration::from_millis(1000),
            }
        );
        // same token again is not a request
        assert_eq!(controller.recenter(RecenterToken(1)), None);
        // organic fixes keep panning afterwards
        assert!(controller.update(position).is_pan());
    }

    #[test]
    fn recenter_without_position_only_records_the_token() {
        let mut controller = controller();
        assert_eq!(controller.recenter(RecenterToken(7)), None);
        controller.update(Position::new(0.0, 0.0));
        assert_eq!(controller.recenter(RecenterToken(7)), None);
        assert!(controller.recenter(RecenterToken(8)).is_some());
    }

    #[test]
    fn fit_bounds_frames_all_positions() {
        let mut controller = controller();
        assert_eq!(controller.fit_bounds(&[]), None);
        let motion = controller
            .fit_bounds(&[Position::new(10.0, 76.0), Position::new(11.0, 77.0)])
            .unwrap();
        assert_eq!(
            motion,
            CameraMotion::FitBounds {
                bounds: Bounds {
                    south_west: Position::new(10.0, 76.0),
                    north_east: Position::new(11.0, 77.0),
                },
                padding: (50, 50),
            }
        );
        assert_eq!(motions(&controller).len(), 1);
    }

    proptest! {
        #[test]
        fn any_fix_sequence_is_one_fly_then_pans(
            fixes in prop::collection::vec((-90.0f64..90.0, -180.0f64..180.0), 1..50)
        ) {
            let mut controller = controller();
            for (latitude, longitude) in &fixes {
                controller.observe(Some(Position::new(*latitude, *longitude)));
            }
            let motions = motions(&controller);
            prop_assert_eq!(motions.len(), fixes.len());
            prop_assert!(motions[0].is_fly());
            prop_assert!(motions[1..].iter().all(CameraMotion::is_pan));
        }
    }
}
