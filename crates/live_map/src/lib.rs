pub use crate::{
    config::{MapConfig, TrackingConfig, ViewportConfig},
    engine::{Camera, CameraMotion, MapSurface, Scene},
    tracking::{open_live_session, LiveSessionHandle, SessionViewState, TrackingViewer},
    viewport::{RecenterToken, ViewportController},
};

use thiserror::Error;

pub mod config;
pub mod engine;
pub mod interaction;
pub mod markers;
pub mod routes;
pub mod store;
pub mod tracking;
pub mod view;
pub mod viewport;

#[derive(Debug, Error)]
pub enum MapError {
    #[error("invalid value `{value}` for {key}")]
    InvalidConfig { key: &'static str, value: String },
    #[error("live session task failed: {0}")]
    SessionTask(#[from] tokio::task::JoinError),
}
