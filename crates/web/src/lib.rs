pub use crate::common::RouteResult;

use std::{env, io, net::SocketAddr, sync::Arc};

use axum::{extract::FromRef, Router};
use database::PgDatabase;
use live_map::{markers::IconSet, markers::MarkerRenderer, MapConfig};
use thiserror::Error;
use tokio::net::TcpListener;

pub mod api;
pub mod common;

#[derive(Debug, Error)]
pub enum WebError {
    #[error("invalid bind address `{0}`")]
    InvalidBindAddress(String),
    #[error("web server failed: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Clone, PartialEq)]
pub struct WebConfig {
    pub bind: SocketAddr,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 8080)),
        }
    }
}

impl WebConfig {
    /// Reads `LIVE_MAP_BIND`, e.g. `127.0.0.1:3000`.
    pub fn from_env() -> Result<Self, WebError> {
        Self::from_bind(env::var("LIVE_MAP_BIND").ok())
    }

    fn from_bind(bind: Option<String>) -> Result<Self, WebError> {
        match bind {
            Some(bind) => bind
                .trim()
                .parse()
                .map(|bind| Self { bind })
                .map_err(|_| WebError::InvalidBindAddress(bind)),
            None => Ok(Self::default()),
        }
    }
}

#[derive(Clone, FromRef)]
pub struct WebState {
    pub database: Arc<PgDatabase>,
    pub map_config: MapConfig,
    pub markers: Arc<MarkerRenderer>,
}

impl WebState {
    pub fn new(database: Arc<PgDatabase>, map_config: MapConfig, icons: IconSet) -> Self {
        Self {
            database,
            map_config,
            markers: Arc::new(MarkerRenderer::new(icons)),
        }
    }
}

pub async fn start_web_server(config: WebConfig, state: WebState) -> Result<(), WebError> {
    let routes = Router::new().nest_service("/api", api::routes(state));

    let listener = TcpListener::bind(config.bind).await?;
    log::info!("listening on {}", config.bind);
    axum::serve(listener, routes.into_make_service()).await?;

    Ok(())
}
