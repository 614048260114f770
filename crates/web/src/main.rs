use std::sync::Arc;

use database::{DatabaseConnectionInfo, PgDatabase};
use live_map::{markers::IconSet, MapConfig};
use tracing_subscriber::EnvFilter;
use web::{start_web_server, WebConfig, WebState};

#[tokio::main]
async fn main() {
    env_logger::init();

    // request traces
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("could not install tracing subscriber.");

    // configuration
    let map_config = MapConfig::from_env().expect("invalid live map configuration in env.");
    let web_config = WebConfig::from_env().expect("invalid web configuration in env.");

    // database
    let database_connection_info = DatabaseConnectionInfo::from_env()
        .expect("expected database connection info in env.");
    let database = PgDatabase::connect(database_connection_info)
        .await
        .expect("could not connect to database.");

    // web server
    let web_future = start_web_server(
        web_config,
        WebState::new(Arc::new(database), map_config, IconSet::default()),
    );

    if let Err(why) = web_future.await {
        log::error!("web server stopped: {}", why);
    }
}
