use std::{env, error, result, sync::Arc};

use async_trait::async_trait;
use listener::{FeedTask, SessionFeed};
use live_map::store::{SessionStore, StoreError, StoreResult, Subscription};
use model::{
    hazard::HazardReport,
    position::Position,
    session::SessionId,
};
use sqlx::postgres::PgListener;
use thiserror::Error;
use utility::id::Id;

pub mod data_model;
pub mod listener;
pub mod queries;

/// Channel the `sos_sessions` trigger publishes row changes on.
pub const SESSION_CHANNEL: &str = "sos_sessions_update";

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("row not found")]
    NotFound,
    #[error("migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error("database error: {0}")]
    Other(Box<dyn error::Error + Send + Sync>),
}

pub type Result<T> = result::Result<T, DatabaseError>;

impl From<DatabaseError> for StoreError {
    fn from(value: DatabaseError) -> Self {
        match value {
            DatabaseError::NotFound => StoreError::NotFound,
            other => StoreError::other(other),
        }
    }
}

pub struct DatabaseConnectionInfo {
    pub username: String,
    pub password: String,
    pub hostname: String,
    pub port: u16,
    pub database: String,
}

impl DatabaseConnectionInfo {
    pub fn from_env() -> Option<Self> {
        let username = env::var("DATABASE_USER").ok()?;
        let password = env::var("DATABASE_PASSWORD").ok()?;
        let hostname = env::var("DATABASE_HOST").ok()?;
        let port: u16 = env::var("DATABASE_PORT").ok()?.parse().ok()?;
        let database = env::var("DATABASE_NAME").ok()?;
        Some(Self {
            username,
            password,
            hostname,
            port,
            database,
        })
    }

    pub(crate) fn postgres_url(self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.username, self.password, self.hostname, self.port, self.database
        )
    }
}

/// Cheap to clone, clones share the pool and the session feed.
#[derive(Clone)]
pub struct PgDatabase {
    connection: sqlx::PgPool,
    sessions: Arc<SessionFeed>,
    _feed_task: Arc<FeedTask>,
}

impl PgDatabase {
    pub async fn connect(database_connection_info: DatabaseConnectionInfo) -> Result<Self> {
        let url = database_connection_info.postgres_url();
        let pool = sqlx::postgres::PgPool::connect(&url)
            .await
            .map_err(queries::convert_error)?;

        sqlx::migrate!("./migrations").run(&pool).await?;
        log::info!("connected to database, migrations applied");

        // dedicated connection, subscriptions never take from the pool
        let mut listener = PgListener::connect(&url)
            .await
            .map_err(queries::convert_error)?;
        listener
            .listen(SESSION_CHANNEL)
            .await
            .map_err(queries::convert_error)?;
        let sessions = Arc::new(SessionFeed::new());
        let feed_task = FeedTask::spawn(listener, sessions.clone());
        log::debug!("listening on {}", SESSION_CHANNEL);

        Ok(Self {
            connection: pool,
            sessions,
            _feed_task: Arc::new(feed_task),
        })
    }

    /// All hazard reports, newest first. Rows that do not form a valid
    /// report are skipped.
    pub async fn reviews(&self) -> Result<Vec<HazardReport>> {
        queries::review::get_all(&self.connection).await
    }

    pub async fn review(&self, id: Id<HazardReport>) -> Result<HazardReport> {
        queries::review::get(&self.connection, id).await
    }
}

#[async_trait]
impl SessionStore for PgDatabase {
    async fn fetch_position(&self, id: &SessionId) -> StoreResult<Option<Position>> {
        Ok(queries::session::position(&self.connection, id).await?)
    }

    async fn subscribe(&self, id: &SessionId) -> StoreResult<Subscription> {
        let subscription = self.sessions.subscribe(id);
        log::debug!(
            "subscribed session {} to the shared feed, {} open",
            id,
            self.sessions.subscriber_count()
        );
        Ok(subscription)
    }
}
