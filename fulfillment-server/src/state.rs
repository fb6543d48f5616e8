//! Application state

use sqlx::SqlitePool;
use std::sync::Arc;

use crate::config::Config;
use crate::db::DbService;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// SQLite connection pool
    pub pool: SqlitePool,
    pub config: Arc<Config>,
}

impl AppState {
    /// Open the database and build the state
    pub async fn new(config: &Config) -> Result<Self, BoxError> {
        let db = DbService::new(&config.database_url).await?;
        Ok(Self::with_pool(db.pool, config.clone()))
    }

    pub fn with_pool(pool: SqlitePool, config: Config) -> Self {
        Self {
            pool,
            config: Arc::new(config),
        }
    }
}
