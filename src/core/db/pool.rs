//! PostgreSQL pool for the users table
//!
//! The pool is sized from `DATABASE_MAX_CONNECTIONS` and the embedded
//! migrations run once before the server accepts requests.

use sqlx::{PgPool, postgres::PgPoolOptions};
use std::time::Duration;

use crate::core::config::Config;

/// Connections kept open while idle
const MIN_CONNECTIONS: u32 = 1;

/// How long a request waits for a free connection
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(30);

/// Idle connections above the minimum are closed after this
const IDLE_TIMEOUT: Duration = Duration::from_secs(600);

/// Pool settings taken from the application config
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub database_url: String,
    pub max_connections: u32,
}

impl DbConfig {
    /// Fails when `DATABASE_URL` is unset, since the service cannot run without it
    pub fn from_config(config: &Config) -> Result<Self, DbError> {
        let database_url = config
            .database_url
            .clone()
            .ok_or(DbError::MissingDatabaseUrl)?;

        Ok(Self {
            database_url,
            max_connections: config.database_max_connections,
        })
    }
}

/// Database errors
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("DATABASE_URL environment variable not set")]
    MissingDatabaseUrl,

    #[error("Failed to connect to database: {0}")]
    ConnectionError(#[from] sqlx::Error),

    #[error("Failed to run migrations: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),
}

async fn connect(config: &DbConfig) -> Result<PgPool, DbError> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(MIN_CONNECTIONS.min(config.max_connections))
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .idle_timeout(IDLE_TIMEOUT)
        .connect(&config.database_url)
        .await?;

    tracing::info!(
        "Connected to database (max {} connections)",
        config.max_connections
    );
    Ok(pool)
}

/// Connect and bring the schema up to date
pub async fn create_pool_with_migrations(config: &DbConfig) -> Result<PgPool, DbError> {
    let pool = connect(config).await?;

    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Database migrations completed successfully");

    Ok(pool)
}

/// Round-trip a trivial query
pub async fn health_check(pool: &PgPool) -> Result<(), DbError> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}
