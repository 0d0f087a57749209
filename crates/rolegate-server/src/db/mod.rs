//! Connection pools and migrations
//!
//! The server runs two pools against the same database: the business pool
//! used by request handlers, and a small audit pool reserved for audit side
//! reads and appends (see [`pipeline`]).

pub mod pipeline;

use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use thiserror::Error;

use crate::config::Config;

/// Database operation errors with contextual information
#[derive(Error, Debug)]
pub enum DbError {
    /// SQL query or connection error
    #[error("Database query failed: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// Embedded migrations failed to apply
    #[error("Database migration failed: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    /// Database configuration is invalid or missing
    #[error("Database configuration error: {0}. Check DATABASE_URL and connection settings.")]
    Config(String),
}

impl DbError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Label used in logs to tell the pools apart
    pub name: &'static str,
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_secs: u64,
    pub idle_timeout_secs: Option<u64>,
}

impl DbConfig {
    /// Settings for the pool serving request handlers
    pub fn business(config: &Config) -> Self {
        Self {
            name: "business",
            url: config.database.url.clone(),
            max_connections: config.database.max_connections,
            min_connections: config.database.min_connections,
            connect_timeout_secs: config.database.connect_timeout_secs,
            idle_timeout_secs: Some(config.database.idle_timeout_secs),
        }
    }

    /// Settings for the dedicated audit pool
    pub fn audit(config: &Config) -> Self {
        Self {
            name: "audit",
            url: config.database.url.clone(),
            max_connections: config.audit.max_connections,
            min_connections: 1.min(config.audit.max_connections),
            connect_timeout_secs: config.database.connect_timeout_secs,
            idle_timeout_secs: Some(config.database.idle_timeout_secs),
        }
    }

    fn validate(&self) -> DbResult<()> {
        if self.url.is_empty() {
            return Err(DbError::config(format!("{} pool has no database URL", self.name)));
        }
        if self.max_connections == 0 {
            return Err(DbError::config(format!(
                "{} pool needs at least one connection",
                self.name
            )));
        }
        Ok(())
    }
}

pub async fn create_pool(config: &DbConfig) -> DbResult<PgPool> {
    config.validate()?;

    let mut options = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.connect_timeout_secs));

    if let Some(idle_timeout) = config.idle_timeout_secs {
        options = options.idle_timeout(Duration::from_secs(idle_timeout));
    }

    let pool = options.connect(&config.url).await?;

    tracing::info!(
        pool = config.name,
        max_connections = config.max_connections,
        min_connections = config.min_connections,
        "Database connection pool created"
    );

    Ok(pool)
}

/// Apply the embedded migrations from the workspace `migrations/` directory
pub async fn run_migrations(pool: &PgPool) -> DbResult<()> {
    sqlx::migrate!("../../migrations").run(pool).await?;
    tracing::info!("Database migrations completed");
    Ok(())
}

pub async fn health_check(pool: &PgPool) -> DbResult<()> {
    sqlx::query("SELECT 1")
        .execute(pool)
        .await
        .map(|_| ())
        .map_err(DbError::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_configs_follow_config() {
        let mut config = Config::default();
        config.database.max_connections = 12;
        config.audit.max_connections = 3;

        let business = DbConfig::business(&config);
        let audit = DbConfig::audit(&config);

        assert_eq!(business.max_connections, 12);
        assert_eq!(audit.max_connections, 3);
        assert_eq!(audit.min_connections, 1);
        assert_eq!(business.url, audit.url);
    }

    #[tokio::test]
    async fn test_create_pool_rejects_empty_pool() {
        let mut config = DbConfig::audit(&Config::default());
        config.max_connections = 0;

        let err = create_pool(&config).await.unwrap_err();
        assert!(matches!(err, DbError::Config(_)));
    }
}
