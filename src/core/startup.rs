use anyhow::{Context, Result};
use sqlx::migrate::Migrator;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use tracing::info;

use crate::core::config::{Config, DatabaseConfig};
use crate::core::state::AppState;

pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Open the pool and bring the schema up to date.
///
/// An in-memory database lives only as long as its connection, so it is
/// pinned to a single connection that never idles out.
pub async fn connect_database(config: &DatabaseConfig) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(&config.url)
        .context(format!("Invalid database url '{}'", config.url))?
        .create_if_missing(true);

    let in_memory = config.url.contains(":memory:");

    let pool_options = if in_memory {
        SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new().max_connections(config.max_connections)
    };

    let pool = pool_options
        .connect_with(options)
        .await
        .context("Failed to connect to database")?;

    // Schema is embedded at compile time from ./migrations
    MIGRATOR
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;

    info!(in_memory, max_connections = config.max_connections, "Database ready");

    Ok(pool)
}

pub async fn connect_in_memory() -> Result<SqlitePool> {
    connect_database(&DatabaseConfig {
        url: "sqlite::memory:".to_string(),
        max_connections: 1,
    })
    .await
}

pub async fn build_state(config: Config) -> Result<AppState> {
    let pool = connect_database(&config.database).await?;
    Ok(AppState::new(config, pool))
}
