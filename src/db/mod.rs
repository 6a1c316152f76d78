use anyhow::Result;
use sqlx::{
    Pool, Sqlite,
    migrate::MigrateDatabase,
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
};
use std::str::FromStr;

use crate::config::Config;

pub mod event_store;
pub mod user_store;

pub type DbPool = Pool<Sqlite>;

/// Initialize the database connection pool
pub async fn init_db_pool(config: &Config) -> Result<DbPool> {
    // Create the database if it doesn't exist
    if !Sqlite::database_exists(&config.database_url)
        .await
        .unwrap_or(false)
    {
        Sqlite::create_database(&config.database_url).await?;
    }

    let options = SqliteConnectOptions::from_str(&config.database_url)?
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(config.busy_timeout);

    // Create connection pool
    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout)
        .connect_with(options)
        .await?;

    // Run migrations
    setup_database(&pool).await?;

    tracing::info!("Database ready at {}", config.database_url);
    Ok(pool)
}

/// Set up the database schema
async fn setup_database(pool: &DbPool) -> Result<()> {
    // Create users table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            username TEXT PRIMARY KEY NOT NULL,
            password_hash TEXT NOT NULL,
            role TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    // AUTOINCREMENT keeps ids of deleted events from being handed out again,
    // UNIQUE(date) holds the one-event-per-date rule across all owners
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS events (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            description TEXT NOT NULL,
            date TEXT NOT NULL UNIQUE,
            time TEXT NOT NULL,
            location TEXT NOT NULL,
            owner_username TEXT NOT NULL,
            FOREIGN KEY (owner_username) REFERENCES users (username)
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_events_owner ON events (owner_username);")
        .execute(pool)
        .await?;

    Ok(())
}

/// Single-connection in-memory pool with the full schema
#[cfg(test)]
pub(crate) async fn test_pool() -> DbPool {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .expect("valid in-memory url")
        .foreign_keys(true);

    // One connection that never gets recycled, otherwise the in-memory database vanishes
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .expect("Failed to open in-memory database");

    setup_database(&pool)
        .await
        .expect("Failed to create schema");
    pool
}
