//! Storage layer: SQLite pool setup and migration runner for the
//! evaluation cache.

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

/// Accepts either a bare filesystem path or a full `sqlite:` URL (the
/// latter is how tests pass shared in-memory databases).
pub async fn connect(database_url: &str) -> anyhow::Result<SqlitePool> {
    let url = if database_url.starts_with("sqlite:") {
        database_url.to_string()
    } else {
        let path = std::path::PathBuf::from(database_url);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        format!("sqlite://{}", path.to_string_lossy().replace('\\', "/"))
    };
    let options = SqliteConnectOptions::from_str(&url)?.create_if_missing(true);
    // A shared in-memory database needs a single connection to stay alive.
    let max_connections = if url.contains("memory") { 1 } else { 5 };
    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await?;
    Ok(pool)
}

/// Applies the embedded migrations in crates/storage/migrations.
/// Safe to run multiple times.
pub async fn migrate(pool: &SqlitePool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}
