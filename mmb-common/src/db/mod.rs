//! Database bootstrap
//!
//! Opens (creating when missing) the SQLite catalog database.

pub mod init;
pub mod models;

use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use tracing::info;

/// Open the catalog database at `db_path` and ensure its schema
pub async fn connect(db_path: &Path) -> Result<SqlitePool> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    info!("Connected to database: {}", db_path.display());
    init::ensure_schema(&pool).await?;
    Ok(pool)
}

/// Open a private in-memory catalog database
///
/// Limited to one connection: every SQLite `:memory:` connection is a
/// separate database.
pub async fn connect_in_memory() -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await?;
    init::ensure_schema(&pool).await?;
    Ok(pool)
}
