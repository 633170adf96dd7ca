//! Database initialization functions
//!
//! Creates the catalog schema idempotently at startup.

use crate::Result;
use sqlx::{Pool, Sqlite};
use tracing::info;

/// Create the `tracks` table and its indexes if missing
pub async fn ensure_schema(pool: &Pool<Sqlite>) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS tracks (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            path TEXT NOT NULL UNIQUE,
            title TEXT NOT NULL,
            artists TEXT,
            album TEXT,
            track_num INTEGER,
            disc_num INTEGER,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_tracks_album ON tracks(album)")
        .execute(pool)
        .await?;

    info!("Catalog schema ready");
    Ok(())
}
