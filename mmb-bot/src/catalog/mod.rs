//! Track catalog
//!
//! **Responsibilities:**
//! - Read-side queries over the `tracks` table (lookup, listing, albums)
//! - Fuzzy album resolution
//! - Music folder scanning and reconciliation (`scanner`)

pub mod album_match;
pub mod pagination;
pub mod scanner;

pub use pagination::{calculate_pagination, Pagination};
pub use scanner::{scan_music_folder, ScanSummary, TrackMetadata};

use crate::error::{Error, Result};
use mmb_common::Track;
use sqlx::{SqliteExecutor, SqlitePool};
use tracing::debug;

const TRACK_COLUMNS: &str = "id, path, title, artists, album, track_num, disc_num";

/// One page of the catalog
#[derive(Debug, Clone)]
pub struct TrackPage {
    pub tracks: Vec<Track>,
    pub pagination: Pagination,
}

/// Handle to the catalog database
#[derive(Debug, Clone)]
pub struct Catalog {
    pool: SqlitePool,
}

impl Catalog {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Fetch one track; `Error::NotFound` for unknown ids
    pub async fn lookup_by_id(&self, id: i64) -> Result<Track> {
        let sql = format!("SELECT {} FROM tracks WHERE id = ?", TRACK_COLUMNS);
        sqlx::query_as::<_, Track>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::NotFound(format!("track {}", id)))
    }

    /// Resolve every id, failing on the first unknown one
    pub async fn lookup_all(&self, ids: &[i64]) -> Result<Vec<Track>> {
        let mut tracks = Vec::with_capacity(ids.len());
        for &id in ids {
            tracks.push(self.lookup_by_id(id).await?);
        }
        Ok(tracks)
    }

    /// Whole catalog in id order
    pub async fn list_tracks(&self) -> Result<Vec<Track>> {
        let sql = format!("SELECT {} FROM tracks ORDER BY id", TRACK_COLUMNS);
        Ok(sqlx::query_as::<_, Track>(&sql).fetch_all(&self.pool).await?)
    }

    pub async fn count_tracks(&self) -> Result<i64> {
        Ok(sqlx::query_scalar("SELECT COUNT(*) FROM tracks")
            .fetch_one(&self.pool)
            .await?)
    }

    /// One page of the catalog in id order; the page number is clamped
    pub async fn list_tracks_page(&self, page: i64, page_size: i64) -> Result<TrackPage> {
        let total = self.count_tracks().await?;
        let pagination = calculate_pagination(total, page_size, page);

        let sql = format!(
            "SELECT {} FROM tracks ORDER BY id LIMIT ? OFFSET ?",
            TRACK_COLUMNS
        );
        let tracks = sqlx::query_as::<_, Track>(&sql)
            .bind(pagination.page_size)
            .bind(pagination.offset)
            .fetch_all(&self.pool)
            .await?;

        Ok(TrackPage { tracks, pagination })
    }

    /// Distinct non-null album names in first-seen order
    pub async fn list_albums(&self) -> Result<Vec<String>> {
        Ok(sqlx::query_scalar(
            "SELECT album FROM tracks WHERE album IS NOT NULL GROUP BY album ORDER BY MIN(id)",
        )
        .fetch_all(&self.pool)
        .await?)
    }

    /// Album tracks in disc, track number, then title order
    ///
    /// Missing disc or track numbers sort after present ones.
    pub async fn tracks_for_album(&self, album: &str) -> Result<Vec<Track>> {
        let sql = format!(
            "SELECT {} FROM tracks WHERE album = ? \
             ORDER BY CASE WHEN disc_num IS NULL THEN 1 ELSE 0 END, disc_num, \
                      CASE WHEN track_num IS NULL THEN 1 ELSE 0 END, track_num, \
                      title COLLATE NOCASE ASC",
            TRACK_COLUMNS
        );
        Ok(sqlx::query_as::<_, Track>(&sql)
            .bind(album)
            .fetch_all(&self.pool)
            .await?)
    }

    /// Closest album name to `query`, or `None` if the catalog has no albums
    pub async fn find_album(&self, query: &str) -> Result<Option<String>> {
        let albums = self.list_albums().await?;
        let best = album_match::best_album_match(query, &albums).map(str::to_string);
        debug!("Album query '{}' matched {:?}", query, best);
        Ok(best)
    }
}

// ========================================
// Write helpers (scanner and fixtures)
// ========================================

/// Insert a track row; returns its id
pub async fn insert_track<'e, E>(executor: E, meta: &TrackMetadata) -> Result<i64>
where
    E: SqliteExecutor<'e>,
{
    let result = sqlx::query(
        "INSERT INTO tracks (path, title, artists, album, track_num, disc_num) \
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&meta.path)
    .bind(&meta.title)
    .bind(&meta.artists)
    .bind(&meta.album)
    .bind(meta.track_num)
    .bind(meta.disc_num)
    .execute(executor)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Overwrite the metadata of an existing row
pub async fn update_track<'e, E>(executor: E, id: i64, meta: &TrackMetadata) -> Result<()>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query(
        "UPDATE tracks SET title = ?, artists = ?, album = ?, track_num = ?, disc_num = ?, \
         updated_at = CURRENT_TIMESTAMP WHERE id = ?",
    )
    .bind(&meta.title)
    .bind(&meta.artists)
    .bind(&meta.album)
    .bind(meta.track_num)
    .bind(meta.disc_num)
    .bind(id)
    .execute(executor)
    .await?;

    Ok(())
}

pub async fn delete_track<'e, E>(executor: E, id: i64) -> Result<()>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query("DELETE FROM tracks WHERE id = ?")
        .bind(id)
        .execute(executor)
        .await?;
    Ok(())
}
