//! Music folder scanner
//!
//! Walks the music folder, reads tags and reconciles the result against
//! the `tracks` table by path:
//! - new paths are inserted
//! - known paths with changed metadata are updated
//! - stored paths that no longer exist on disk are deleted
//!
//! All changes land in a single transaction.

use super::{delete_track, insert_track, update_track};
use crate::error::{Error, Result};
use lofty::prelude::*;
use lofty::probe::Probe;
use mmb_common::Track;
use sqlx::SqlitePool;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Extensions (lowercase, without dot) treated as audio
const AUDIO_EXTENSIONS: &[&str] = &["aac", "flac", "m4a", "mp3", "ogg", "oga", "wav"];

/// Metadata read from one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackMetadata {
    /// Absolute path
    pub path: String,
    pub title: String,
    pub artists: Option<String>,
    pub album: Option<String>,
    pub track_num: Option<i64>,
    pub disc_num: Option<i64>,
}

impl TrackMetadata {
    fn differs_from(&self, track: &Track) -> bool {
        self.title != track.title
            || self.artists != track.artists
            || self.album != track.album
            || self.track_num != track.track_num
            || self.disc_num != track.disc_num
    }
}

/// Counts of what a scan changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanSummary {
    pub files_found: usize,
    pub added: usize,
    pub updated: usize,
    pub removed: usize,
    /// Audio files whose tags could not be read
    pub skipped: usize,
}

/// Changes needed to bring the table in line with the folder
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ReconcilePlan {
    pub to_add: Vec<TrackMetadata>,
    pub to_update: Vec<(i64, TrackMetadata)>,
    pub to_delete: Vec<i64>,
}

/// Compare stored rows with scanned files by path
pub fn reconcile(existing: &[Track], scanned: Vec<TrackMetadata>) -> ReconcilePlan {
    let by_path: HashMap<&str, &Track> = existing.iter().map(|t| (t.path.as_str(), t)).collect();
    let mut plan = ReconcilePlan::default();
    let mut seen: HashSet<String> = HashSet::with_capacity(scanned.len());

    for meta in scanned {
        seen.insert(meta.path.clone());
        match by_path.get(meta.path.as_str()) {
            None => plan.to_add.push(meta),
            Some(track) if meta.differs_from(track) => plan.to_update.push((track.id, meta)),
            Some(_) => {}
        }
    }

    plan.to_delete = existing
        .iter()
        .filter(|t| !seen.contains(&t.path))
        .map(|t| t.id)
        .collect();

    plan
}

fn is_audio_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| AUDIO_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Every audio file under `root`, sorted for a stable insertion order
pub fn find_audio_files(root: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root).follow_links(true) {
        let entry = entry.map_err(|e| Error::Scan(format!("Cannot walk {}: {}", root.display(), e)))?;
        if entry.file_type().is_file() && is_audio_file(entry.path()) {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}

fn non_empty(value: Option<std::borrow::Cow<'_, str>>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn non_zero(value: Option<u32>) -> Option<i64> {
    value.filter(|&n| n != 0).map(i64::from)
}

/// Read tags from one file
///
/// A missing or blank title falls back to the file stem.
pub fn read_metadata(path: &Path) -> Result<TrackMetadata> {
    let tagged_file = Probe::open(path)
        .map_err(|e| Error::Scan(format!("{}: {}", path.display(), e)))?
        .read()
        .map_err(|e| Error::Scan(format!("{}: {}", path.display(), e)))?;

    let tag = tagged_file.primary_tag().or_else(|| tagged_file.first_tag());

    let (title, artists, album, track_num, disc_num) = match tag {
        Some(tag) => (
            non_empty(tag.title()),
            non_empty(tag.artist()),
            non_empty(tag.album()),
            non_zero(tag.track()),
            non_zero(tag.disk()),
        ),
        None => (None, None, None, None, None),
    };

    let title = title.unwrap_or_else(|| {
        path.file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    });

    Ok(TrackMetadata {
        path: path.to_string_lossy().into_owned(),
        title,
        artists,
        album,
        track_num,
        disc_num,
    })
}

/// Scan `music_path` and write the differences to the database
pub async fn scan_music_folder(pool: &SqlitePool, music_path: &Path) -> Result<ScanSummary> {
    let root = std::fs::canonicalize(music_path)
        .map_err(|e| Error::Scan(format!("Music path {}: {}", music_path.display(), e)))?;
    info!("Scanning music folder: {}", root.display());

    let walk_root = root.clone();
    let (scanned, files_found, skipped) = tokio::task::spawn_blocking(move || -> Result<_> {
        let files = find_audio_files(&walk_root)?;
        let files_found = files.len();
        let mut scanned = Vec::with_capacity(files_found);
        let mut skipped = 0;
        for file in files {
            match read_metadata(&file) {
                Ok(meta) => scanned.push(meta),
                Err(e) => {
                    warn!("Skipping unreadable file: {}", e);
                    skipped += 1;
                }
            }
        }
        Ok((scanned, files_found, skipped))
    })
    .await
    .map_err(|e| Error::Scan(format!("Scan task failed: {}", e)))??;

    let existing = sqlx::query_as::<_, Track>(
        "SELECT id, path, title, artists, album, track_num, disc_num FROM tracks",
    )
    .fetch_all(pool)
    .await?;

    let plan = reconcile(&existing, scanned);
    let summary = ScanSummary {
        files_found,
        added: plan.to_add.len(),
        updated: plan.to_update.len(),
        removed: plan.to_delete.len(),
        skipped,
    };

    let mut tx = pool.begin().await?;
    for meta in &plan.to_add {
        insert_track(&mut *tx, meta).await?;
    }
    for (id, meta) in &plan.to_update {
        update_track(&mut *tx, *id, meta).await?;
    }
    for id in &plan.to_delete {
        delete_track(&mut *tx, *id).await?;
    }
    tx.commit().await?;

    debug!(?summary, "Scan applied");
    info!(
        "Scan complete: {} files, {} added, {} updated, {} removed, {} skipped",
        summary.files_found, summary.added, summary.updated, summary.removed, summary.skipped
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stored(id: i64, path: &str, title: &str) -> Track {
        Track {
            id,
            path: path.to_string(),
            title: title.to_string(),
            artists: None,
            album: None,
            track_num: None,
            disc_num: None,
        }
    }

    fn scanned(path: &str, title: &str) -> TrackMetadata {
        TrackMetadata {
            path: path.to_string(),
            title: title.to_string(),
            artists: None,
            album: None,
            track_num: None,
            disc_num: None,
        }
    }

    #[test]
    fn test_reconcile_add_update_delete() {
        let existing = vec![
            stored(1, "/m/keep.mp3", "Keep"),
            stored(2, "/m/retitled.mp3", "Old Title"),
            stored(3, "/m/gone.mp3", "Gone"),
        ];
        let found = vec![
            scanned("/m/keep.mp3", "Keep"),
            scanned("/m/retitled.mp3", "New Title"),
            scanned("/m/new.flac", "New"),
        ];

        let plan = reconcile(&existing, found);
        assert_eq!(plan.to_add, vec![scanned("/m/new.flac", "New")]);
        assert_eq!(plan.to_update, vec![(2, scanned("/m/retitled.mp3", "New Title"))]);
        assert_eq!(plan.to_delete, vec![3]);
    }

    #[test]
    fn test_reconcile_unchanged_is_empty() {
        let existing = vec![stored(1, "/m/a.mp3", "A")];
        let plan = reconcile(&existing, vec![scanned("/m/a.mp3", "A")]);
        assert_eq!(plan, ReconcilePlan::default());
    }

    #[test]
    fn test_audio_extension_filter() {
        assert!(is_audio_file(Path::new("/m/song.MP3")));
        assert!(is_audio_file(Path::new("/m/song.oga")));
        assert!(is_audio_file(Path::new("/m/song.m4a")));
        assert!(!is_audio_file(Path::new("/m/cover.jpg")));
        assert!(!is_audio_file(Path::new("/m/README")));
    }

    #[test]
    fn test_find_audio_files_recurses() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("Artist").join("Album");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(nested.join("01.flac"), b"").unwrap();
        std::fs::write(nested.join("cover.png"), b"").unwrap();
        std::fs::write(dir.path().join("loose.ogg"), b"").unwrap();

        let files = find_audio_files(dir.path()).unwrap();
        assert_eq!(files.len(), 2);
        assert!(files.iter().all(|f| is_audio_file(f)));
    }

    #[test]
    fn test_non_empty_and_non_zero() {
        assert_eq!(non_empty(Some("  ".into())), None);
        assert_eq!(non_empty(Some(" Title ".into())), Some("Title".to_string()));
        assert_eq!(non_zero(Some(0)), None);
        assert_eq!(non_zero(Some(4)), Some(4));
    }

    #[tokio::test]
    async fn test_scan_skips_unreadable_and_removes_vanished() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("broken.mp3"), b"not really audio").unwrap();

        let pool = mmb_common::db::connect_in_memory().await.unwrap();
        let ghost = TrackMetadata {
            path: "/definitely/missing.mp3".to_string(),
            ..scanned("", "Ghost")
        };
        insert_track(&pool, &ghost).await.unwrap();

        let summary = scan_music_folder(&pool, dir.path()).await.unwrap();
        assert_eq!(summary.files_found, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.added, 0);
        assert_eq!(summary.removed, 1);

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tracks")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_scan_adds_then_updates_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 8000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(dir.path().join("Intro.wav"), spec).unwrap();
        for _ in 0..800 {
            writer.write_sample(0i16).unwrap();
        }
        writer.finalize().unwrap();

        let pool = mmb_common::db::connect_in_memory().await.unwrap();
        let summary = scan_music_folder(&pool, dir.path()).await.unwrap();
        assert_eq!(summary.added, 1);
        assert_eq!(summary.skipped, 0);

        // Untagged file: title comes from the file name
        let title: String = sqlx::query_scalar("SELECT title FROM tracks")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(title, "Intro");

        let again = scan_music_folder(&pool, dir.path()).await.unwrap();
        assert_eq!(again.files_found, 1);
        assert_eq!((again.added, again.updated, again.removed), (0, 0, 0));
    }

    #[tokio::test]
    async fn test_scan_missing_folder_is_error() {
        let pool = mmb_common::db::connect_in_memory().await.unwrap();
        let result = scan_music_folder(&pool, Path::new("/nonexistent/music")).await;
        assert!(matches!(result, Err(Error::Scan(_))));
    }
}
