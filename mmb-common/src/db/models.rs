//! Database models

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Catalog track
///
/// Immutable once read; the playback engine holds copies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Track {
    pub id: i64,
    /// Absolute path of the media file
    pub path: String,
    pub title: String,
    pub artists: Option<String>,
    pub album: Option<String>,
    pub track_num: Option<i64>,
    pub disc_num: Option<i64>,
}

impl Track {
    /// Location of the playable media
    pub fn media_path(&self) -> &Path {
        Path::new(&self.path)
    }
}

impl fmt::Display for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title)?;
        if let Some(artists) = &self.artists {
            write!(f, " - {}", artists)?;
        }
        if let Some(album) = &self.album {
            write!(f, " ({})", album)?;
        }
        Ok(())
    }
}
