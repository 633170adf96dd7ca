//! Error types for mmb-bot
//!
//! `Error` covers infrastructure failures (database, audio, I/O).
//! `PlaybackError` is the discriminated result of playback engine
//! operations; adapters turn it into chat text or HTTP status codes.

use thiserror::Error;

/// Main error type for mmb-bot
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration or shared-library errors
    #[error(transparent)]
    Common(#[from] mmb_common::Error),

    /// Database connection or query errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Catalog scan errors
    #[error("Scan error: {0}")]
    Scan(String),

    /// Audio decoding errors
    #[error("Audio decode error: {0}")]
    Decode(String),

    /// Audio output errors
    #[error("Audio output error: {0}")]
    AudioOutput(String),

    /// Playback engine rejected an operation
    #[error(transparent)]
    Playback(#[from] PlaybackError),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Resource not found (catalog lookup miss)
    #[error("Not found: {0}")]
    NotFound(String),
}

/// Convenience Result type using mmb-bot Error
pub type Result<T> = std::result::Result<T, Error>;

/// Recoverable rejections returned by the playback engine
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackError {
    /// Control operation on an empty playlist
    #[error("Playlist is empty.")]
    EmptyPlaylist,

    /// Remove index outside the playlist
    #[error("Index {index} is out of range for a playlist of {len} tracks.")]
    OutOfRange { index: usize, len: usize },

    /// Remove targets the track that is currently streaming
    #[error("Track {index} is currently playing.")]
    Playing { index: usize },

    /// Skip or pause with no active session
    #[error("Not playing anything right now.")]
    NotPlaying,

    /// Unpause with no paused session
    #[error("Playback is not paused.")]
    NotPaused,
}
