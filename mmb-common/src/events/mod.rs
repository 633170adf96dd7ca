//! Event types for the bot event system
//!
//! The playback engine broadcasts these on a `tokio::sync::broadcast`
//! channel; the HTTP layer forwards them to SSE clients.

mod playback_types;

pub use playback_types::{PlaybackMode, PlaybackState};

use serde::{Deserialize, Serialize};

/// Bot event types
///
/// Serialized with an internal `type` tag for SSE transmission.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum BotEvent {
    /// Playback state changed (Idle / Playing / Paused)
    PlaybackStateChanged {
        old_state: PlaybackState,
        new_state: PlaybackState,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A session began streaming a track
    TrackStarted {
        /// Catalog id of the track
        track_id: i64,
        /// 0-based playlist index the track was started from
        index: usize,
        title: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A session ended
    TrackFinished {
        track_id: i64,
        /// false if skipped, stopped, cleared or failed
        completed: bool,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Playlist contents or order changed
    PlaylistChanged {
        length: usize,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Playback mode changed
    ModeChanged {
        mode: PlaybackMode,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl BotEvent {
    /// Event name used for the SSE `event:` field
    pub fn event_type(&self) -> &'static str {
        match self {
            BotEvent::PlaybackStateChanged { .. } => "PlaybackStateChanged",
            BotEvent::TrackStarted { .. } => "TrackStarted",
            BotEvent::TrackFinished { .. } => "TrackFinished",
            BotEvent::PlaylistChanged { .. } => "PlaylistChanged",
            BotEvent::ModeChanged { .. } => "ModeChanged",
        }
    }
}
