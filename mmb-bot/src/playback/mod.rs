//! Playback orchestration
//!
//! The engine is the only owner of playback state; chat commands and HTTP
//! requests both go through [`PlaybackEngine`].

pub mod engine;
pub mod playlist;

pub use engine::{PlaybackEngine, PlayerStatus, PlaylistSnapshot, StartOutcome};
pub use playlist::Playlist;
