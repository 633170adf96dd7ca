//! Playback enums shared by the engine, the HTTP layer and the command router

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// Playback mode
///
/// Governs what happens once the playlist is exhausted and whether the
/// order is randomized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackMode {
    /// Play once through in order, stop at the end
    #[default]
    Single,
    /// One randomized pass, stop at the end
    Shuffle,
    /// Loop forever in playlist order
    Repeat,
    /// Loop forever, reshuffled at the start of every lap
    ShuffleRepeat,
}

impl PlaybackMode {
    /// All modes in the order they are listed to users
    pub const ALL: [PlaybackMode; 4] = [
        PlaybackMode::Single,
        PlaybackMode::Shuffle,
        PlaybackMode::Repeat,
        PlaybackMode::ShuffleRepeat,
    ];

    /// Whether playback restarts after the last entry
    pub fn loops(self) -> bool {
        matches!(self, PlaybackMode::Repeat | PlaybackMode::ShuffleRepeat)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PlaybackMode::Single => "single",
            PlaybackMode::Shuffle => "shuffle",
            PlaybackMode::Repeat => "repeat",
            PlaybackMode::ShuffleRepeat => "shufflerepeat",
        }
    }
}

impl fmt::Display for PlaybackMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlaybackMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "single" => Ok(PlaybackMode::Single),
            "shuffle" => Ok(PlaybackMode::Shuffle),
            "repeat" => Ok(PlaybackMode::Repeat),
            "shufflerepeat" => Ok(PlaybackMode::ShuffleRepeat),
            other => Err(Error::InvalidInput(format!("Invalid playback mode: {}", other))),
        }
    }
}

/// Playback state of the single output slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    /// No session
    Idle,
    /// Session active, not paused
    Playing,
    /// Session active, paused
    Paused,
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaybackState::Idle => write!(f, "idle"),
            PlaybackState::Playing => write!(f, "playing"),
            PlaybackState::Paused => write!(f, "paused"),
        }
    }
}
