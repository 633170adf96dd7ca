//! # MMB Bot Library (mmb-bot)
//!
//! Playback orchestration for a voice-chat music bot.
//!
//! **Purpose:** Own one shared playlist and one audio output slot, and let
//! independent command sources (chat commands, HTTP control) mutate and
//! drive it concurrently.
//!
//! **Modules:**
//! - `playback`: playlist bookkeeping and the playback engine
//! - `audio`: audio output sessions (symphonia decode, paced PCM sink)
//! - `catalog`: track database queries and the music folder scanner
//! - `commands`: chat command router
//! - `api`: axum HTTP control surface and SSE

pub mod api;
pub mod audio;
pub mod catalog;
pub mod commands;
pub mod error;
pub mod playback;

pub use error::{Error, PlaybackError, Result};
pub use playback::{PlaybackEngine, PlayerStatus, PlaylistSnapshot, StartOutcome};
