//! # MMB Common Library
//!
//! Shared code for the music bot crates including:
//! - Database bootstrap and the track model
//! - Event types (BotEvent enum) and playback enums
//! - Configuration loading
//! - Common error type

pub mod config;
pub mod db;
pub mod error;
pub mod events;

pub use db::models::Track;
pub use error::{Error, Result};
pub use events::{BotEvent, PlaybackMode, PlaybackState};
