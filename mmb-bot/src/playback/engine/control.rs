//! Transport controls for PlaybackEngine
//!
//! **Responsibilities:**
//! - Start / skip / stop
//! - Pause / unpause of the active session

use super::PlaybackEngine;
use crate::error::PlaybackError;
use mmb_common::Track;
use tracing::info;

/// Result of a successful `start`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartOutcome {
    /// A session began for this track
    Started(Track),
    /// A session was already active; nothing changed
    AlreadyPlaying(Track),
    /// Nothing could be started (end of a non-looping playlist, or no
    /// playable entry)
    Idle,
}

impl PlaybackEngine {
    /// Begin playback at the current index
    ///
    /// When the index is past the end, looping modes wrap to the first
    /// entry; `Single` and `Shuffle` stay idle.
    pub async fn start(&self) -> Result<StartOutcome, PlaybackError> {
        let mut state = self.lock().await;

        if state.playlist.is_empty() {
            return Err(PlaybackError::EmptyPlaylist);
        }
        if let Some(active) = &state.active {
            return Ok(StartOutcome::AlreadyPlaying(active.track.clone()));
        }

        info!("Start requested at index {}", state.playlist.current_index());
        let old_state = state.playback_state();
        state.consecutive_failures = 0;
        let outcome = match self.resolve_and_begin(&mut state) {
            Some(track) => StartOutcome::Started(track),
            None => StartOutcome::Idle,
        };
        self.emit_state_change(old_state, &state);
        Ok(outcome)
    }

    /// Abandon the active session and play the next entry
    ///
    /// Returns the newly started track, or `None` if playback went idle.
    pub async fn skip(&self) -> Result<Option<Track>, PlaybackError> {
        let mut state = self.lock().await;

        if state.active.is_none() {
            return Err(PlaybackError::NotPlaying);
        }

        let old_state = state.playback_state();
        self.cancel_active(&mut state);
        state.playlist.advance();
        state.consecutive_failures = 0;
        info!("Skipped to index {}", state.playlist.current_index());

        let next = self.resolve_and_begin(&mut state);
        self.emit_state_change(old_state, &state);
        Ok(next)
    }

    /// Stop playback and rewind to the first entry
    pub async fn stop(&self) -> Result<(), PlaybackError> {
        let mut state = self.lock().await;

        if state.playlist.is_empty() {
            return Err(PlaybackError::EmptyPlaylist);
        }

        let old_state = state.playback_state();
        self.cancel_active(&mut state);
        state.playlist.rewind();
        info!("Playback stopped");
        self.emit_state_change(old_state, &state);
        Ok(())
    }

    /// Pause the active session; pausing twice is a no-op
    pub async fn pause(&self) -> Result<(), PlaybackError> {
        let mut state = self.lock().await;

        let old_state = state.playback_state();
        let Some(active) = &state.active else {
            return Err(PlaybackError::NotPlaying);
        };
        if state.paused {
            return Ok(());
        }

        active.control.pause();
        state.paused = true;
        info!("Playback paused");
        self.emit_state_change(old_state, &state);
        Ok(())
    }

    /// Resume a paused session
    pub async fn unpause(&self) -> Result<(), PlaybackError> {
        let mut state = self.lock().await;

        let old_state = state.playback_state();
        let Some(active) = &state.active else {
            return Err(PlaybackError::NotPaused);
        };
        if !state.paused {
            return Err(PlaybackError::NotPaused);
        }

        active.control.resume();
        state.paused = false;
        info!("Playback resumed");
        self.emit_state_change(old_state, &state);
        Ok(())
    }
}
