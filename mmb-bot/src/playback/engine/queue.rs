//! Playlist editing for PlaybackEngine
//!
//! **Responsibilities:**
//! - Append single tracks and batches
//! - Remove by index, clear
//! - Playback mode changes (including the reshuffle on entering Shuffle)

use super::PlaybackEngine;
use crate::error::PlaybackError;
use mmb_common::{BotEvent, PlaybackMode, Track};
use tracing::{debug, info};

impl PlaybackEngine {
    /// Append a track; returns the new playlist length
    pub async fn add_track(&self, track: Track) -> usize {
        let mut state = self.lock().await;
        debug!("Adding '{}' to playlist", track.title);
        state.playlist.push(track);
        self.emit_playlist_changed(&state);
        state.playlist.len()
    }

    /// Append a batch atomically, in the batch's order
    ///
    /// No other operation can interleave with the batch. Returns the new
    /// playlist length.
    pub async fn add_all_tracks(&self, tracks: Vec<Track>) -> usize {
        let mut state = self.lock().await;
        let count = tracks.len();
        state.playlist.extend(tracks);
        info!("Added {} tracks to playlist", count);
        if count > 0 {
            self.emit_playlist_changed(&state);
        }
        state.playlist.len()
    }

    /// Remove the entry at a 0-based index
    ///
    /// The entry of the active session cannot be removed. Removing an
    /// earlier entry keeps the current index on the same track.
    pub async fn remove_at(&self, index: usize) -> Result<Track, PlaybackError> {
        let mut state = self.lock().await;
        let protect_current = state.active.is_some();
        let removed = state.playlist.remove_at(index, protect_current)?;
        debug!("Removed '{}' from playlist index {}", removed.title, index);
        self.emit_playlist_changed(&state);
        Ok(removed)
    }

    /// Cancel playback and empty the playlist
    pub async fn clear(&self) {
        let mut state = self.lock().await;
        let old_state = state.playback_state();
        self.cancel_active(&mut state);
        state.playlist.clear();
        info!("Playlist cleared");
        self.emit_playlist_changed(&state);
        self.emit_state_change(old_state, &state);
    }

    /// Change the playback mode
    ///
    /// Entering `Shuffle` reshuffles the playlist and resets the index to 0.
    /// A track that is playing is moved to the front so the index keeps
    /// designating it.
    pub async fn set_mode(&self, mode: PlaybackMode) {
        let mut state = self.lock().await;
        state.mode = mode;

        if mode == PlaybackMode::Shuffle {
            // Not a full reshuffle while playing: the active track is pinned
            // at 0 so the protected index still names it
            let keep_current = state.active.is_some();
            state.playlist.shuffle(keep_current);
            self.emit_playlist_changed(&state);
        }

        info!("Playback mode set to {}", mode);
        self.emit(BotEvent::ModeChanged {
            mode,
            timestamp: chrono::Utc::now(),
        });
    }
}
