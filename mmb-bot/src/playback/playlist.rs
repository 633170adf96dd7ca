//! Playlist bookkeeping
//!
//! Ordered tracks plus the current-index pointer. Pure data: no locking,
//! no audio. The engine owns one `Playlist` inside its locked state.
//!
//! `current_index == len()` means the playlist is exhausted and the next
//! start must resolve what to do from the playback mode.

use crate::error::PlaybackError;
use mmb_common::{PlaybackMode, Track};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Result of resolving which entry to play next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Play the entry at this index
    Play(usize),
    /// A looping mode wrapped around; play from index 0
    Restart,
    /// Non-looping mode reached the end; stay idle
    Exhausted,
    /// Nothing to play
    Empty,
}

#[derive(Debug)]
pub struct Playlist {
    tracks: Vec<Track>,
    current_index: usize,
    rng: StdRng,
}

impl Playlist {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Deterministic shuffles for tests
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            tracks: Vec::new(),
            current_index: 0,
            rng,
        }
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn get(&self, index: usize) -> Option<&Track> {
        self.tracks.get(index)
    }

    pub fn is_exhausted(&self) -> bool {
        self.current_index >= self.tracks.len()
    }

    /// Append one track to the tail
    pub fn push(&mut self, track: Track) {
        self.tracks.push(track);
    }

    /// Append a batch, keeping the batch's own order
    pub fn extend<I>(&mut self, tracks: I)
    where
        I: IntoIterator<Item = Track>,
    {
        self.tracks.extend(tracks);
    }

    /// Remove the entry at `index`
    ///
    /// `protect_current` is set while a session streams the current entry;
    /// that entry is then refused. Removing before the current entry shifts
    /// the index down so it keeps pointing at the same track.
    pub fn remove_at(&mut self, index: usize, protect_current: bool) -> Result<Track, PlaybackError> {
        let len = self.tracks.len();
        if index >= len {
            return Err(PlaybackError::OutOfRange { index, len });
        }
        if protect_current && index == self.current_index {
            return Err(PlaybackError::Playing { index });
        }

        let removed = self.tracks.remove(index);
        if index < self.current_index {
            self.current_index -= 1;
        }
        Ok(removed)
    }

    pub fn clear(&mut self) {
        self.tracks.clear();
        self.current_index = 0;
    }

    /// Point back at the first entry
    pub fn rewind(&mut self) {
        self.current_index = 0;
    }

    /// Step past the current entry (saturates at `len()`)
    pub fn advance(&mut self) {
        self.current_index = (self.current_index + 1).min(self.tracks.len());
    }

    /// Shuffle in place and reset the index to 0
    ///
    /// With `keep_current`, the current entry is moved to the front so the
    /// index still designates it after the reset.
    pub fn shuffle(&mut self, keep_current: bool) {
        let pinned = if keep_current && self.current_index < self.tracks.len() {
            Some(self.tracks.remove(self.current_index))
        } else {
            None
        };

        self.tracks.shuffle(&mut self.rng);

        if let Some(track) = pinned {
            self.tracks.insert(0, track);
        }
        self.current_index = 0;
    }

    /// Decide which entry plays next under `mode`
    ///
    /// Mutates only on exhaustion: looping modes rewind (and reshuffle for
    /// `ShuffleRepeat`), non-looping modes leave the index at `len()`.
    pub fn resolve(&mut self, mode: PlaybackMode) -> Resolution {
        if self.tracks.is_empty() {
            self.current_index = 0;
            return Resolution::Empty;
        }
        if !self.is_exhausted() {
            return Resolution::Play(self.current_index);
        }

        match mode {
            PlaybackMode::Repeat => {
                self.current_index = 0;
                Resolution::Restart
            }
            PlaybackMode::ShuffleRepeat => {
                self.shuffle(false);
                Resolution::Restart
            }
            PlaybackMode::Single | PlaybackMode::Shuffle => {
                self.current_index = self.tracks.len();
                Resolution::Exhausted
            }
        }
    }
}

impl Default for Playlist {
    fn default() -> Self {
        Self::new()
    }
}
