//! Playback engine
//!
//! **Responsibilities:**
//! - Single owner of playlist, mode, paused flag and the active session
//! - Serializes commands from every source behind one async mutex
//! - Advances to the next track when a session ends
//!
//! **Components:**
//! - `mod.rs` (this file): struct, construction, queries, session driver
//! - `control.rs`: start, skip, stop, pause, unpause
//! - `queue.rs`: add, remove, clear, mode changes
//!
//! # Session lifecycle
//!
//! Every session gets a fresh token. A waiter task forwards the session's
//! end, tagged with its token, to the driver task. The driver re-takes the
//! state lock and acts only if the token still names the active session,
//! so ends of sessions that were skipped, stopped or cleared in the
//! meantime are dropped.

mod control;
mod queue;

pub use control::StartOutcome;

use super::playlist::{Playlist, Resolution};
use crate::audio::{AudioOutput, SessionControl, SessionEnd, SessionHandle};
use mmb_common::{BotEvent, PlaybackMode, PlaybackState, Track};
use serde::Serialize;
use std::sync::{Arc, Weak};
use tokio::sync::{broadcast, mpsc, Mutex, MutexGuard};
use tracing::{debug, info, warn};

/// Event channel capacity; slow SSE clients lag rather than block playback
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Point-in-time view of the engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayerStatus {
    pub state: PlaybackState,
    pub mode: PlaybackMode,
    /// 0-based; equals `playlist_length` when exhausted
    pub current_index: usize,
    pub current_track: Option<Track>,
    pub playlist_length: usize,
}

/// Playlist contents and status read under one lock
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlaylistSnapshot {
    pub status: PlayerStatus,
    pub tracks: Vec<Track>,
}

impl PlaylistSnapshot {
    /// Row of the active session, `None` when idle
    pub fn playing_index(&self) -> Option<usize> {
        self.status
            .current_track
            .is_some()
            .then_some(self.status.current_index)
    }
}

/// The session currently streaming
struct ActiveSession {
    token: u64,
    track: Track,
    control: Box<dyn SessionControl>,
}

struct PlayerState {
    playlist: Playlist,
    mode: PlaybackMode,
    paused: bool,
    active: Option<ActiveSession>,
    next_token: u64,
    /// Sessions that failed in a row without one completing
    consecutive_failures: usize,
}

impl PlayerState {
    fn playback_state(&self) -> PlaybackState {
        match (&self.active, self.paused) {
            (None, _) => PlaybackState::Idle,
            (Some(_), true) => PlaybackState::Paused,
            (Some(_), false) => PlaybackState::Playing,
        }
    }

    fn status(&self) -> PlayerStatus {
        PlayerStatus {
            state: self.playback_state(),
            mode: self.mode,
            current_index: self.playlist.current_index(),
            current_track: self.active.as_ref().map(|a| a.track.clone()),
            playlist_length: self.playlist.len(),
        }
    }
}

/// Session end tagged with the session's token
#[derive(Debug)]
struct SessionNotice {
    token: u64,
    end: SessionEnd,
}

struct EngineInner {
    state: Mutex<PlayerState>,
    output: Arc<dyn AudioOutput>,
    event_tx: broadcast::Sender<BotEvent>,
    notice_tx: mpsc::UnboundedSender<SessionNotice>,
}

/// Handle to the playback engine
///
/// Cheap to clone; every clone drives the same engine.
#[derive(Clone)]
pub struct PlaybackEngine {
    inner: Arc<EngineInner>,
}

impl PlaybackEngine {
    /// Create an engine and spawn its session driver
    ///
    /// Must be called inside a tokio runtime.
    pub fn new(output: Arc<dyn AudioOutput>) -> Self {
        Self::with_playlist(output, Playlist::new())
    }

    /// Create an engine with a seeded shuffle source
    pub fn with_shuffle_seed(output: Arc<dyn AudioOutput>, seed: u64) -> Self {
        Self::with_playlist(output, Playlist::with_seed(seed))
    }

    fn with_playlist(output: Arc<dyn AudioOutput>, playlist: Playlist) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let (notice_tx, notice_rx) = mpsc::unbounded_channel();

        let inner = Arc::new(EngineInner {
            state: Mutex::new(PlayerState {
                playlist,
                mode: PlaybackMode::default(),
                paused: false,
                active: None,
                next_token: 1,
                consecutive_failures: 0,
            }),
            output,
            event_tx,
            notice_tx,
        });

        tokio::spawn(run_driver(Arc::downgrade(&inner), notice_rx));
        info!("Playback engine created");

        Self { inner }
    }

    /// Subscribe to engine events
    pub fn subscribe(&self) -> broadcast::Receiver<BotEvent> {
        self.inner.event_tx.subscribe()
    }

    // ========================================
    // Queries
    // ========================================

    /// Track of the active session, `None` when idle
    pub async fn current_track(&self) -> Option<Track> {
        let state = self.lock().await;
        state.active.as_ref().map(|a| a.track.clone())
    }

    /// Playlist snapshot in order
    pub async fn playlist(&self) -> Vec<Track> {
        self.lock().await.playlist.tracks().to_vec()
    }

    pub async fn mode(&self) -> PlaybackMode {
        self.lock().await.mode
    }

    pub async fn is_paused(&self) -> bool {
        self.lock().await.paused
    }

    pub async fn status(&self) -> PlayerStatus {
        self.lock().await.status()
    }

    /// Playlist with the status it was read under
    pub async fn snapshot(&self) -> PlaylistSnapshot {
        let state = self.lock().await;
        PlaylistSnapshot {
            status: state.status(),
            tracks: state.playlist.tracks().to_vec(),
        }
    }

    /// Cancel any active session (used on process shutdown)
    pub async fn shutdown(&self) {
        let mut state = self.lock().await;
        let old_state = state.playback_state();
        self.cancel_active(&mut state);
        self.emit_state_change(old_state, &state);
        info!("Playback engine shut down");
    }

    // ========================================
    // Internals shared by control.rs / queue.rs
    // ========================================

    async fn lock(&self) -> MutexGuard<'_, PlayerState> {
        self.inner.state.lock().await
    }

    fn emit(&self, event: BotEvent) {
        // No subscribers is fine
        let _ = self.inner.event_tx.send(event);
    }

    fn emit_state_change(&self, old_state: PlaybackState, state: &PlayerState) {
        let new_state = state.playback_state();
        if old_state != new_state {
            debug!("Playback state: {} -> {}", old_state, new_state);
            self.emit(BotEvent::PlaybackStateChanged {
                old_state,
                new_state,
                timestamp: chrono::Utc::now(),
            });
        }
    }

    fn emit_playlist_changed(&self, state: &PlayerState) {
        self.emit(BotEvent::PlaylistChanged {
            length: state.playlist.len(),
            timestamp: chrono::Utc::now(),
        });
    }

    /// Cancel and forget the active session; its end notice becomes stale
    fn cancel_active(&self, state: &mut PlayerState) {
        if let Some(active) = state.active.take() {
            active.control.cancel();
            debug!(token = active.token, "Cancelled session for '{}'", active.track.title);
            self.emit(BotEvent::TrackFinished {
                track_id: active.track.id,
                completed: false,
                timestamp: chrono::Utc::now(),
            });
        }
        state.paused = false;
    }

    /// Find the next playable entry and start a session for it
    ///
    /// Entries whose session cannot begin are stepped over. At most one
    /// attempt per playlist entry is made before giving up and going idle.
    /// Returns the started track, or `None` when the engine went idle.
    fn resolve_and_begin(&self, state: &mut PlayerState) -> Option<Track> {
        let mut attempts = 0;

        loop {
            let index = match state.playlist.resolve(state.mode) {
                Resolution::Play(index) => index,
                Resolution::Restart => {
                    debug!("Playlist wrapped around in {} mode", state.mode);
                    if state.mode == PlaybackMode::ShuffleRepeat {
                        self.emit_playlist_changed(state);
                    }
                    0
                }
                Resolution::Exhausted => {
                    info!("Reached end of playlist");
                    return None;
                }
                Resolution::Empty => return None,
            };

            let track = state.playlist.get(index)?.clone();

            match self.inner.output.begin(&track) {
                Ok(handle) => {
                    self.install_session(state, index, track.clone(), handle);
                    return Some(track);
                }
                Err(e) => {
                    warn!("Cannot play '{}' ({}): {}", track.title, track.path, e);
                    attempts += 1;
                    if attempts >= state.playlist.len() {
                        warn!("No playable track found, going idle");
                        return None;
                    }
                    state.playlist.advance();
                }
            }
        }
    }

    fn install_session(&self, state: &mut PlayerState, index: usize, track: Track, handle: SessionHandle) {
        let token = state.next_token;
        state.next_token += 1;

        let SessionHandle { control, finished } = handle;
        let notice_tx = self.inner.notice_tx.clone();
        tokio::spawn(async move {
            let end = finished
                .await
                .unwrap_or_else(|_| SessionEnd::Failed("session ended without reporting".to_string()));
            // Driver gone means the engine was dropped
            let _ = notice_tx.send(SessionNotice { token, end });
        });

        info!(token, index, "Now playing: {}", track);
        self.emit(BotEvent::TrackStarted {
            track_id: track.id,
            index,
            title: track.title.clone(),
            timestamp: chrono::Utc::now(),
        });

        state.active = Some(ActiveSession { token, track, control });
        state.paused = false;
    }

    /// Driver continuation for a finished session
    async fn on_session_end(&self, notice: SessionNotice) {
        let mut state = self.lock().await;

        let old_state = state.playback_state();
        let finished = match state.active.take() {
            Some(active) if active.token == notice.token => active,
            other => {
                state.active = other;
                debug!(token = notice.token, "Ignoring end of stale session");
                return;
            }
        };
        state.paused = false;

        let completed = match &notice.end {
            SessionEnd::Completed => {
                state.consecutive_failures = 0;
                true
            }
            SessionEnd::Cancelled => {
                debug!("Session for '{}' was cancelled by the output", finished.track.title);
                false
            }
            SessionEnd::Failed(reason) => {
                warn!("Playback of '{}' failed: {}", finished.track.title, reason);
                state.consecutive_failures += 1;
                false
            }
        };
        self.emit(BotEvent::TrackFinished {
            track_id: finished.track.id,
            completed,
            timestamp: chrono::Utc::now(),
        });

        state.playlist.advance();

        if state.consecutive_failures > 0 && state.consecutive_failures >= state.playlist.len() {
            warn!(
                "{} sessions failed in a row, stopping playback",
                state.consecutive_failures
            );
            state.consecutive_failures = 0;
        } else {
            self.resolve_and_begin(&mut state);
        }

        self.emit_state_change(old_state, &state);
    }
}

/// Session driver loop
///
/// Holds only a weak reference so dropping every engine handle ends it.
async fn run_driver(engine: Weak<EngineInner>, mut notices: mpsc::UnboundedReceiver<SessionNotice>) {
    while let Some(notice) = notices.recv().await {
        let Some(inner) = engine.upgrade() else {
            break;
        };
        PlaybackEngine { inner }.on_session_end(notice).await;
    }
    debug!("Session driver stopped");
}
