//! Shared test fixtures
//!
//! `ManualOutput` is an audio output whose sessions never end on their own:
//! tests decide when (and how) each session finishes. Cancelling a session
//! only records the cancel, so a test can still deliver a late completion
//! for it afterwards.

#![allow(dead_code)]

use mmb_bot::audio::{AudioOutput, SessionControl, SessionEnd, SessionHandle};
use mmb_bot::catalog::{self, Catalog, TrackMetadata};
use mmb_bot::{Error, PlaybackEngine, Result};
use mmb_common::Track;
use std::collections::HashSet;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::oneshot;

#[derive(Default)]
pub struct ControlLog {
    pub paused: AtomicBool,
    pub cancelled: AtomicBool,
}

struct ManualControl {
    log: Arc<ControlLog>,
}

impl SessionControl for ManualControl {
    fn pause(&self) {
        self.log.paused.store(true, Ordering::SeqCst);
    }

    fn resume(&self) {
        self.log.paused.store(false, Ordering::SeqCst);
    }

    fn cancel(&self) {
        self.log.cancelled.store(true, Ordering::SeqCst);
    }
}

struct SessionRecord {
    track_id: i64,
    log: Arc<ControlLog>,
    finished: Option<oneshot::Sender<SessionEnd>>,
}

#[derive(Default)]
struct ManualState {
    sessions: Vec<SessionRecord>,
    unplayable: HashSet<i64>,
}

/// Audio output driven by the test
#[derive(Default)]
pub struct ManualOutput {
    state: Mutex<ManualState>,
}

impl ManualOutput {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Make `begin` fail for this track id
    pub fn mark_unplayable(&self, track_id: i64) {
        self.state.lock().unwrap().unplayable.insert(track_id);
    }

    pub fn session_count(&self) -> usize {
        self.state.lock().unwrap().sessions.len()
    }

    /// Track ids in the order sessions were begun
    pub fn started_ids(&self) -> Vec<i64> {
        self.state
            .lock()
            .unwrap()
            .sessions
            .iter()
            .map(|s| s.track_id)
            .collect()
    }

    pub fn is_cancelled(&self, session: usize) -> bool {
        self.state.lock().unwrap().sessions[session]
            .log
            .cancelled
            .load(Ordering::SeqCst)
    }

    pub fn is_paused(&self, session: usize) -> bool {
        self.state.lock().unwrap().sessions[session]
            .log
            .paused
            .load(Ordering::SeqCst)
    }

    /// Sessions neither cancelled nor finished
    pub fn live_sessions(&self) -> usize {
        self.state
            .lock()
            .unwrap()
            .sessions
            .iter()
            .filter(|s| s.finished.is_some() && !s.log.cancelled.load(Ordering::SeqCst))
            .count()
    }

    /// Deliver `end` for session number `session` (0-based begin order)
    pub fn finish(&self, session: usize, end: SessionEnd) {
        let sender = self.state.lock().unwrap().sessions[session]
            .finished
            .take()
            .expect("session already finished");
        let _ = sender.send(end);
    }

    /// Complete a session unless it already finished
    pub fn try_complete(&self, session: usize) {
        let sender = self.state.lock().unwrap().sessions[session].finished.take();
        if let Some(sender) = sender {
            let _ = sender.send(SessionEnd::Completed);
        }
    }

    pub fn complete(&self, session: usize) {
        self.finish(session, SessionEnd::Completed);
    }

    pub fn complete_latest(&self) {
        let latest = self.session_count() - 1;
        self.complete(latest);
    }
}

impl AudioOutput for ManualOutput {
    fn begin(&self, track: &Track) -> Result<SessionHandle> {
        let mut state = self.state.lock().unwrap();
        if state.unplayable.contains(&track.id) {
            return Err(Error::AudioOutput(format!("cannot open {}", track.path)));
        }

        let log = Arc::new(ControlLog::default());
        let (tx, rx) = oneshot::channel();
        state.sessions.push(SessionRecord {
            track_id: track.id,
            log: Arc::clone(&log),
            finished: Some(tx),
        });

        Ok(SessionHandle {
            control: Box::new(ManualControl { log }),
            finished: rx,
        })
    }
}

pub fn track(id: i64) -> Track {
    Track {
        id,
        path: format!("/music/{}.flac", id),
        title: format!("Track {}", id),
        artists: Some("Test Artist".to_string()),
        album: None,
        track_num: None,
        disc_num: None,
    }
}

pub fn tracks(ids: impl IntoIterator<Item = i64>) -> Vec<Track> {
    ids.into_iter().map(track).collect()
}

pub fn ids(tracks: &[Track]) -> Vec<i64> {
    tracks.iter().map(|t| t.id).collect()
}

/// Engine over a fresh manual output with a fixed shuffle seed
pub fn manual_engine() -> (PlaybackEngine, Arc<ManualOutput>) {
    let output = ManualOutput::new();
    let engine = PlaybackEngine::with_shuffle_seed(output.clone(), 42);
    (engine, output)
}

/// Poll `condition` until it holds, failing the test after two seconds
pub async fn eventually<F, Fut>(what: &str, mut condition: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let result = tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            if condition().await {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await;
    assert!(result.is_ok(), "timed out waiting for: {}", what);
}

/// Wait until the output has begun `count` sessions
pub async fn wait_for_sessions(output: &ManualOutput, count: usize) {
    eventually(&format!("{} sessions", count), || async move {
        output.session_count() >= count
    })
    .await;
}

/// Let the session driver drain pending notices
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}

fn album_track(n: usize, album: &str, disc: Option<i64>, num: Option<i64>, title: &str) -> TrackMetadata {
    TrackMetadata {
        path: format!("/music/{}/{}.mp3", album, n),
        title: title.to_string(),
        artists: Some("Band".to_string()),
        album: Some(album.to_string()),
        track_num: num,
        disc_num: disc,
    }
}

/// In-memory catalog:
/// - ids 1..=3: album "Morning Songs" (stored out of order)
/// - ids 4..=5: album "Night Drive"
/// - id 6: no album
pub async fn seeded_catalog() -> Catalog {
    let pool = mmb_common::db::connect_in_memory().await.unwrap();
    let rows = vec![
        album_track(1, "Morning Songs", Some(1), Some(3), "Coffee"),
        album_track(2, "Morning Songs", Some(1), Some(1), "Sunrise"),
        album_track(3, "Morning Songs", Some(1), Some(2), "Birds"),
        album_track(4, "Night Drive", None, Some(1), "Headlights"),
        album_track(5, "Night Drive", None, Some(2), "Tunnel & Lights"),
        TrackMetadata {
            path: "/music/single.mp3".to_string(),
            title: "Lonely Single".to_string(),
            artists: None,
            album: None,
            track_num: None,
            disc_num: None,
        },
    ];
    for row in &rows {
        catalog::insert_track(&pool, row).await.unwrap();
    }
    Catalog::new(pool)
}
