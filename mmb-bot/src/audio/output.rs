//! Streaming audio output
//!
//! Each session decodes on a blocking thread and feeds the [`PcmSink`] at
//! wall-clock pace: a chunk is only written once the previous audio has
//! had time to play. Pause, resume and cancel travel over a `watch`
//! channel, so the decode thread can wait on them without polling.

use super::decode::AudioDecoder;
use super::sink::PcmSink;
use super::{AudioOutput, SessionControl, SessionEnd, SessionHandle};
use crate::error::{Error, Result};
use mmb_common::Track;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::runtime::Handle;
use tokio::sync::{oneshot, watch};
use tracing::{debug, warn};

/// Requested state of a streaming session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StreamCommand {
    Play,
    Pause,
    Cancel,
}

/// Decode-to-sink audio output
pub struct StreamingOutput<S: PcmSink> {
    sink: Arc<S>,
}

impl<S: PcmSink> StreamingOutput<S> {
    pub fn new(sink: S) -> Self {
        Self { sink: Arc::new(sink) }
    }
}

impl<S: PcmSink> AudioOutput for StreamingOutput<S> {
    fn begin(&self, track: &Track) -> Result<SessionHandle> {
        let runtime = Handle::try_current()
            .map_err(|e| Error::AudioOutput(format!("No async runtime: {}", e)))?;

        let (command_tx, command_rx) = watch::channel(StreamCommand::Play);
        let (finished_tx, finished_rx) = oneshot::channel();
        let sink = Arc::clone(&self.sink);
        let path = track.media_path().to_path_buf();
        let stream_runtime = runtime.clone();

        // No filesystem access on the caller's thread: open and probe
        // failures arrive as SessionEnd::Failed
        runtime.spawn_blocking(move || {
            let end = match AudioDecoder::open(&path) {
                Ok(decoder) => stream(decoder, sink.as_ref(), command_rx, &stream_runtime, &path),
                Err(e) => {
                    warn!("Cannot open {}: {}", path.display(), e);
                    SessionEnd::Failed(e.to_string())
                }
            };
            debug!(path = %path.display(), ?end, "Stream ended");
            let _ = finished_tx.send(end);
        });

        Ok(SessionHandle {
            control: Box::new(WatchControl { tx: command_tx }),
            finished: finished_rx,
        })
    }
}

struct WatchControl {
    tx: watch::Sender<StreamCommand>,
}

impl WatchControl {
    fn request(&self, command: StreamCommand) {
        // Cancel is final; later pause/resume must not revive the stream
        self.tx.send_if_modified(|current| {
            if *current == StreamCommand::Cancel || *current == command {
                false
            } else {
                *current = command;
                true
            }
        });
    }
}

impl SessionControl for WatchControl {
    fn pause(&self) {
        self.request(StreamCommand::Pause);
    }

    fn resume(&self) {
        self.request(StreamCommand::Play);
    }

    fn cancel(&self) {
        self.request(StreamCommand::Cancel);
    }
}

/// Wall-clock position of the stream
struct PlaybackClock {
    started: Instant,
    played: Duration,
}

impl PlaybackClock {
    fn new() -> Self {
        Self {
            started: Instant::now(),
            played: Duration::ZERO,
        }
    }

    fn advance(&mut self, chunk: Duration) {
        self.played += chunk;
    }

    /// Time at which everything written so far has finished playing
    fn deadline(&self) -> Instant {
        self.started + self.played
    }

    /// Re-anchor after a pause so paused time is not made up in a burst
    fn rebase(&mut self) {
        self.started = Instant::now()
            .checked_sub(self.played)
            .unwrap_or_else(Instant::now);
    }
}

enum Gate {
    Proceed { resumed: bool },
    Cancelled,
}

/// Block while paused; report cancellation
fn wait_until_playing(rx: &mut watch::Receiver<StreamCommand>, runtime: &Handle) -> Gate {
    let mut resumed = false;
    loop {
        let command = *rx.borrow_and_update();
        match command {
            StreamCommand::Play => return Gate::Proceed { resumed },
            StreamCommand::Cancel => return Gate::Cancelled,
            StreamCommand::Pause => {
                resumed = true;
                if runtime.block_on(rx.changed()).is_err() {
                    return Gate::Cancelled;
                }
            }
        }
    }
}

fn stream(
    mut decoder: AudioDecoder,
    sink: &dyn PcmSink,
    mut rx: watch::Receiver<StreamCommand>,
    runtime: &Handle,
    path: &Path,
) -> SessionEnd {
    let mut clock = PlaybackClock::new();

    loop {
        match wait_until_playing(&mut rx, runtime) {
            Gate::Cancelled => return SessionEnd::Cancelled,
            Gate::Proceed { resumed: true } => clock.rebase(),
            Gate::Proceed { resumed: false } => {}
        }

        let frame = match decoder.decode_chunk() {
            Ok(Some(frame)) => frame,
            Ok(None) => break,
            Err(e) => {
                warn!("Decode failed for {}: {}", path.display(), e);
                return SessionEnd::Failed(e.to_string());
            }
        };

        if let Err(e) = sink.write(&frame) {
            warn!("Sink rejected audio for {}: {}", path.display(), e);
            return SessionEnd::Failed(e.to_string());
        }
        clock.advance(frame.duration());

        // Sleep until the chunk has played, waking early on any command
        let remaining = clock.deadline().saturating_duration_since(Instant::now());
        if !remaining.is_zero() {
            match runtime.block_on(tokio::time::timeout(remaining, rx.changed())) {
                Ok(Err(_)) => return SessionEnd::Cancelled,
                Ok(Ok(())) | Err(_) => {}
            }
        }
    }

    // Let the tail of the last chunk play out before reporting completion
    loop {
        match wait_until_playing(&mut rx, runtime) {
            Gate::Cancelled => return SessionEnd::Cancelled,
            Gate::Proceed { resumed: true } => clock.rebase(),
            Gate::Proceed { resumed: false } => {}
        }
        let remaining = clock.deadline().saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return SessionEnd::Completed;
        }
        match runtime.block_on(tokio::time::timeout(remaining, rx.changed())) {
            Ok(Err(_)) => return SessionEnd::Cancelled,
            Ok(Ok(())) => {}
            Err(_) => return SessionEnd::Completed,
        }
    }
}
