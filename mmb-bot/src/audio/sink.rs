//! PCM sink seam
//!
//! Decoded audio leaves the bot through a [`PcmSink`]. The voice transport
//! (Opus encoding and the Mumble connection) plugs in here.

use crate::error::Result;
use std::time::Duration;

/// Interleaved f32 PCM at the file's native rate and channel count
#[derive(Debug, Clone, PartialEq)]
pub struct PcmFrame {
    /// Interleaved samples [c0, c1, .., c0, c1, ..]
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub channels: u16,
}

impl PcmFrame {
    /// Number of sample frames (samples per channel)
    pub fn frames(&self) -> usize {
        self.samples.len() / usize::from(self.channels.max(1))
    }

    /// Playback duration of this chunk
    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.frames() as f64 / f64::from(self.sample_rate))
    }
}

/// Consumer of decoded audio
///
/// Called from a blocking decode thread at real-time pace.
pub trait PcmSink: Send + Sync + 'static {
    fn write(&self, frame: &PcmFrame) -> Result<()>;
}

/// Sink that drops every frame
#[derive(Debug, Default, Clone, Copy)]
pub struct DiscardSink;

impl PcmSink for DiscardSink {
    fn write(&self, _frame: &PcmFrame) -> Result<()> {
        Ok(())
    }
}
