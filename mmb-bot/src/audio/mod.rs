//! Audio output
//!
//! The playback engine sees audio only through [`AudioOutput`]: begin a
//! session for a track, steer it through [`SessionControl`], and wait for
//! exactly one [`SessionEnd`] on the session's completion channel.
//!
//! **Components:**
//! - `decode`: symphonia file decoder producing [`PcmFrame`]s
//! - `sink`: [`PcmSink`] seam for the voice transport
//! - `output`: [`StreamingOutput`], real-time paced decode-to-sink sessions

pub mod decode;
pub mod output;
pub mod sink;

pub use decode::AudioDecoder;
pub use output::StreamingOutput;
pub use sink::{DiscardSink, PcmFrame, PcmSink};

use crate::error::Result;
use mmb_common::Track;
use tokio::sync::oneshot;

/// How a session ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEnd {
    /// Reached the end of the media
    Completed,
    /// Stopped through [`SessionControl::cancel`]
    Cancelled,
    /// Decoding or transport failed mid-stream
    Failed(String),
}

/// Steering for one in-flight session
///
/// All methods return immediately; the session observes them on its own
/// schedule.
pub trait SessionControl: Send + Sync {
    fn pause(&self);
    fn resume(&self);
    fn cancel(&self);
}

/// A started session
pub struct SessionHandle {
    pub control: Box<dyn SessionControl>,
    /// Resolves once with the session's end; a dropped sender means the
    /// session vanished without reporting
    pub finished: oneshot::Receiver<SessionEnd>,
}

/// Starts audio sessions
///
/// `begin` is called with the engine lock held, so it must return at once
/// without file or network I/O. Problems with the media itself (missing
/// file, unsupported format) are reported as [`SessionEnd::Failed`]. An
/// `Err` means no session could be spawned at all, and no end will be
/// reported.
pub trait AudioOutput: Send + Sync + 'static {
    fn begin(&self, track: &Track) -> Result<SessionHandle>;
}
