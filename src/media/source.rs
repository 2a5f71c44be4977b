use std::path::PathBuf;

use thiserror::Error;

/// Errors reported by a media source. `Open` is fatal before the session
/// starts, `Decode` is fatal mid-stream, `Seek` is recoverable.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("failed to open {path}: {reason}")]
    Open { path: PathBuf, reason: String },
    #[error("decode failed: {0}")]
    Decode(String),
    #[error("seek rejected: {0}")]
    Seek(String),
}

/// One decoded frame, RGBA, ready for texture upload.
#[derive(Debug, Clone)]
pub struct VideoFrame {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// Presentation timestamp in the source's native domain (microseconds).
    pub timestamp_us: i64,
}

/// A decoder/demuxer for a single open media file.
///
/// The handle is exclusively owned by the decode thread after session start;
/// seek, restart and close are routed to that thread over the command
/// channel, so no two calls ever race on the same handle.
pub trait MediaSource: Send {
    /// Timestamp of the first frame, microseconds.
    fn start_timestamp(&self) -> i64;

    /// Current decode position, microseconds.
    fn current_timestamp(&self) -> i64;

    /// Total duration in microseconds. 0 means unknown; position math must
    /// not be attempted in that case.
    fn duration(&self) -> i64;

    /// Native frame dimensions.
    fn dimensions(&self) -> (u32, u32);

    fn frame_rate(&self) -> f64;

    /// Pull the next decoded frame. `Ok(None)` signals end of stream.
    fn next_frame(&mut self) -> Result<Option<VideoFrame>, MediaError>;

    /// Reposition to the given timestamp (microseconds, native domain).
    fn seek(&mut self, timestamp_us: i64) -> Result<(), MediaError>;

    /// Rewind to the start of the stream.
    fn restart(&mut self) -> Result<(), MediaError> {
        self.seek(self.start_timestamp())
    }

    /// Release decode resources. Called exactly once, from the decode
    /// thread's exit path.
    fn close(&mut self);
}
