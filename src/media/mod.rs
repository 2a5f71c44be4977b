pub mod ffmpeg_source;
pub mod probe;
pub mod source;

pub use ffmpeg_source::FfmpegSource;
pub use source::{MediaError, MediaSource, VideoFrame};
