use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};

use crate::media::probe::{self, MediaInfo};
use crate::media::{MediaError, MediaSource, VideoFrame};

/// `MediaSource` backed by an ffmpeg child process streaming rgb24 rawvideo
/// on stdout. Metadata comes from ffprobe at open time; seeking kills the
/// child and respawns it at the target timestamp with `-ss`.
pub struct FfmpegSource {
    path: PathBuf,
    info: MediaInfo,
    child: Option<Child>,
    /// Timestamp the current child was started at, microseconds.
    stream_start_us: i64,
    /// Frames read from the current child.
    frames_read: u64,
    frame_duration_us: i64,
}

impl FfmpegSource {
    pub fn open(path: &Path) -> Result<Self, MediaError> {
        let info = probe::probe(path)?;
        log::info!(
            "Opened {}: {:.2}s, {}x{}, {:.2} fps",
            path.display(),
            info.duration_us as f64 / 1_000_000.0,
            info.width,
            info.height,
            info.frame_rate
        );

        let frame_duration_us = (1_000_000.0 / info.frame_rate) as i64;
        let child = spawn_stream(path, 0.0).map_err(|reason| MediaError::Open {
            path: path.to_path_buf(),
            reason,
        })?;

        Ok(Self {
            path: path.to_path_buf(),
            info,
            child: Some(child),
            stream_start_us: 0,
            frames_read: 0,
            frame_duration_us,
        })
    }

    fn restart_stream_at(&mut self, timestamp_us: i64) -> Result<(), String> {
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
        let child = spawn_stream(&self.path, timestamp_us as f64 / 1_000_000.0)?;
        self.child = Some(child);
        self.stream_start_us = timestamp_us;
        self.frames_read = 0;
        Ok(())
    }
}

fn spawn_stream(path: &Path, start_seconds: f64) -> Result<Child, String> {
    let path_str = path.to_str().ok_or("path is not valid UTF-8")?;

    Command::new("ffmpeg")
        .args([
            "-ss", &format!("{:.6}", start_seconds),
            "-i", path_str,
            "-f", "rawvideo",
            "-pix_fmt", "rgb24",
            "-an",
            "-v", "quiet",
            "-",
        ])
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .stdin(Stdio::null())
        .spawn()
        .map_err(|e| format!("failed to spawn ffmpeg: {}", e))
}

/// ffmpeg emits rgb24; egui wants rgba.
fn rgb24_to_rgba(rgb: &[u8]) -> Vec<u8> {
    let mut rgba = Vec::with_capacity(rgb.len() / 3 * 4);
    for chunk in rgb.chunks_exact(3) {
        rgba.push(chunk[0]);
        rgba.push(chunk[1]);
        rgba.push(chunk[2]);
        rgba.push(255);
    }
    rgba
}

impl MediaSource for FfmpegSource {
    fn start_timestamp(&self) -> i64 {
        0
    }

    fn current_timestamp(&self) -> i64 {
        let position = self.stream_start_us + self.frames_read as i64 * self.frame_duration_us;
        if self.info.duration_us > 0 {
            position.min(self.info.duration_us)
        } else {
            position
        }
    }

    fn duration(&self) -> i64 {
        self.info.duration_us
    }

    fn dimensions(&self) -> (u32, u32) {
        (self.info.width, self.info.height)
    }

    fn frame_rate(&self) -> f64 {
        self.info.frame_rate
    }

    fn next_frame(&mut self) -> Result<Option<VideoFrame>, MediaError> {
        let child = self
            .child
            .as_mut()
            .ok_or_else(|| MediaError::Decode("decode stream is not running".into()))?;
        let stdout = child
            .stdout
            .as_mut()
            .ok_or_else(|| MediaError::Decode("ffmpeg stdout is not piped".into()))?;

        let frame_size = (self.info.width * self.info.height * 3) as usize;
        let mut rgb = vec![0u8; frame_size];
        match stdout.read_exact(&mut rgb) {
            Ok(()) => {}
            // The pipe closing mid-frame or between frames is end of stream.
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => return Err(MediaError::Decode(format!("frame read failed: {}", e))),
        }

        self.frames_read += 1;
        Ok(Some(VideoFrame {
            data: rgb24_to_rgba(&rgb),
            width: self.info.width,
            height: self.info.height,
            timestamp_us: self.current_timestamp(),
        }))
    }

    fn seek(&mut self, timestamp_us: i64) -> Result<(), MediaError> {
        if timestamp_us < 0 || (self.info.duration_us > 0 && timestamp_us > self.info.duration_us) {
            return Err(MediaError::Seek(format!(
                "timestamp {}us outside 0..{}us",
                timestamp_us, self.info.duration_us
            )));
        }
        log::debug!("Seeking to {:.3}s", timestamp_us as f64 / 1_000_000.0);
        self.restart_stream_at(timestamp_us)
            .map_err(MediaError::Seek)
    }

    fn close(&mut self) {
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
            log::info!("Closed decode stream for {}", self.path.display());
        }
    }
}

impl Drop for FfmpegSource {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::rgb24_to_rgba;

    #[test]
    fn test_rgb24_to_rgba_appends_opaque_alpha() {
        let rgb = [1u8, 2, 3, 4, 5, 6];
        let rgba = rgb24_to_rgba(&rgb);
        assert_eq!(rgba, vec![1, 2, 3, 255, 4, 5, 6, 255]);
    }
}
