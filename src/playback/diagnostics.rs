use std::time::{Duration, Instant};

/// Overlay strings composited over the video by the display side.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayText {
    pub time: String,
    pub frame: String,
    pub fps: String,
}

/// Frame-count and FPS bookkeeping for the diagnostics overlay.
///
/// FPS is a trailing average over the current measurement window, recomputed
/// only on every Nth frame to bound overlay churn; the window resets once it
/// outgrows `fps_window`.
pub struct DiagnosticCounters {
    frame_count: u64,
    window_start: Instant,
    fps: f64,
    sample_stride: u64,
    fps_window: Duration,
}

impl DiagnosticCounters {
    pub fn new(sample_stride: u64, fps_window: Duration) -> Self {
        Self {
            frame_count: 0,
            window_start: Instant::now(),
            fps: 0.0,
            sample_stride: sample_stride.max(1),
            fps_window,
        }
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn fps(&self) -> f64 {
        self.fps
    }

    /// Records one displayed frame.
    pub fn record_frame(&mut self) {
        self.record_frame_at(Instant::now());
    }

    fn record_frame_at(&mut self, now: Instant) {
        self.frame_count += 1;
        if self.frame_count % self.sample_stride == 0 {
            let elapsed = now.duration_since(self.window_start);
            let elapsed_seconds = elapsed.as_secs_f64();
            if elapsed_seconds > 0.0 {
                self.fps = self.frame_count as f64 / elapsed_seconds;
            }
            if elapsed > self.fps_window {
                self.frame_count = 0;
                self.window_start = now;
            }
        }
    }

    /// Hard reset after a seek or restart, in the same logical step as the
    /// indicator reset.
    pub fn reset(&mut self) {
        self.frame_count = 0;
        self.window_start = Instant::now();
    }

    /// Overlay lines for the given media position.
    pub fn overlay(&self, position_us: i64) -> OverlayText {
        OverlayText {
            time: format!("Time: {:.1}s", position_us as f64 / 1_000_000.0),
            frame: format!("Frame: {}", self.frame_count),
            fps: format!("FPS: {:.1}", self.fps),
        }
    }
}
