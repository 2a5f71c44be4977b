use std::time::Duration;

/// Tuning knobs for the playback engine. There is no config file; the only
/// input surface is the media path, so these are compile-time defaults that
/// callers may override in code.
#[derive(Debug, Clone)]
pub struct PlayerTuning {
    /// Period of the progress-refresh tick that moves the slider.
    pub refresh_period: Duration,
    /// How long the decode loop sleeps while paused or seeking.
    pub idle_poll: Duration,
    /// Fraction of the indicator gap closed per refresh tick.
    pub smoothing_factor: f32,
    /// Display scale clamp range and starting value.
    pub min_scale: f32,
    pub max_scale: f32,
    pub initial_scale: f32,
    /// Minimum interval between tooltip recomputations while hovering.
    pub tooltip_interval: Duration,
    /// FPS is recomputed on every Nth frame.
    pub fps_sample_stride: u64,
    /// The FPS measurement window resets once it exceeds this.
    pub fps_window: Duration,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            refresh_period: Duration::from_millis(40),
            idle_poll: Duration::from_millis(100),
            smoothing_factor: 0.3,
            min_scale: 0.2,
            max_scale: 1.5,
            initial_scale: 0.5,
            tooltip_interval: Duration::from_millis(100),
            fps_sample_stride: 10,
            fps_window: Duration::from_secs(2),
        }
    }
}
