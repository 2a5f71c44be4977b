use std::time::{Duration, Instant};

/// The slider works on a normalized 0..=1000 scale regardless of duration.
pub const INDICATOR_MAX: i64 = 1000;

/// Maps between the source's microsecond timestamp domain and the normalized
/// indicator domain, and applies per-tick smoothing so the slider converges
/// on the true position instead of jumping.
#[derive(Debug, Clone, Copy)]
pub struct PositionModel {
    start_us: i64,
    duration_us: i64,
    smoothing_factor: f32,
}

impl PositionModel {
    pub fn new(start_us: i64, duration_us: i64, smoothing_factor: f32) -> Self {
        Self {
            start_us,
            duration_us,
            smoothing_factor,
        }
    }

    pub fn duration_us(&self) -> i64 {
        self.duration_us
    }

    /// True when duration is unknown and no indicator math may be done.
    pub fn has_duration(&self) -> bool {
        self.duration_us > 0
    }

    /// Instantaneous indicator value for a timestamp, clamped to the scale.
    pub fn target_indicator(&self, current_us: i64) -> i64 {
        if !self.has_duration() {
            return 0;
        }
        let target = (current_us - self.start_us) * INDICATOR_MAX / self.duration_us;
        target.clamp(0, INDICATOR_MAX)
    }

    /// Inverse mapping used when committing a seek.
    pub fn indicator_to_timestamp(&self, indicator: i64) -> i64 {
        let indicator = indicator.clamp(0, INDICATOR_MAX);
        self.start_us + indicator * self.duration_us / INDICATOR_MAX
    }

    /// One smoothing step: close a fixed fraction of the gap to the target.
    /// Never jumps; hard resets after seek/restart bypass this on purpose.
    pub fn step_toward(&self, smoothed: i64, target: i64) -> i64 {
        let delta = ((target - smoothed) as f32 * self.smoothing_factor).round() as i64;
        smoothed + delta
    }
}

/// "MM:SS" rendering for tooltips.
pub fn format_time(millis: i64) -> String {
    let seconds = (millis / 1000).max(0);
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

/// Rate-limited projection from a slider hover fraction to a time string.
/// Read-only with respect to playback state.
pub struct TooltipProbe {
    min_interval: Duration,
    last_update: Option<Instant>,
}

impl TooltipProbe {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_update: None,
        }
    }

    /// Returns the formatted time under the cursor, or None when rate-limited
    /// or when duration is unknown.
    pub fn probe(&mut self, fraction: f32, duration_us: i64) -> Option<String> {
        if duration_us <= 0 {
            return None;
        }
        let now = Instant::now();
        if let Some(last) = self.last_update {
            if now.duration_since(last) < self.min_interval {
                return None;
            }
        }
        self.last_update = Some(now);
        let millis = (fraction.clamp(0.0, 1.0) as f64 * duration_us as f64 / 1000.0) as i64;
        Some(format_time(millis))
    }
}
