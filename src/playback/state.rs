use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

/// Shared playback state read by the decode thread, the progress thread and
/// the UI. All fields are atomics; readers tolerate staleness of one polling
/// interval, writers never hold anything across their store.
pub struct SharedState {
    running: AtomicBool,
    paused: AtomicBool,
    seeking: AtomicBool,
    /// Current decode position as last published by the decode thread.
    position_us: AtomicI64,
    /// The 0..=1000 indicator value actually shown on the slider.
    smoothed_indicator: AtomicI64,
}

impl SharedState {
    pub fn new() -> Self {
        Self {
            running: AtomicBool::new(true),
            paused: AtomicBool::new(false),
            seeking: AtomicBool::new(false),
            position_us: AtomicI64::new(0),
            smoothed_indicator: AtomicI64::new(0),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Terminal: once stopped, a session never runs again.
    pub fn request_stop(&self) {
        self.running.store(false, Ordering::Release);
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Acquire)
    }

    /// Flips Playing/Paused and returns the new paused flag.
    pub fn toggle_pause(&self) -> bool {
        // fetch_xor(true) is an atomic flip.
        !self.paused.fetch_xor(true, Ordering::AcqRel)
    }

    pub fn is_seeking(&self) -> bool {
        self.seeking.load(Ordering::Acquire)
    }

    /// Freezes indicator updates and frame consumption while the user holds
    /// the slider.
    pub fn begin_seek(&self) {
        self.seeking.store(true, Ordering::Release);
    }

    pub fn end_seek(&self) {
        self.seeking.store(false, Ordering::Release);
    }

    pub fn position_us(&self) -> i64 {
        self.position_us.load(Ordering::Acquire)
    }

    /// Published by the decode thread after every frame, seek or restart so
    /// the progress tick never has to touch the source handle.
    pub fn publish_position_us(&self, position_us: i64) {
        self.position_us.store(position_us, Ordering::Release);
    }

    pub fn smoothed_indicator(&self) -> i64 {
        self.smoothed_indicator.load(Ordering::Acquire)
    }

    pub fn set_smoothed_indicator(&self, value: i64) {
        self.smoothed_indicator.store(value, Ordering::Release);
    }
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new()
    }
}
