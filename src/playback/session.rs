use std::path::Path;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::core::PlayerTuning;
use crate::media::{FfmpegSource, MediaError, MediaSource};
use crate::playback::engine::{decode_loop, progress_loop, DisplaySink, SessionEvent, TransportCommand};
use crate::playback::position::{PositionModel, INDICATOR_MAX};
use crate::playback::state::SharedState;

/// How long `commit_seek` waits for the decode thread to acknowledge.
/// The decode thread drains commands at least every idle poll, so this only
/// triggers if the thread died mid-session.
const SEEK_REPLY_TIMEOUT: Duration = Duration::from_secs(2);

/// Display scale with a clamped multiply, the only geometry the transport
/// controller owns. Decode and timing state never see it.
#[derive(Debug, Clone, Copy)]
pub struct ViewScale {
    scale: f32,
    min: f32,
    max: f32,
}

impl ViewScale {
    pub fn new(initial: f32, min: f32, max: f32) -> Self {
        Self {
            scale: initial.clamp(min, max),
            min,
            max,
        }
    }

    pub fn get(&self) -> f32 {
        self.scale
    }

    /// Multiplies the scale by `factor`, clamped to the configured range.
    pub fn apply(&mut self, factor: f32) -> f32 {
        self.scale = (self.scale * factor).clamp(self.min, self.max);
        self.scale
    }
}

/// One open media file from `open` to `stop`: the transport controller.
///
/// Owns the decode and progress threads; the source handle itself lives on
/// the decode thread and is reached through the command channel, so no two
/// callers ever touch it concurrently.
pub struct PlaybackSession {
    state: Arc<SharedState>,
    commands: mpsc::Sender<TransportCommand>,
    decode_thread: Option<thread::JoinHandle<()>>,
    progress_thread: Option<thread::JoinHandle<()>>,
    model: PositionModel,
    scale: ViewScale,
    dimensions: (u32, u32),
}

impl PlaybackSession {
    /// Opens `path` with the ffmpeg source and starts playback.
    pub fn open_file(
        path: &Path,
        sink: Arc<dyn DisplaySink>,
        events: mpsc::Sender<SessionEvent>,
        tuning: &PlayerTuning,
    ) -> Result<Self, MediaError> {
        let source = FfmpegSource::open(path)?;
        Ok(Self::start(Box::new(source), sink, events, tuning))
    }

    /// Starts playback on an already-open source. Spawns the decode thread
    /// and the progress thread; the session begins Playing.
    pub fn start(
        source: Box<dyn MediaSource>,
        sink: Arc<dyn DisplaySink>,
        events: mpsc::Sender<SessionEvent>,
        tuning: &PlayerTuning,
    ) -> Self {
        let state = Arc::new(SharedState::new());
        state.publish_position_us(source.current_timestamp());

        let model = PositionModel::new(
            source.start_timestamp(),
            source.duration(),
            tuning.smoothing_factor,
        );
        let dimensions = source.dimensions();
        log::info!(
            "Session started: {}x{} at {:.2} fps, duration {:.2}s",
            dimensions.0,
            dimensions.1,
            source.frame_rate(),
            source.duration() as f64 / 1_000_000.0
        );

        let (cmd_tx, cmd_rx) = mpsc::channel();

        let decode_thread = thread::spawn({
            let state = Arc::clone(&state);
            let sink = Arc::clone(&sink);
            let tuning = tuning.clone();
            move || decode_loop(source, state, sink, cmd_rx, events, tuning)
        });

        let progress_thread = thread::spawn({
            let state = Arc::clone(&state);
            let period = tuning.refresh_period;
            move || progress_loop(state, model, sink, period)
        });

        Self {
            state,
            commands: cmd_tx,
            decode_thread: Some(decode_thread),
            progress_thread: Some(progress_thread),
            model,
            scale: ViewScale::new(tuning.initial_scale, tuning.min_scale, tuning.max_scale),
            dimensions,
        }
    }

    /// Flips Playing/Paused; returns the new paused flag.
    pub fn toggle_pause(&self) -> bool {
        let paused = self.state.toggle_pause();
        log::info!("Playback {}", if paused { "paused" } else { "resumed" });
        paused
    }

    pub fn is_paused(&self) -> bool {
        self.state.is_paused()
    }

    /// Rewinds to the start of the stream. Playing/Paused is unchanged;
    /// failures are reported through the event channel.
    pub fn restart(&self) {
        let _ = self.commands.send(TransportCommand::Restart);
    }

    /// The user grabbed the slider: freeze indicator updates and frame
    /// consumption until the seek commits.
    pub fn begin_seek(&self) {
        self.state.begin_seek();
    }

    /// Commits a seek to the given indicator position (0..=1000). Synchronous
    /// from the caller's view: returns once the decode thread has performed
    /// the seek. A rejected seek leaves playback in its prior state.
    pub fn commit_seek(&self, indicator: i64) -> Result<(), MediaError> {
        if !self.model.has_duration() {
            // No duration, no position math; just release the freeze.
            self.state.end_seek();
            return Ok(());
        }

        let indicator = indicator.clamp(0, INDICATOR_MAX);
        let target_us = self.model.indicator_to_timestamp(indicator);
        let (reply_tx, reply_rx) = mpsc::channel();

        self.commands
            .send(TransportCommand::Seek {
                target_us,
                indicator,
                reply: reply_tx,
            })
            .map_err(|_| {
                self.state.end_seek();
                MediaError::Seek("decode thread is gone".into())
            })?;

        match reply_rx.recv_timeout(SEEK_REPLY_TIMEOUT) {
            Ok(result) => result,
            Err(_) => {
                self.state.end_seek();
                Err(MediaError::Seek("seek was not acknowledged".into()))
            }
        }
    }

    /// Adjusts only the display scale; returns the new effective scale.
    pub fn resize(&mut self, factor: f32) -> f32 {
        self.scale.apply(factor)
    }

    pub fn scale(&self) -> f32 {
        self.scale.get()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.dimensions
    }

    pub fn duration_us(&self) -> i64 {
        self.model.duration_us()
    }

    pub fn position_us(&self) -> i64 {
        self.state.position_us()
    }

    pub fn smoothed_indicator(&self) -> i64 {
        self.state.smoothed_indicator()
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running()
    }

    /// Cooperative shutdown: flips running off, wakes the decode thread and
    /// joins both threads. The source is closed exactly once, by the decode
    /// thread on its way out. Idempotent.
    pub fn stop(&mut self) {
        self.state.request_stop();
        let _ = self.commands.send(TransportCommand::Shutdown);
        if let Some(handle) = self.decode_thread.take() {
            let _ = handle.join();
        }
        if let Some(handle) = self.progress_thread.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for PlaybackSession {
    fn drop(&mut self) {
        self.stop();
    }
}
