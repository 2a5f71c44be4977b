use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::core::PlayerTuning;
use crate::media::{MediaError, MediaSource, VideoFrame};
use crate::playback::diagnostics::{DiagnosticCounters, OverlayText};
use crate::playback::position::PositionModel;
use crate::playback::state::SharedState;

/// A decoded frame plus the diagnostics overlay to composite over it.
#[derive(Debug, Clone)]
pub struct DisplayFrame {
    pub image: VideoFrame,
    pub overlay: OverlayText,
}

/// Where rendered output goes. The GUI implements this; tests record calls.
pub trait DisplaySink: Send + Sync {
    fn show_frame(&self, frame: DisplayFrame);
    fn set_position(&self, indicator: i64);
    fn set_tooltip(&self, text: String);
}

/// Commands routed to the decode thread, which exclusively owns the source.
pub enum TransportCommand {
    Seek {
        target_us: i64,
        indicator: i64,
        reply: mpsc::Sender<Result<(), MediaError>>,
    },
    Restart,
    Shutdown,
}

/// Out-of-band notifications for the UI. Errors inside the background
/// threads never unwind across the thread boundary; they arrive here.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    Error { message: String, fatal: bool },
}

/// Seek the source and, on success, reset bookkeeping and hard-set the
/// indicator before seeking flips back to false. On failure playback stays
/// in its prior state; only the seeking flag is cleared.
pub fn apply_seek(
    source: &mut dyn MediaSource,
    state: &SharedState,
    diag: &mut DiagnosticCounters,
    target_us: i64,
    indicator: i64,
) -> Result<(), MediaError> {
    let result = source.seek(target_us);
    if result.is_ok() {
        diag.reset();
        state.set_smoothed_indicator(indicator);
        state.publish_position_us(source.current_timestamp());
    }
    state.end_seek();
    result
}

/// Rewind to stream start. Indicator and frame bookkeeping reset together;
/// Playing/Paused is left alone.
pub fn apply_restart(
    source: &mut dyn MediaSource,
    state: &SharedState,
    diag: &mut DiagnosticCounters,
) -> Result<(), MediaError> {
    source.restart()?;
    state.set_smoothed_indicator(0);
    diag.reset();
    state.publish_position_us(source.current_timestamp());
    Ok(())
}

/// One refresh tick: move the smoothed indicator a fraction of the way
/// toward the target and push it to the sink. Does nothing while seeking or
/// when duration is unknown. Returns whether a value was pushed.
pub fn progress_tick(state: &SharedState, model: &PositionModel, sink: &dyn DisplaySink) -> bool {
    if state.is_seeking() || !model.has_duration() {
        return false;
    }
    let target = model.target_indicator(state.position_us());
    let smoothed = state.smoothed_indicator();
    if target == smoothed {
        return false;
    }
    let next = model.step_toward(smoothed, target);
    state.set_smoothed_indicator(next);
    sink.set_position(next);
    true
}

/// The decode thread body. Owns the source for the whole session and closes
/// it at the single exit point below, whatever path got us there.
pub fn decode_loop(
    mut source: Box<dyn MediaSource>,
    state: Arc<SharedState>,
    sink: Arc<dyn DisplaySink>,
    commands: mpsc::Receiver<TransportCommand>,
    events: mpsc::Sender<SessionEvent>,
    tuning: PlayerTuning,
) {
    log::info!("Decode thread started");
    let mut diag = DiagnosticCounters::new(tuning.fps_sample_stride, tuning.fps_window);

    'session: loop {
        // Commands first, so a committed seek or a stop is visible to this
        // very iteration and no stale frame gets shown after it.
        while let Ok(command) = commands.try_recv() {
            match command {
                TransportCommand::Shutdown => {
                    state.request_stop();
                    break 'session;
                }
                TransportCommand::Seek {
                    target_us,
                    indicator,
                    reply,
                } => {
                    let result = apply_seek(source.as_mut(), &state, &mut diag, target_us, indicator);
                    if let Err(e) = &result {
                        log::warn!("Seek failed: {}", e);
                    }
                    let _ = reply.send(result);
                }
                TransportCommand::Restart => {
                    if let Err(e) = apply_restart(source.as_mut(), &state, &mut diag) {
                        log::warn!("Restart failed: {}", e);
                        let _ = events.send(SessionEvent::Error {
                            message: format!("Restart failed: {}", e),
                            fatal: false,
                        });
                    }
                }
            }
        }

        if !state.is_running() {
            break;
        }
        if state.is_paused() || state.is_seeking() {
            thread::sleep(tuning.idle_poll);
            continue;
        }

        match source.next_frame() {
            Ok(Some(frame)) => {
                state.publish_position_us(frame.timestamp_us);
                let overlay = diag.overlay(frame.timestamp_us);
                sink.show_frame(DisplayFrame {
                    image: frame,
                    overlay,
                });
                diag.record_frame();
                // No pacing to the source frame rate here: the decode call is
                // the rate limiter, so fast hardware plays fast. See DESIGN.md.
            }
            Ok(None) => {
                log::debug!("End of stream, restarting");
                if let Err(e) = apply_restart(source.as_mut(), &state, &mut diag) {
                    log::error!("Restart at end of stream failed: {}", e);
                    let _ = events.send(SessionEvent::Error {
                        message: format!("Restart failed: {}", e),
                        fatal: true,
                    });
                    state.request_stop();
                }
            }
            Err(e) => {
                log::error!("Decode failed: {}", e);
                let _ = events.send(SessionEvent::Error {
                    message: format!("Playback failed: {}", e),
                    fatal: true,
                });
                state.request_stop();
            }
        }
    }

    // Single release point for the decode handle.
    source.close();
    log::info!("Decode thread stopped");
}

/// The progress thread body: a fixed-period tick independent of decode
/// speed. Exits permanently once the session stops running.
pub fn progress_loop(
    state: Arc<SharedState>,
    model: PositionModel,
    sink: Arc<dyn DisplaySink>,
    period: Duration,
) {
    log::debug!("Progress thread started");
    while state.is_running() {
        thread::sleep(period);
        if !state.is_running() {
            break;
        }
        progress_tick(&state, &model, sink.as_ref());
    }
    log::debug!("Progress thread stopped");
}
