#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{mpsc, Arc, Mutex};
    use std::thread;
    use std::time::{Duration, Instant};

    use crate::core::PlayerTuning;
    use crate::media::{MediaError, MediaSource, VideoFrame};
    use crate::playback::engine::{apply_restart, apply_seek, progress_tick, DisplayFrame, DisplaySink, SessionEvent};
    use crate::playback::diagnostics::DiagnosticCounters;
    use crate::playback::position::{format_time, PositionModel, TooltipProbe};
    use crate::playback::session::{PlaybackSession, ViewScale};
    use crate::playback::state::SharedState;

    const DURATION_US: i64 = 10_000_000;

    /// Scripted media source; frame pulls advance a fake clock.
    struct MockSource {
        start_us: i64,
        duration_us: i64,
        position_us: i64,
        frame_duration_us: i64,
        frames_since_seek: u64,
        /// Signal end-of-stream after this many frames per stream run.
        eos_after: Option<u64>,
        /// Fail decoding after this many total frames.
        fail_after: Option<u64>,
        total_frames: u64,
        reject_seeks: bool,
        frame_delay: Duration,
        closes: Arc<AtomicUsize>,
    }

    impl MockSource {
        fn new(closes: Arc<AtomicUsize>) -> Self {
            Self {
                start_us: 0,
                duration_us: DURATION_US,
                position_us: 0,
                frame_duration_us: 40_000,
                frames_since_seek: 0,
                eos_after: None,
                fail_after: None,
                total_frames: 0,
                reject_seeks: false,
                frame_delay: Duration::ZERO,
                closes,
            }
        }

        fn frame(&self) -> VideoFrame {
            VideoFrame {
                data: vec![0u8; 16],
                width: 2,
                height: 2,
                timestamp_us: self.position_us,
            }
        }
    }

    impl MediaSource for MockSource {
        fn start_timestamp(&self) -> i64 {
            self.start_us
        }

        fn current_timestamp(&self) -> i64 {
            self.position_us
        }

        fn duration(&self) -> i64 {
            self.duration_us
        }

        fn dimensions(&self) -> (u32, u32) {
            (2, 2)
        }

        fn frame_rate(&self) -> f64 {
            25.0
        }

        fn next_frame(&mut self) -> Result<Option<VideoFrame>, MediaError> {
            if !self.frame_delay.is_zero() {
                thread::sleep(self.frame_delay);
            }
            if let Some(limit) = self.fail_after {
                if self.total_frames >= limit {
                    return Err(MediaError::Decode("mock decode failure".into()));
                }
            }
            if let Some(limit) = self.eos_after {
                if self.frames_since_seek >= limit {
                    return Ok(None);
                }
            }
            self.position_us = (self.position_us + self.frame_duration_us).min(self.duration_us);
            self.frames_since_seek += 1;
            self.total_frames += 1;
            Ok(Some(self.frame()))
        }

        fn seek(&mut self, timestamp_us: i64) -> Result<(), MediaError> {
            if self.reject_seeks {
                return Err(MediaError::Seek("mock rejects seeks".into()));
            }
            if timestamp_us < self.start_us || timestamp_us > self.start_us + self.duration_us {
                return Err(MediaError::Seek(format!("timestamp {} out of range", timestamp_us)));
            }
            self.position_us = timestamp_us;
            self.frames_since_seek = 0;
            Ok(())
        }

        fn close(&mut self) {
            self.closes.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// Sink that records every call for assertions.
    #[derive(Default)]
    struct RecordingSink {
        frames: AtomicUsize,
        positions: Mutex<Vec<i64>>,
        tooltips: Mutex<Vec<String>>,
    }

    impl RecordingSink {
        fn frame_count(&self) -> usize {
            self.frames.load(Ordering::SeqCst)
        }

        fn position_count(&self) -> usize {
            self.positions.lock().unwrap().len()
        }
    }

    impl DisplaySink for RecordingSink {
        fn show_frame(&self, _frame: DisplayFrame) {
            self.frames.fetch_add(1, Ordering::SeqCst);
        }

        fn set_position(&self, indicator: i64) {
            self.positions.lock().unwrap().push(indicator);
        }

        fn set_tooltip(&self, text: String) {
            self.tooltips.lock().unwrap().push(text);
        }
    }

    fn model(factor: f32) -> PositionModel {
        PositionModel::new(0, DURATION_US, factor)
    }

    fn diag() -> DiagnosticCounters {
        DiagnosticCounters::new(10, Duration::from_secs(2))
    }

    fn start_session(source: MockSource) -> (PlaybackSession, Arc<RecordingSink>, mpsc::Receiver<SessionEvent>) {
        let sink = Arc::new(RecordingSink::default());
        let (events_tx, events_rx) = mpsc::channel();
        let tuning = PlayerTuning {
            refresh_period: Duration::from_millis(5),
            idle_poll: Duration::from_millis(5),
            ..Default::default()
        };
        let session = PlaybackSession::start(Box::new(source), sink.clone(), events_tx, &tuning);
        (session, sink, events_rx)
    }

    // --- State machine ---

    #[test]
    fn test_toggle_pause_flips_and_double_toggle_returns() {
        let state = SharedState::new();
        assert!(!state.is_paused());
        assert!(state.toggle_pause());
        assert!(state.is_paused());
        assert!(!state.toggle_pause());
        assert!(!state.is_paused());
    }

    #[test]
    fn test_stop_is_terminal() {
        let state = SharedState::new();
        assert!(state.is_running());
        state.request_stop();
        assert!(!state.is_running());
    }

    #[test]
    fn test_begin_seek_valid_in_any_state() {
        let state = SharedState::new();
        state.toggle_pause();
        state.begin_seek();
        assert!(state.is_seeking());
        assert!(state.is_paused());
        state.end_seek();
        assert!(!state.is_seeking());
    }

    // --- Position model ---

    #[test]
    fn test_target_indicator_midpoint() {
        let m = model(0.3);
        assert_eq!(m.target_indicator(5_000_000), 500);
        assert_eq!(m.target_indicator(0), 0);
        assert_eq!(m.target_indicator(DURATION_US), 1000);
    }

    #[test]
    fn test_target_indicator_clamps_out_of_range() {
        let m = model(0.3);
        assert_eq!(m.target_indicator(-1_000_000), 0);
        assert_eq!(m.target_indicator(DURATION_US * 2), 1000);
    }

    #[test]
    fn test_indicator_to_timestamp_inverse() {
        let m = model(0.3);
        for p in [0, 1, 250, 500, 999, 1000] {
            let ts = m.indicator_to_timestamp(p);
            assert_eq!(m.target_indicator(ts), p);
        }
    }

    #[test]
    fn test_unknown_duration_disables_position_math() {
        let m = PositionModel::new(0, 0, 0.3);
        assert!(!m.has_duration());
        assert_eq!(m.target_indicator(123_456), 0);
    }

    // Property 2: monotone approach, within 1 unit in a bounded tick count.
    #[test]
    fn test_smoothing_converges_monotonically() {
        let m = model(0.3);
        let target = 1000;
        let mut smoothed = 0i64;
        let mut previous = smoothed;
        let mut ticks = 0;
        while (target - smoothed).abs() > 1 {
            smoothed = m.step_toward(smoothed, target);
            assert!(smoothed >= previous, "indicator moved backwards");
            assert!(smoothed <= target, "indicator overshot the target");
            previous = smoothed;
            ticks += 1;
            assert!(ticks < 50, "did not converge within a bounded tick count");
        }
        // Gap roughly halves every 2 ticks at factor 0.3.
        assert!(ticks <= 25);
    }

    // Property 5: ten ticks from zero toward 500 pass 480.
    #[test]
    fn test_ten_ticks_from_zero_exceed_480() {
        let state = SharedState::new();
        state.publish_position_us(5_000_000);
        state.set_smoothed_indicator(0);
        let sink = RecordingSink::default();
        let m = model(0.3);
        for _ in 0..10 {
            progress_tick(&state, &m, &sink);
        }
        assert_eq!(m.target_indicator(state.position_us()), 500);
        assert!(
            state.smoothed_indicator() > 480,
            "smoothed was {}",
            state.smoothed_indicator()
        );
    }

    // Property 4: seeking freezes the tick entirely.
    #[test]
    fn test_tick_does_nothing_while_seeking() {
        let state = SharedState::new();
        state.publish_position_us(5_000_000);
        state.set_smoothed_indicator(100);
        state.begin_seek();
        let sink = RecordingSink::default();
        assert!(!progress_tick(&state, &model(0.3), &sink));
        assert_eq!(state.smoothed_indicator(), 100);
        assert_eq!(sink.position_count(), 0);
    }

    #[test]
    fn test_tick_skips_unknown_duration() {
        let state = SharedState::new();
        state.publish_position_us(5_000_000);
        let sink = RecordingSink::default();
        assert!(!progress_tick(&state, &PositionModel::new(0, 0, 0.3), &sink));
        assert_eq!(sink.position_count(), 0);
    }

    #[test]
    fn test_tick_pushes_stepped_value_to_sink() {
        let state = SharedState::new();
        state.publish_position_us(5_000_000);
        let sink = RecordingSink::default();
        assert!(progress_tick(&state, &model(0.3), &sink));
        // round(500 * 0.3) = 150
        assert_eq!(state.smoothed_indicator(), 150);
        assert_eq!(*sink.positions.lock().unwrap(), vec![150]);
    }

    // --- Seek / restart transitions ---

    // Property 1: the indicator reads back exactly the committed position.
    #[test]
    fn test_seek_commit_sets_indicator_exactly() {
        let closes = Arc::new(AtomicUsize::new(0));
        let mut source = MockSource::new(closes);
        let state = SharedState::new();
        let m = model(0.3);
        let mut d = diag();

        for p in [0i64, 1, 250, 500, 999, 1000] {
            state.begin_seek();
            apply_seek(&mut source, &state, &mut d, m.indicator_to_timestamp(p), p).unwrap();
            assert_eq!(state.smoothed_indicator(), p);
            assert!(!state.is_seeking());
            assert_eq!(state.position_us(), m.indicator_to_timestamp(p));
        }
    }

    #[test]
    fn test_rejected_seek_keeps_prior_state() {
        let closes = Arc::new(AtomicUsize::new(0));
        let mut source = MockSource::new(closes);
        source.reject_seeks = true;
        let state = SharedState::new();
        state.set_smoothed_indicator(321);
        state.publish_position_us(3_210_000);
        state.toggle_pause();
        state.begin_seek();
        let mut d = diag();
        d.record_frame();

        let result = apply_seek(&mut source, &state, &mut d, 5_000_000, 500);
        assert!(matches!(result, Err(MediaError::Seek(_))));
        // Prior playback state is untouched; only the seeking flag clears.
        assert_eq!(state.smoothed_indicator(), 321);
        assert_eq!(state.position_us(), 3_210_000);
        assert!(state.is_paused());
        assert!(!state.is_seeking());
        assert_eq!(d.frame_count(), 1);
    }

    // Property 3: restart resets indicator and frame count together.
    #[test]
    fn test_restart_resets_indicator_and_bookkeeping() {
        let closes = Arc::new(AtomicUsize::new(0));
        let mut source = MockSource::new(closes);
        source.position_us = 7_000_000;
        let state = SharedState::new();
        state.set_smoothed_indicator(700);
        state.publish_position_us(7_000_000);
        state.toggle_pause();
        let mut d = diag();
        d.record_frame();
        d.record_frame();

        apply_restart(&mut source, &state, &mut d).unwrap();
        assert_eq!(state.smoothed_indicator(), 0);
        assert_eq!(d.frame_count(), 0);
        assert_eq!(state.position_us(), 0);
        // Playing/Paused is left alone.
        assert!(state.is_paused());
    }

    // --- Session / threads ---

    // Property 6: one close, no sink traffic after stop returns.
    #[test]
    fn test_stop_closes_source_once_and_silences_sink() {
        let closes = Arc::new(AtomicUsize::new(0));
        let mut source = MockSource::new(closes.clone());
        source.frame_delay = Duration::from_millis(10);
        let (mut session, sink, _events) = start_session(source);

        thread::sleep(Duration::from_millis(50));
        session.stop();

        assert_eq!(closes.load(Ordering::SeqCst), 1);
        assert!(!session.is_running());

        let frames_at_stop = sink.frame_count();
        let positions_at_stop = sink.position_count();
        thread::sleep(Duration::from_millis(50));
        assert_eq!(sink.frame_count(), frames_at_stop);
        assert_eq!(sink.position_count(), positions_at_stop);

        // Idempotent: stopping again must not close the source again.
        session.stop();
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_commit_seek_through_session_while_paused() {
        let closes = Arc::new(AtomicUsize::new(0));
        let source = MockSource::new(closes);
        let (mut session, _sink, _events) = start_session(source);

        session.toggle_pause();
        session.begin_seek();
        session.commit_seek(500).unwrap();
        assert_eq!(session.smoothed_indicator(), 500);
        assert_eq!(session.position_us(), 5_000_000);
        assert!(session.is_paused());
        session.stop();
    }

    #[test]
    fn test_session_rejected_seek_reports_and_keeps_playing_state() {
        let closes = Arc::new(AtomicUsize::new(0));
        let mut source = MockSource::new(closes);
        source.reject_seeks = true;
        let (mut session, _sink, _events) = start_session(source);

        session.toggle_pause();
        session.begin_seek();
        let result = session.commit_seek(500);
        assert!(matches!(result, Err(MediaError::Seek(_))));
        assert!(session.is_paused());
        session.stop();
    }

    #[test]
    fn test_end_of_stream_triggers_automatic_restart() {
        let closes = Arc::new(AtomicUsize::new(0));
        let mut source = MockSource::new(closes);
        source.eos_after = Some(3);
        source.frame_delay = Duration::from_millis(2);
        let (mut session, sink, _events) = start_session(source);

        let deadline = Instant::now() + Duration::from_secs(2);
        while sink.frame_count() <= 3 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(10));
        }
        // More frames than one stream run can produce: restart happened.
        assert!(sink.frame_count() > 3);
        session.stop();
    }

    #[test]
    fn test_decode_failure_is_fatal_and_reported() {
        let closes = Arc::new(AtomicUsize::new(0));
        let mut source = MockSource::new(closes.clone());
        source.fail_after = Some(2);
        let (mut session, _sink, events) = start_session(source);

        let event = events
            .recv_timeout(Duration::from_secs(2))
            .expect("fatal error event");
        match event {
            SessionEvent::Error { fatal, .. } => assert!(fatal),
        }

        let deadline = Instant::now() + Duration::from_secs(2);
        while session.is_running() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(10));
        }
        assert!(!session.is_running());
        session.stop();
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_paused_session_consumes_no_frames() {
        let closes = Arc::new(AtomicUsize::new(0));
        let mut source = MockSource::new(closes);
        source.frame_delay = Duration::from_millis(1);
        let (mut session, sink, _events) = start_session(source);

        session.toggle_pause();
        thread::sleep(Duration::from_millis(30));
        let frames_when_paused = sink.frame_count();
        thread::sleep(Duration::from_millis(60));
        // A frame already in flight when pause landed may still arrive.
        assert!(sink.frame_count() <= frames_when_paused + 1);
        session.stop();
    }

    // --- Resize ---

    // Property 7: scale never escapes the configured range.
    #[test]
    fn test_view_scale_clamps_under_any_sequence() {
        let mut scale = ViewScale::new(0.5, 0.2, 1.5);
        for factor in [1.1, 1.1, 10.0, 1.1, 0.9, 0.001, 0.9, 0.9, 100.0] {
            let value = scale.apply(factor);
            assert!((0.2..=1.5).contains(&value), "scale escaped: {}", value);
        }
        assert_eq!(scale.apply(1000.0), 1.5);
        assert_eq!(scale.apply(0.0001), 0.2);
    }

    // --- Tooltip & formatting ---

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(0), "00:00");
        assert_eq!(format_time(59_000), "00:59");
        assert_eq!(format_time(61_000), "01:01");
        assert_eq!(format_time(3_600_000), "60:00");
        assert_eq!(format_time(-5), "00:00");
    }

    #[test]
    fn test_tooltip_probe_rate_limited() {
        let mut probe = TooltipProbe::new(Duration::from_millis(20));
        assert_eq!(probe.probe(0.5, DURATION_US), Some("00:05".to_string()));
        assert_eq!(probe.probe(0.6, DURATION_US), None);
        thread::sleep(Duration::from_millis(25));
        assert_eq!(probe.probe(1.0, DURATION_US), Some("00:10".to_string()));
    }

    #[test]
    fn test_tooltip_probe_needs_duration() {
        let mut probe = TooltipProbe::new(Duration::from_millis(0));
        assert_eq!(probe.probe(0.5, 0), None);
    }
}
