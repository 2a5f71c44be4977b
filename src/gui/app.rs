use std::path::PathBuf;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{mpsc, Arc, Mutex};

use eframe::egui;

use crate::core::PlayerTuning;
use crate::playback::{
    DisplayFrame, DisplaySink, OverlayText, PlaybackSession, SessionEvent, TooltipProbe,
    INDICATOR_MAX,
};

/// Height reserved for the control strip under the video.
const CONTROLS_HEIGHT: f32 = 64.0;

/// Display sink backed by the egui context: frames go over a channel to the
/// UI thread, position/tooltip land in shared cells, and every call wakes
/// the render loop.
pub struct GuiSink {
    frame_tx: mpsc::Sender<DisplayFrame>,
    position: AtomicI64,
    tooltip: Mutex<Option<String>>,
    ctx: egui::Context,
}

impl GuiSink {
    fn new(frame_tx: mpsc::Sender<DisplayFrame>, ctx: egui::Context) -> Self {
        Self {
            frame_tx,
            position: AtomicI64::new(0),
            tooltip: Mutex::new(None),
            ctx,
        }
    }

    fn position(&self) -> i64 {
        self.position.load(Ordering::Acquire)
    }

    fn tooltip(&self) -> Option<String> {
        self.tooltip.lock().unwrap().clone()
    }
}

impl DisplaySink for GuiSink {
    fn show_frame(&self, frame: DisplayFrame) {
        let _ = self.frame_tx.send(frame);
        self.ctx.request_repaint();
    }

    fn set_position(&self, indicator: i64) {
        self.position.store(indicator, Ordering::Release);
        self.ctx.request_repaint();
    }

    fn set_tooltip(&self, text: String) {
        *self.tooltip.lock().unwrap() = Some(text);
    }
}

pub struct PlayerApp {
    session: Option<PlaybackSession>,
    sink: Arc<GuiSink>,
    frame_rx: mpsc::Receiver<DisplayFrame>,
    events_rx: mpsc::Receiver<SessionEvent>,
    texture: Option<egui::TextureHandle>,
    overlay: Option<OverlayText>,
    tooltip_probe: TooltipProbe,
    /// Slider position while the user is dragging it.
    drag_value: i64,
    dragging: bool,
    /// Recoverable error shown as a status line.
    status: Option<String>,
    /// Fatal error; the session is already torn down when this is set.
    fatal: Option<String>,
}

impl PlayerApp {
    pub fn new(cc: &eframe::CreationContext<'_>, path: PathBuf) -> anyhow::Result<Self> {
        let mut visuals = egui::Visuals::dark();
        visuals.override_text_color = Some(egui::Color32::WHITE);
        cc.egui_ctx.set_visuals(visuals);

        let tuning = PlayerTuning::default();
        let (frame_tx, frame_rx) = mpsc::channel();
        let (events_tx, events_rx) = mpsc::channel();
        let sink = Arc::new(GuiSink::new(frame_tx, cc.egui_ctx.clone()));

        let session = PlaybackSession::open_file(&path, sink.clone(), events_tx, &tuning)?;
        request_window_size(&cc.egui_ctx, &session);

        Ok(Self {
            session: Some(session),
            sink,
            frame_rx,
            events_rx,
            texture: None,
            overlay: None,
            tooltip_probe: TooltipProbe::new(tuning.tooltip_interval),
            drag_value: 0,
            dragging: false,
            status: None,
            fatal: None,
        })
    }

    fn drain_events(&mut self) {
        while let Ok(event) = self.events_rx.try_recv() {
            match event {
                SessionEvent::Error { message, fatal } => {
                    log::error!("Session error: {}", message);
                    if fatal {
                        // Dropping the session joins both threads.
                        self.session.take();
                        self.fatal = Some(message);
                    } else {
                        self.status = Some(message);
                    }
                }
            }
        }
    }

    fn drain_frames(&mut self, ctx: &egui::Context) {
        let mut latest = None;
        while let Ok(frame) = self.frame_rx.try_recv() {
            latest = Some(frame);
        }
        if let Some(frame) = latest {
            let size = [frame.image.width as usize, frame.image.height as usize];
            if frame.image.data.len() == size[0] * size[1] * 4 {
                let color_image = egui::ColorImage::from_rgba_unmultiplied(size, &frame.image.data);
                self.texture =
                    Some(ctx.load_texture("video_frame", color_image, egui::TextureOptions::LINEAR));
                self.overlay = Some(frame.overlay);
            } else {
                log::warn!(
                    "Invalid frame data size: expected {}, got {}",
                    size[0] * size[1] * 4,
                    frame.image.data.len()
                );
            }
        }
    }

    fn video_panel(&mut self, ui: &mut egui::Ui) {
        let Some(session) = &self.session else {
            return;
        };
        let Some(texture) = &self.texture else {
            ui.centered_and_justified(|ui| ui.label("Waiting for first frame..."));
            return;
        };

        let (width, height) = session.dimensions();
        let scale = session.scale();
        let size = egui::vec2(width as f32 * scale, height as f32 * scale);
        let response = ui.add(egui::Image::new((texture.id(), size)));

        if let Some(overlay) = &self.overlay {
            let painter = ui.painter();
            let origin = response.rect.left_top();
            let font = egui::FontId::monospace(14.0);
            for (line, text) in [&overlay.time, &overlay.frame, &overlay.fps]
                .into_iter()
                .enumerate()
            {
                painter.text(
                    origin + egui::vec2(10.0, 10.0 + line as f32 * 20.0),
                    egui::Align2::LEFT_TOP,
                    text,
                    font.clone(),
                    egui::Color32::BLACK,
                );
            }
        }
    }

    fn progress_slider(&mut self, ui: &mut egui::Ui) {
        let Some(session) = &self.session else {
            return;
        };

        let mut value = if self.dragging {
            self.drag_value
        } else {
            self.sink.position()
        };

        let response = ui.add(
            egui::Slider::new(&mut value, 0..=INDICATOR_MAX)
                .show_value(false)
                .trailing_fill(true),
        );

        if response.drag_started() {
            self.dragging = true;
            session.begin_seek();
        }
        if self.dragging {
            self.drag_value = value;
        }
        if response.drag_stopped() {
            self.dragging = false;
            match session.commit_seek(value) {
                Ok(()) => {
                    self.sink.set_position(value);
                    self.status = None;
                }
                Err(e) => self.status = Some(format!("Seek failed: {}", e)),
            }
        }

        // Hover preview of the prospective seek target, rate limited.
        if let Some(pointer) = response.hover_pos() {
            let fraction = (pointer.x - response.rect.left()) / response.rect.width();
            if let Some(text) = self.tooltip_probe.probe(fraction, session.duration_us()) {
                self.sink.set_tooltip(text);
            }
            if let Some(text) = self.sink.tooltip() {
                response.on_hover_text(text);
            }
        }
    }

    fn control_buttons(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        let mut exit_requested = false;

        if let Some(session) = &mut self.session {
            let pause_label = if session.is_paused() { "Resume" } else { "Pause" };
            if ui.button(pause_label).clicked() {
                session.toggle_pause();
            }
            if ui.button("Restart").clicked() {
                session.restart();
            }
            if ui.button("+ Size").clicked() {
                session.resize(1.1);
                request_window_size(ctx, session);
            }
            if ui.button("- Size").clicked() {
                session.resize(0.9);
                request_window_size(ctx, session);
            }
            exit_requested = ui.button("Exit").clicked();
        }

        if exit_requested {
            if let Some(mut session) = self.session.take() {
                session.stop();
            }
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
        }
    }
}

fn request_window_size(ctx: &egui::Context, session: &PlaybackSession) {
    let (width, height) = session.dimensions();
    let scale = session.scale();
    ctx.send_viewport_cmd(egui::ViewportCommand::InnerSize(egui::vec2(
        width as f32 * scale,
        height as f32 * scale + CONTROLS_HEIGHT,
    )));
}

impl eframe::App for PlayerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain_events();
        self.drain_frames(ctx);

        egui::TopBottomPanel::bottom("controls")
            .exact_height(CONTROLS_HEIGHT)
            .show(ctx, |ui| {
                self.progress_slider(ui);
                ui.horizontal(|ui| {
                    self.control_buttons(ui, ctx);
                    if let Some(status) = &self.status {
                        ui.colored_label(egui::Color32::YELLOW, status);
                    }
                });
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            if let Some(fatal) = &self.fatal {
                ui.centered_and_justified(|ui| {
                    ui.colored_label(egui::Color32::RED, format!("Playback stopped: {}", fatal));
                });
            } else {
                self.video_panel(ui);
            }
        });
    }
}
