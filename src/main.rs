mod core;
mod gui;
mod media;
mod playback;

use std::path::PathBuf;

use anyhow::Context;
use eframe::egui;
use gui::PlayerApp;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .context("usage: playhead <video-file>")?;

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([960.0, 600.0])
            .with_title("Playhead"),
        ..Default::default()
    };

    eframe::run_native(
        "Playhead",
        options,
        Box::new(move |cc| {
            match PlayerApp::new(cc, path) {
                Ok(app) => Ok(Box::new(app)),
                Err(e) => {
                    eprintln!("Failed to start playback: {}", e);
                    std::process::exit(1);
                }
            }
        }),
    ).map_err(|e| anyhow::anyhow!("Failed to run app: {}", e))?;

    Ok(())
}
