// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Keypoint Labeler
//!
//! A cross-platform desktop application for labeling images with bounding
//! boxes and ordered keypoints, saved as normalized per-image text files for
//! keypoint-detection training.

mod app;
mod config;
mod io;
mod models;
mod session;
mod ui;
mod util;

#[cfg(test)]
mod test_util;

use anyhow::{Context, Result};
use app::LabelerApp;
use config::EditorConfig;

fn main() -> Result<()> {
    let config = match EditorConfig::locate() {
        Some(path) => EditorConfig::load(&path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => EditorConfig::default(),
    };

    // Initialize logging; RUST_LOG overrides the configured level
    env_logger::Builder::new()
        .filter_level(config.log_level.to_level_filter())
        .parse_default_env()
        .init();

    // Configure egui options
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 900.0])
            .with_min_inner_size([800.0, 600.0])
            .with_title("Keypoint Labeler"),
        ..Default::default()
    };

    // Run the application
    eframe::run_native(
        "Keypoint Labeler",
        options,
        Box::new(move |cc| Ok(Box::new(LabelerApp::new(&cc.egui_ctx, &config)))),
    )
    .map_err(|e| anyhow::anyhow!("Application error: {}", e))?;

    Ok(())
}
