// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Main application state and egui App implementation.
//!
//! This module contains the main application structure that implements
//! the egui::App trait. It owns the editing session, routes menu, toolbar,
//! keyboard and canvas input to it, and keeps the displayed texture in sync
//! with the current image.

use std::path::Path;
use std::time::{Duration, Instant};

use crate::config::EditorConfig;
use crate::io::error::SessionError;
use crate::io::media::LoadedImage;
use crate::models::annotation::Point;
use crate::session::EditorSession;
use crate::ui::{canvas, properties, toolbar};

/// How long a success message stays in the status bar.
const STATUS_TIMEOUT: Duration = Duration::from_secs(1);

/// Message shown in the status bar.
struct StatusMessage {
    text: String,
    is_error: bool,
    shown_at: Instant,
}

/// Main application state.
pub struct LabelerApp {
    /// Image list, annotations and view of the current image
    session: EditorSession,

    /// Loaded image texture for display
    image_texture: Option<egui::TextureHandle>,

    /// Contents of the class id entry
    class_id_text: String,

    /// Keypoint marker radius in screen pixels
    keypoint_radius: f32,

    /// Center of the canvas in canvas-local coordinates, for menu zoom
    canvas_center: Point,

    /// Last save result or error
    status: Option<StatusMessage>,
}

impl LabelerApp {
    /// Create a new application instance, opening the configured directory
    /// if there is one.
    pub fn new(ctx: &egui::Context, config: &EditorConfig) -> Self {
        let mut app = Self {
            session: EditorSession::new(config),
            image_texture: None,
            class_id_text: config.default_class_id.to_string(),
            keypoint_radius: config.keypoint_radius,
            canvas_center: Point::default(),
            status: None,
        };

        if let Some(dir) = &config.image_dir {
            app.open_directory(ctx, dir);
        }

        app
    }

    fn set_status(&mut self, text: impl Into<String>, is_error: bool) {
        self.status = Some(StatusMessage {
            text: text.into(),
            is_error,
            shown_at: Instant::now(),
        });
    }

    fn report_error(&mut self, error: SessionError) {
        log::error!("{}", error);
        self.set_status(error.to_string(), true);
    }

    /// Upload a newly loaded image as the canvas texture.
    fn show_image(&mut self, ctx: &egui::Context, loaded: LoadedImage) {
        let size = [loaded.width as usize, loaded.height as usize];
        let color_image = egui::ColorImage::from_rgba_unmultiplied(size, &loaded.pixels);
        self.image_texture = Some(ctx.load_texture(
            "current_image",
            color_image,
            egui::TextureOptions::LINEAR,
        ));
    }

    fn open_directory(&mut self, ctx: &egui::Context, dir: &Path) {
        match self.session.open_directory(dir) {
            Ok(loaded) => self.show_image(ctx, loaded),
            Err(e) => {
                if !self.session.has_image() {
                    self.image_texture = None;
                }
                self.report_error(e);
            }
        }
    }

    fn save(&mut self) {
        match self.session.save() {
            Ok(Some(path)) => {
                log::info!("Saved labels to {}", path.display());
                self.set_status("Saved!", false);
            }
            Ok(None) => {}
            Err(e) => self.report_error(e),
        }
    }

    fn navigate(&mut self, ctx: &egui::Context, forward: bool) {
        let result = if forward {
            self.session.next()
        } else {
            self.session.previous()
        };

        match result {
            Ok(Some(loaded)) => self.show_image(ctx, loaded),
            Ok(None) => {}
            Err(e) => {
                if !self.session.has_image() {
                    self.image_texture = None;
                }
                self.report_error(e);
            }
        }
    }

    fn delete_selected(&mut self) {
        self.session.delete_selected();
    }

    fn delete_last_keypoint(&mut self) {
        if let Some(kp) = self.session.delete_last_keypoint() {
            log::debug!("Removed keypoint at ({:.1}, {:.1})", kp.x, kp.y);
        }
    }

    fn pick_directory(&mut self, ctx: &egui::Context) {
        if let Some(dir) = rfd::FileDialog::new().pick_folder() {
            self.open_directory(ctx, &dir);
        }
    }

    /// Text for the right side of the toolbar.
    fn info_text(&self) -> String {
        match (self.session.position(), self.session.current_image()) {
            (Some((pos, count)), Some(current)) => {
                let name = current
                    .path
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_default();
                format!("[{}/{}] {}", pos, count, name)
            }
            _ => "Load a directory to start".to_string(),
        }
    }

    fn handle_keyboard(&mut self, ctx: &egui::Context) {
        if ctx.input(|i| i.modifiers.command && i.key_pressed(egui::Key::S)) {
            self.save();
        }

        // Only process if no text field is focused (to avoid editing the class id)
        if ctx.wants_keyboard_input() {
            return;
        }

        if ctx.input(|i| i.key_pressed(egui::Key::ArrowLeft)) {
            self.navigate(ctx, false);
        }
        if ctx.input(|i| i.key_pressed(egui::Key::ArrowRight)) {
            self.navigate(ctx, true);
        }
        if ctx.input(|i| i.key_pressed(egui::Key::Delete)) {
            self.delete_selected();
        }
        if ctx.input(|i| i.key_pressed(egui::Key::Backspace)) {
            self.delete_last_keypoint();
        }
    }

    fn handle_canvas_action(&mut self, action: canvas::CanvasAction) {
        use canvas::CanvasAction;

        match action {
            CanvasAction::PrimaryPressed(p) => self.session.primary_pressed(p),
            CanvasAction::PrimaryReleased(p) => {
                if let Some(idx) = self.session.primary_released(p) {
                    log::info!(
                        "Added object {}, total: {}",
                        idx,
                        self.session.annotations().len()
                    );
                }
            }
            CanvasAction::SecondaryClicked(p) => {
                self.session.secondary_clicked(p);
            }
            CanvasAction::Scrolled(p, delta) => self.session.scrolled(p, delta),
            CanvasAction::PanStarted(p) => self.session.pan_started(p),
            CanvasAction::PanMoved(p) => self.session.pan_moved(p),
            CanvasAction::PanEnded => self.session.pan_ended(),
        }
    }
}

impl eframe::App for LabelerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Autosave on close; keep the window open if that fails
        if ctx.input(|i| i.viewport().close_requested()) {
            if let Err(e) = self.session.autosave() {
                self.report_error(e);
                ctx.send_viewport_cmd(egui::ViewportCommand::CancelClose);
            }
        }

        // Top menu bar
        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("File", |ui| {
                    if ui.button("Open Directory...").clicked() {
                        ui.close_menu();
                        self.pick_directory(ctx);
                    }
                    if ui.button("Save (Ctrl+S)").clicked() {
                        ui.close_menu();
                        self.save();
                    }
                    ui.separator();
                    if ui.button("Quit").clicked() {
                        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                    }
                });

                ui.menu_button("Edit", |ui| {
                    let has_selection = self.session.annotations().selected().is_some();
                    if ui
                        .add_enabled(has_selection, egui::Button::new("Delete Selected (Del)"))
                        .clicked()
                    {
                        self.delete_selected();
                        ui.close_menu();
                    }
                    if ui
                        .add_enabled(
                            has_selection,
                            egui::Button::new("Delete Last Keypoint (Backspace)"),
                        )
                        .clicked()
                    {
                        self.delete_last_keypoint();
                        ui.close_menu();
                    }
                });

                ui.menu_button("View", |ui| {
                    if ui.button("Zoom In").clicked() {
                        self.session.scrolled(self.canvas_center, 1.0);
                        ui.close_menu();
                    }
                    if ui.button("Zoom Out").clicked() {
                        self.session.scrolled(self.canvas_center, -1.0);
                        ui.close_menu();
                    }
                    if ui.button("Reset Zoom").clicked() {
                        self.session.reset_view();
                        ui.close_menu();
                    }
                });
            });
        });

        // Toolbar
        let info = self.info_text();
        let toolbar_action = egui::TopBottomPanel::top("toolbar")
            .show(ctx, |ui| {
                toolbar::show(
                    ui,
                    &mut self.class_id_text,
                    &mut self.session.keypoint_visibility,
                    &info,
                )
            })
            .inner;

        match toolbar_action {
            toolbar::ToolbarAction::OpenDirectory => self.pick_directory(ctx),
            toolbar::ToolbarAction::Previous => self.navigate(ctx, false),
            toolbar::ToolbarAction::Next => self.navigate(ctx, true),
            toolbar::ToolbarAction::Save => self.save(),
            toolbar::ToolbarAction::DeleteObject => self.delete_selected(),
            toolbar::ToolbarAction::DeleteLastKeypoint => self.delete_last_keypoint(),
            toolbar::ToolbarAction::ClassIdEdited => {
                self.session.set_class_id_text(&self.class_id_text);
            }
            toolbar::ToolbarAction::None => {}
        }

        // Status bar (bottom)
        if self
            .status
            .as_ref()
            .is_some_and(|s| !s.is_error && s.shown_at.elapsed() > STATUS_TIMEOUT)
        {
            self.status = None;
        }
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                let view = self.session.view();
                ui.label(format!("Zoom: {:.0}%", view.scale * 100.0));
                ui.separator();
                ui.label(format!("Class: {}", self.session.current_class_id));
                ui.separator();
                ui.label(format!("Objects: {}", self.session.annotations().len()));
                if let Some(status) = &self.status {
                    ui.separator();
                    let color = if status.is_error {
                        egui::Color32::RED
                    } else {
                        egui::Color32::GREEN
                    };
                    ui.label(egui::RichText::new(&status.text).strong().color(color));
                }
            });
        });
        if self.status.as_ref().is_some_and(|s| !s.is_error) {
            ctx.request_repaint_after(STATUS_TIMEOUT);
        }

        // Properties panel (right side)
        let properties_action = egui::SidePanel::right("properties")
            .default_width(250.0)
            .show(ctx, |ui| properties::show(ui, self.session.annotations()))
            .inner;

        match properties_action {
            properties::PropertiesAction::SelectObject(idx) => self.session.select(Some(idx)),
            properties::PropertiesAction::DeleteObject(idx) => {
                if self.session.remove_object(idx).is_some() {
                    log::info!(
                        "Deleted object from panel, total: {}",
                        self.session.annotations().len()
                    );
                }
            }
            properties::PropertiesAction::None => {}
        }

        self.handle_keyboard(ctx);

        // Main canvas (center)
        let canvas_actions = egui::CentralPanel::default()
            .frame(egui::Frame::none())
            .show(ctx, |ui| {
                let size = ui.available_size();
                self.canvas_center = Point::new(size.x as f64 / 2.0, size.y as f64 / 2.0);
                canvas::show(ui, &self.session, &self.image_texture, self.keypoint_radius)
            })
            .inner;

        for action in canvas_actions {
            self.handle_canvas_action(action);
        }
    }
}
