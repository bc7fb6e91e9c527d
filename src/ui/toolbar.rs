// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Toolbar with navigation, editing and labeling controls.
//!
//! This module provides the row of buttons for directory navigation and
//! object editing, the class id entry used for new boxes, and the
//! visibility selector applied to new keypoints.

use crate::models::annotation::Visibility;

/// Result of toolbar interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolbarAction {
    None,
    OpenDirectory,
    Previous,
    Next,
    Save,
    DeleteObject,
    DeleteLastKeypoint,
    ClassIdEdited,
}

/// Display the toolbar.
///
/// `info` is shown right-aligned, typically the image position and name.
pub fn show(
    ui: &mut egui::Ui,
    class_id_text: &mut String,
    visibility: &mut Visibility,
    info: &str,
) -> ToolbarAction {
    let mut action = ToolbarAction::None;

    ui.horizontal(|ui| {
        ui.spacing_mut().item_spacing.x = 8.0;

        if ui.button("Open Dir").clicked() {
            action = ToolbarAction::OpenDirectory;
        }
        if ui.button("<< Prev (Left)").clicked() {
            action = ToolbarAction::Previous;
        }
        if ui.button("Next >> (Right)").clicked() {
            action = ToolbarAction::Next;
        }
        if ui.button("Save (Ctrl+S)").clicked() {
            action = ToolbarAction::Save;
        }

        ui.separator();

        if ui.button("Del Object (Del)").clicked() {
            action = ToolbarAction::DeleteObject;
        }
        if ui.button("Del Last KP (Bksp)").clicked() {
            action = ToolbarAction::DeleteLastKeypoint;
        }

        ui.separator();

        ui.label("Class ID:");
        let response = ui.add(egui::TextEdit::singleline(class_id_text).desired_width(40.0));
        if response.changed() {
            action = ToolbarAction::ClassIdEdited;
        }

        egui::ComboBox::from_label("Keypoint")
            .selected_text(visibility.name())
            .show_ui(ui, |ui| {
                for &v in Visibility::all() {
                    ui.selectable_value(visibility, v, format!("{} ({})", v.name(), v.code()));
                }
            });

        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            ui.label(egui::RichText::new(info).weak());
        });
    });

    action
}
