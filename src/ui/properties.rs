// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Annotation properties panel.
//!
//! This module lists the objects of the current image and shows the
//! keypoints of the selected one.

use crate::models::annotation::AnnotationSet;

/// Result of properties panel interaction.
pub enum PropertiesAction {
    None,
    SelectObject(usize),
    DeleteObject(usize),
}

/// Display the object list and the selected object's keypoints.
pub fn show(ui: &mut egui::Ui, annotations: &AnnotationSet) -> PropertiesAction {
    let mut action = PropertiesAction::None;

    ui.heading("Objects");
    ui.separator();

    if annotations.is_empty() {
        ui.label(egui::RichText::new("No objects").weak());
    }

    egui::ScrollArea::vertical()
        .id_source("object_list")
        .max_height(ui.available_height() * 0.5)
        .show(ui, |ui| {
            for (idx, obj) in annotations.iter().enumerate() {
                ui.horizontal(|ui| {
                    let selected = annotations.selected() == Some(idx);
                    let text = format!(
                        "ID:{}  class {}  ({} kp)",
                        idx,
                        obj.class_id,
                        obj.keypoint_count()
                    );
                    if ui.selectable_label(selected, text).clicked() {
                        action = PropertiesAction::SelectObject(idx);
                    }
                    if ui.small_button("🗑").on_hover_text("Delete object").clicked() {
                        action = PropertiesAction::DeleteObject(idx);
                    }
                });
            }
        });

    if let Some(obj) = annotations.selected_object() {
        ui.separator();
        ui.heading("Keypoints");
        ui.label(format!(
            "Box: ({:.1}, {:.1}) - ({:.1}, {:.1})",
            obj.bbox.x1, obj.bbox.y1, obj.bbox.x2, obj.bbox.y2
        ));

        egui::ScrollArea::vertical()
            .id_source("keypoint_list")
            .show(ui, |ui| {
                egui::Grid::new("keypoint_grid")
                    .striped(true)
                    .num_columns(4)
                    .show(ui, |ui| {
                        ui.strong("#");
                        ui.strong("x");
                        ui.strong("y");
                        ui.strong("vis");
                        ui.end_row();

                        for (i, kp) in obj.keypoints.iter().enumerate() {
                            ui.label((i + 1).to_string());
                            ui.label(format!("{:.1}", kp.x));
                            ui.label(format!("{:.1}", kp.y));
                            ui.label(kp.visibility.name());
                            ui.end_row();
                        }
                    });
            });
    }

    action
}
