// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Drawing canvas for image display and annotation.
//!
//! This module draws the current image through the session's view
//! transform, overlays boxes, keypoints and skeleton lines, and turns raw
//! pointer input into canvas actions in canvas-local screen coordinates.

use crate::models::annotation::{AnnotationSet, BoundingBox, Point};
use crate::session::EditorSession;

const HELP_TEXT: &str = "Controls:\n\
    Mouse Wheel: Zoom\n\
    Middle Drag: Pan\n\
    Left Drag: Create Box\n\
    Left Click: Select Box\n\
    Right Click: Add Keypoint\n\
    Del: Delete Object\n\
    Backspace: Delete Last Keypoint\n\
    Left/Right: Previous/Next Image\n\
    Ctrl+S: Save";

const BOX_COLOR: egui::Color32 = egui::Color32::RED;
const SELECTED_COLOR: egui::Color32 = egui::Color32::from_rgb(0, 255, 255);
const KEYPOINT_COLOR: egui::Color32 = egui::Color32::from_rgb(0, 255, 0);
const SELECTED_KEYPOINT_COLOR: egui::Color32 = egui::Color32::YELLOW;

/// Result of canvas interaction. Points are relative to the canvas origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CanvasAction {
    PrimaryPressed(Point),
    PrimaryReleased(Point),
    SecondaryClicked(Point),
    Scrolled(Point, f64),
    PanStarted(Point),
    PanMoved(Point),
    PanEnded,
}

/// Display the canvas and collect this frame's pointer actions.
pub fn show(
    ui: &mut egui::Ui,
    session: &EditorSession,
    image_texture: &Option<egui::TextureHandle>,
    keypoint_radius: f32,
) -> Vec<CanvasAction> {
    let (rect, response) =
        ui.allocate_exact_size(ui.available_size(), egui::Sense::click_and_drag());
    let painter = ui.painter_at(rect);
    painter.rect_filled(rect, 0.0, egui::Color32::from_gray(40));

    let view = session.view();
    let to_local =
        |pos: egui::Pos2| Point::new((pos.x - rect.min.x) as f64, (pos.y - rect.min.y) as f64);
    let to_pos = |p: Point| {
        let s = view.image_to_screen(p);
        egui::pos2(rect.min.x + s.x as f32, rect.min.y + s.y as f32)
    };

    match (image_texture, session.current_image()) {
        (Some(texture), Some(current)) => {
            let image_rect = egui::Rect::from_min_max(
                to_pos(Point::new(0.0, 0.0)),
                to_pos(Point::new(current.width as f64, current.height as f64)),
            );
            painter.image(
                texture.id(),
                image_rect,
                egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                egui::Color32::WHITE,
            );

            draw_annotations(&painter, session.annotations(), &to_pos, keypoint_radius);

            let pointer = ui.input(|i| i.pointer.latest_pos());
            if let Some(preview) = pointer.and_then(|pos| session.drag_preview(to_local(pos))) {
                painter.rect_stroke(
                    box_rect(&preview, &to_pos),
                    0.0,
                    egui::Stroke::new(2.0, egui::Color32::GREEN),
                );
            }

            painter.text(
                rect.min + egui::vec2(10.0, 10.0),
                egui::Align2::LEFT_TOP,
                HELP_TEXT,
                egui::FontId::proportional(12.0),
                egui::Color32::YELLOW,
            );
        }
        _ => {
            // Welcome message when nothing is loaded
            painter.text(
                rect.center(),
                egui::Align2::CENTER_CENTER,
                "Open a directory of images to begin labeling\nFile → Open Directory...",
                egui::FontId::proportional(16.0),
                egui::Color32::from_gray(180),
            );
            return Vec::new();
        }
    }

    collect_actions(ui, &response, to_local)
}

fn collect_actions(
    ui: &egui::Ui,
    response: &egui::Response,
    to_local: impl Fn(egui::Pos2) -> Point,
) -> Vec<CanvasAction> {
    use egui::PointerButton;

    let mut actions = Vec::new();
    let (pos, primary_down, primary_up, middle_down, middle_up, middle_held, scroll) =
        ui.input(|i| {
            (
                i.pointer.latest_pos(),
                i.pointer.button_pressed(PointerButton::Primary),
                i.pointer.button_released(PointerButton::Primary),
                i.pointer.button_pressed(PointerButton::Middle),
                i.pointer.button_released(PointerButton::Middle),
                i.pointer.button_down(PointerButton::Middle),
                i.raw_scroll_delta.y,
            )
        });

    let Some(pos) = pos else {
        return actions;
    };
    // Hover respects layers, so clicks on menus floating over the canvas are ignored
    let inside = response.hovered();
    let local = to_local(pos);

    if primary_down && inside {
        actions.push(CanvasAction::PrimaryPressed(local));
    }
    if primary_up {
        actions.push(CanvasAction::PrimaryReleased(local));
    }
    if response.secondary_clicked() {
        actions.push(CanvasAction::SecondaryClicked(local));
    }
    if middle_down && inside {
        actions.push(CanvasAction::PanStarted(local));
    } else if middle_held {
        actions.push(CanvasAction::PanMoved(local));
    }
    if middle_up {
        actions.push(CanvasAction::PanEnded);
    }
    if inside && scroll != 0.0 {
        actions.push(CanvasAction::Scrolled(local, scroll as f64));
    }

    actions
}

fn box_rect(bbox: &BoundingBox, to_pos: &impl Fn(Point) -> egui::Pos2) -> egui::Rect {
    egui::Rect::from_two_pos(
        to_pos(Point::new(bbox.x1, bbox.y1)),
        to_pos(Point::new(bbox.x2, bbox.y2)),
    )
}

/// Draw boxes with captions, then numbered keypoints joined in order.
fn draw_annotations(
    painter: &egui::Painter,
    annotations: &AnnotationSet,
    to_pos: &impl Fn(Point) -> egui::Pos2,
    keypoint_radius: f32,
) {
    for (idx, obj) in annotations.iter().enumerate() {
        let selected = annotations.selected() == Some(idx);
        let (color, width) = if selected {
            (SELECTED_COLOR, 3.0)
        } else {
            (BOX_COLOR, 2.0)
        };

        let rect = box_rect(&obj.bbox, to_pos);
        painter.rect_stroke(rect, 0.0, egui::Stroke::new(width, color));
        painter.text(
            rect.min - egui::vec2(0.0, 15.0),
            egui::Align2::LEFT_TOP,
            format!("ID:{} C:{}", idx, obj.class_id),
            egui::FontId::proportional(12.0),
            color,
        );

        let points: Vec<egui::Pos2> =
            obj.keypoints.iter().map(|kp| to_pos(kp.position())).collect();
        for pair in points.windows(2) {
            painter.line_segment([pair[0], pair[1]], egui::Stroke::new(1.0, color));
        }

        let kp_color = if selected {
            SELECTED_KEYPOINT_COLOR
        } else {
            KEYPOINT_COLOR
        };
        for (i, point) in points.iter().enumerate() {
            painter.circle_filled(*point, keypoint_radius, kp_color);
            painter.circle_stroke(
                *point,
                keypoint_radius,
                egui::Stroke::new(1.0, egui::Color32::BLACK),
            );
            painter.text(
                *point + egui::vec2(5.0, 5.0),
                egui::Align2::LEFT_TOP,
                (i + 1).to_string(),
                egui::FontId::proportional(10.0),
                egui::Color32::WHITE,
            );
        }
    }
}
