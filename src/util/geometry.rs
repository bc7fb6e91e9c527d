// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Geometric utility functions.
//!
//! This module provides the view transform between image-pixel coordinates
//! and screen coordinates (`screen = image * scale + offset`), plus helpers
//! for converting pixel coordinates to normalized coordinates and back.

use crate::models::annotation::Point;

/// Smallest allowed zoom factor.
pub const MIN_SCALE: f64 = 0.1;
/// Largest allowed zoom factor.
pub const MAX_SCALE: f64 = 20.0;

/// Pan and zoom state of the canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewState {
    pub scale: f64,
    pub offset_x: f64,
    pub offset_y: f64,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            scale: 1.0,
            offset_x: 0.0,
            offset_y: 0.0,
        }
    }
}

impl ViewState {
    /// Map an image-pixel point to screen coordinates.
    pub fn image_to_screen(&self, p: Point) -> Point {
        Point {
            x: p.x * self.scale + self.offset_x,
            y: p.y * self.scale + self.offset_y,
        }
    }

    /// Map a screen point back to image-pixel coordinates.
    pub fn screen_to_image(&self, p: Point) -> Point {
        Point {
            x: (p.x - self.offset_x) / self.scale,
            y: (p.y - self.offset_y) / self.scale,
        }
    }

    /// Zoom by `factor` while keeping `anchor` (screen space) fixed on the
    /// same image point. The resulting scale is clamped to
    /// [`MIN_SCALE`, `MAX_SCALE`] before the offset is recomputed.
    pub fn zoom_at(self, anchor: Point, factor: f64) -> Self {
        let scale = (self.scale * factor).clamp(MIN_SCALE, MAX_SCALE);
        let ratio = scale / self.scale;
        Self {
            scale,
            offset_x: anchor.x - (anchor.x - self.offset_x) * ratio,
            offset_y: anchor.y - (anchor.y - self.offset_y) * ratio,
        }
    }

    /// Shift the view by a screen-space delta.
    pub fn pan(self, delta: Point) -> Self {
        Self {
            offset_x: self.offset_x + delta.x,
            offset_y: self.offset_y + delta.y,
            ..self
        }
    }
}

/// Convert pixel coordinates to normalized coordinates (0.0 to 1.0).
pub fn normalize_coordinates(pixel_x: f64, pixel_y: f64, width: u32, height: u32) -> Point {
    Point {
        x: pixel_x / width as f64,
        y: pixel_y / height as f64,
    }
}

/// Convert normalized coordinates to pixel coordinates.
pub fn denormalize_coordinates(point: &Point, width: u32, height: u32) -> (f64, f64) {
    (point.x * width as f64, point.y * height as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_normalize_denormalize_roundtrip() {
        let width = 1920;
        let height = 1080;
        let pixel_x = 960.0;
        let pixel_y = 540.0;

        let normalized = normalize_coordinates(pixel_x, pixel_y, width, height);
        let (denorm_x, denorm_y) = denormalize_coordinates(&normalized, width, height);

        assert!((denorm_x - pixel_x).abs() < 0.0001);
        assert!((denorm_y - pixel_y).abs() < 0.0001);
    }

    #[test]
    fn test_normalize_corners() {
        let width = 1920;
        let height = 1080;

        // Top-left corner
        let tl = normalize_coordinates(0.0, 0.0, width, height);
        assert_eq!(tl.x, 0.0);
        assert_eq!(tl.y, 0.0);

        // Bottom-right corner
        let br = normalize_coordinates(1920.0, 1080.0, width, height);
        assert_eq!(br.x, 1.0);
        assert_eq!(br.y, 1.0);
    }

    #[test]
    fn test_screen_image_inverse() {
        let view = ViewState {
            scale: 2.5,
            offset_x: -30.0,
            offset_y: 12.0,
        };
        let p = Point::new(123.4, 56.7);
        let back = view.screen_to_image(view.image_to_screen(p));
        assert_abs_diff_eq!(back.x, p.x, epsilon = 1e-9);
        assert_abs_diff_eq!(back.y, p.y, epsilon = 1e-9);
    }

    #[test]
    fn test_zoom_keeps_anchor_fixed() {
        let view = ViewState::default();
        let anchor = Point::new(100.0, 100.0);
        let image_point = view.screen_to_image(anchor);

        let zoomed = view.zoom_at(anchor, 2.0);
        assert_abs_diff_eq!(zoomed.scale, 2.0);

        let screen = zoomed.image_to_screen(image_point);
        assert_abs_diff_eq!(screen.x, 100.0, epsilon = 1e-9);
        assert_abs_diff_eq!(screen.y, 100.0, epsilon = 1e-9);
    }

    #[test]
    fn test_zoom_clamps_and_stays_anchored() {
        let view = ViewState {
            scale: 15.0,
            offset_x: 40.0,
            offset_y: -20.0,
        };
        let anchor = Point::new(300.0, 200.0);
        let image_point = view.screen_to_image(anchor);

        let zoomed = view.zoom_at(anchor, 10.0);
        assert_eq!(zoomed.scale, MAX_SCALE);
        let screen = zoomed.image_to_screen(image_point);
        assert_abs_diff_eq!(screen.x, anchor.x, epsilon = 1e-9);
        assert_abs_diff_eq!(screen.y, anchor.y, epsilon = 1e-9);

        let shrunk = ViewState::default().zoom_at(anchor, 0.001);
        assert_eq!(shrunk.scale, MIN_SCALE);
    }

    #[test]
    fn test_pan_moves_offset_only() {
        let view = ViewState::default().zoom_at(Point::new(0.0, 0.0), 3.0);
        let panned = view.pan(Point::new(15.0, -5.0));
        assert_eq!(panned.scale, view.scale);
        assert_eq!(panned.offset_x, view.offset_x + 15.0);
        assert_eq!(panned.offset_y, view.offset_y - 5.0);
    }
}
