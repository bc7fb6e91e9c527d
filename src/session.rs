// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Editing session state.
//!
//! The session owns the image list, the annotations and view of the current
//! image, and the pointer interaction state. The UI feeds it pointer and key
//! events in screen coordinates; all edits go through the annotation set
//! operations so the session can be driven without a window.

use std::path::{Path, PathBuf};

use crate::config::EditorConfig;
use crate::io::error::SessionError;
use crate::io::labels;
use crate::io::media::{self, LoadedImage};
use crate::models::annotation::{
    AnnotatedObject, AnnotationSet, BoundingBox, Keypoint, Point, Visibility,
};
use crate::util::geometry::ViewState;

/// Box drag in progress, anchored in image space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragState {
    pub start: Point,
}

/// Pan in progress: screen anchor and the view when it started.
#[derive(Debug, Clone, Copy, PartialEq)]
struct PanState {
    start: Point,
    start_view: ViewState,
}

/// Path and size of the image being edited.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentImage {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
}

/// Direction used to continue past images that fail to decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Forward,
    Backward,
}

pub struct EditorSession {
    images: Vec<PathBuf>,
    index: usize,
    current: Option<CurrentImage>,
    annotations: AnnotationSet,
    /// Set when the current label file exists but could not be read
    labels_unreadable: bool,
    view: ViewState,
    /// Class assigned to newly drawn boxes
    pub current_class_id: u32,
    /// Visibility assigned to newly added keypoints
    pub keypoint_visibility: Visibility,
    pending_drag: Option<DragState>,
    pending_pan: Option<PanState>,
    image_extensions: Vec<String>,
    min_box_size: f64,
    zoom_in_factor: f64,
    zoom_out_factor: f64,
}

impl EditorSession {
    pub fn new(config: &EditorConfig) -> Self {
        Self {
            images: Vec::new(),
            index: 0,
            current: None,
            annotations: AnnotationSet::new(),
            labels_unreadable: false,
            view: ViewState::default(),
            current_class_id: config.default_class_id,
            keypoint_visibility: config.default_visibility,
            pending_drag: None,
            pending_pan: None,
            image_extensions: config.image_extensions.clone(),
            min_box_size: config.min_box_size,
            zoom_in_factor: config.zoom_in_factor,
            zoom_out_factor: config.zoom_out_factor,
        }
    }

    pub fn annotations(&self) -> &AnnotationSet {
        &self.annotations
    }

    pub fn view(&self) -> ViewState {
        self.view
    }

    pub fn current_image(&self) -> Option<&CurrentImage> {
        self.current.as_ref()
    }

    pub fn has_image(&self) -> bool {
        self.current.is_some()
    }

    #[cfg(test)]
    pub fn images(&self) -> &[PathBuf] {
        &self.images
    }

    /// 1-based position of the current image and the list length.
    pub fn position(&self) -> Option<(usize, usize)> {
        self.current
            .as_ref()
            .map(|_| (self.index + 1, self.images.len()))
    }

    /// Save the current image's labels, then list `dir` and load its first
    /// readable image.
    pub fn open_directory(&mut self, dir: &Path) -> Result<LoadedImage, SessionError> {
        let images = media::discover_images(dir, &self.image_extensions)?;
        if images.is_empty() {
            return Err(SessionError::NoImages(dir.to_path_buf()));
        }

        self.autosave()?;
        self.images = images;
        self.index = 0;
        self.current = None;
        self.annotations = AnnotationSet::new();
        self.load_nearest(Direction::Forward)
    }

    /// Make `path` the current image: decode it, read its labels and reset
    /// the view.
    ///
    /// An unreadable label file is logged and the image opens with an empty
    /// set; that file is then never written by [`Self::save`].
    pub fn load_image(&mut self, path: &Path) -> Result<LoadedImage, SessionError> {
        let loaded = media::load_image(path)?;

        let label_path = labels::label_path_for(path);
        let (annotations, labels_unreadable) =
            match labels::read_labels(&label_path, loaded.width, loaded.height) {
                Ok(set) => (set, false),
                Err(e) => {
                    log::error!("Failed to read labels {}: {}", label_path.display(), e);
                    (AnnotationSet::new(), true)
                }
            };

        log::info!(
            "Loaded {} ({}x{}) with {} objects",
            path.display(),
            loaded.width,
            loaded.height,
            annotations.len()
        );

        self.current = Some(CurrentImage {
            path: path.to_path_buf(),
            width: loaded.width,
            height: loaded.height,
        });
        self.annotations = annotations;
        self.labels_unreadable = labels_unreadable;
        self.view = ViewState::default();
        self.pending_drag = None;
        self.pending_pan = None;
        Ok(loaded)
    }

    /// Load the image at `index`, dropping undecodable images from the list
    /// and moving on in `direction`.
    fn load_nearest(&mut self, direction: Direction) -> Result<LoadedImage, SessionError> {
        loop {
            let Some(path) = self.images.get(self.index).cloned() else {
                return Err(SessionError::NoReadableImages);
            };

            match self.load_image(&path) {
                Ok(loaded) => return Ok(loaded),
                Err(SessionError::Media(e)) => {
                    log::warn!("Skipping image: {}", e);
                    self.images.remove(self.index);
                    if self.images.is_empty() {
                        self.current = None;
                        self.annotations = AnnotationSet::new();
                        self.labels_unreadable = false;
                        return Err(SessionError::NoReadableImages);
                    }
                    if direction == Direction::Backward {
                        self.index = self.index.saturating_sub(1);
                    }
                    self.index = self.index.min(self.images.len() - 1);
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Write the current labels. Returns the label path, or `None` when no
    /// image is loaded.
    pub fn save(&self) -> Result<Option<PathBuf>, SessionError> {
        let Some(current) = &self.current else {
            return Ok(None);
        };

        let path = labels::label_path_for(&current.path);
        if self.labels_unreadable {
            return Err(SessionError::LabelsNotLoaded { path });
        }
        labels::write_labels(&path, &self.annotations, current.width, current.height).map_err(
            |source| SessionError::Save {
                path: path.clone(),
                source,
            },
        )?;

        log::info!("Saved {} objects to {}", self.annotations.len(), path.display());
        Ok(Some(path))
    }

    /// Save before leaving the current image. A label file that could not be
    /// read is left untouched and does not block leaving.
    pub fn autosave(&self) -> Result<Option<PathBuf>, SessionError> {
        match self.save() {
            Err(SessionError::LabelsNotLoaded { path }) => {
                log::warn!("Leaving {} untouched, its labels were not loaded", path.display());
                Ok(None)
            }
            result => result,
        }
    }

    /// Save, then advance to the next image. Does nothing at the end of the
    /// list. If the save fails the current image stays loaded.
    pub fn next(&mut self) -> Result<Option<LoadedImage>, SessionError> {
        if self.current.is_none() || self.index + 1 >= self.images.len() {
            return Ok(None);
        }
        self.autosave()?;
        self.index += 1;
        self.load_nearest(Direction::Forward).map(Some)
    }

    /// Save, then go back to the previous image. Does nothing at the start
    /// of the list. If the save fails the current image stays loaded.
    pub fn previous(&mut self) -> Result<Option<LoadedImage>, SessionError> {
        if self.current.is_none() || self.index == 0 {
            return Ok(None);
        }
        self.autosave()?;
        self.index -= 1;
        self.load_nearest(Direction::Backward).map(Some)
    }

    /// Primary button down: select the box under the cursor, or start
    /// drawing a new one.
    pub fn primary_pressed(&mut self, screen: Point) {
        if !self.has_image() {
            return;
        }
        let point = self.view.screen_to_image(screen);
        match self.annotations.hit_test(point) {
            Some(index) => {
                self.annotations.select(Some(index));
                self.pending_drag = None;
                log::debug!("Selected object {}", index);
            }
            None => {
                self.annotations.select(None);
                self.pending_drag = Some(DragState { start: point });
            }
        }
    }

    /// Box being drawn, in image space, with the cursor at `screen`.
    pub fn drag_preview(&self, screen: Point) -> Option<BoundingBox> {
        self.pending_drag
            .map(|drag| BoundingBox::from_corners(drag.start, self.view.screen_to_image(screen)))
    }

    /// Primary button up: finish a box drag. Returns the new object's index
    /// when the box was large enough to keep.
    pub fn primary_released(&mut self, screen: Point) -> Option<usize> {
        let drag = self.pending_drag.take()?;
        let bbox = BoundingBox::from_corners(drag.start, self.view.screen_to_image(screen));
        self.annotations
            .create_object(bbox, self.current_class_id, self.min_box_size)
    }

    /// Secondary click: add a keypoint to the selected object.
    pub fn secondary_clicked(&mut self, screen: Point) -> bool {
        let point = self.view.screen_to_image(screen);
        let added = self
            .annotations
            .append_keypoint(point, self.keypoint_visibility);
        if added {
            log::debug!("Added keypoint at ({:.1}, {:.1})", point.x, point.y);
        }
        added
    }

    /// Scroll: zoom about the cursor. Positive deltas zoom in.
    pub fn scrolled(&mut self, screen: Point, delta: f64) {
        if delta == 0.0 {
            return;
        }
        let factor = if delta > 0.0 {
            self.zoom_in_factor
        } else {
            self.zoom_out_factor
        };
        self.view = self.view.zoom_at(screen, factor);
    }

    pub fn reset_view(&mut self) {
        self.view = ViewState::default();
    }

    pub fn pan_started(&mut self, screen: Point) {
        self.pending_pan = Some(PanState {
            start: screen,
            start_view: self.view,
        });
    }

    pub fn pan_moved(&mut self, screen: Point) {
        if let Some(pan) = self.pending_pan {
            let delta = Point::new(screen.x - pan.start.x, screen.y - pan.start.y);
            self.view = pan.start_view.pan(delta);
        }
    }

    pub fn pan_ended(&mut self) {
        self.pending_pan = None;
    }

    pub fn select(&mut self, index: Option<usize>) {
        self.annotations.select(index);
    }

    pub fn delete_selected(&mut self) -> Option<AnnotatedObject> {
        let removed = self.annotations.delete_selected();
        if removed.is_some() {
            log::info!("Deleted object, {} remaining", self.annotations.len());
        }
        removed
    }

    pub fn remove_object(&mut self, index: usize) -> Option<AnnotatedObject> {
        self.annotations.remove(index)
    }

    pub fn delete_last_keypoint(&mut self) -> Option<Keypoint> {
        self.annotations.delete_last_keypoint()
    }

    /// Update the class id from toolbar text. Text that is not a
    /// non-negative integer is ignored.
    pub fn set_class_id_text(&mut self, text: &str) -> bool {
        match text.trim().parse::<u32>() {
            Ok(id) => {
                self.current_class_id = id;
                true
            }
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::scratch_dir;
    use approx::assert_abs_diff_eq;

    fn write_png(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
        let path = dir.join(name);
        image::RgbaImage::new(width, height).save(&path).unwrap();
        path
    }

    fn draw_box(session: &mut EditorSession, from: (f64, f64), to: (f64, f64)) -> Option<usize> {
        session.primary_pressed(Point::new(from.0, from.1));
        session.primary_released(Point::new(to.0, to.1))
    }

    #[test]
    fn test_open_directory_loads_first_image_and_labels() {
        let dir = scratch_dir("session", "open");
        write_png(&dir, "a.png", 200, 100);
        write_png(&dir, "b.png", 200, 100);
        std::fs::write(
            dir.join("a.txt"),
            "0 0.450000 0.800000 0.500000 1.000000 0.450000 0.600000 2",
        )
        .unwrap();

        let mut session = EditorSession::new(&EditorConfig::default());
        let loaded = session.open_directory(&dir).unwrap();
        assert_eq!((loaded.width, loaded.height), (200, 100));
        assert_eq!(session.position(), Some((1, 2)));

        let obj = session.annotations().get(0).unwrap();
        assert_abs_diff_eq!(obj.bbox.x1, 40.0, epsilon = 1e-6);
        assert_eq!(obj.keypoints.len(), 1);
    }

    #[test]
    fn test_open_directory_without_images() {
        let dir = scratch_dir("session", "empty");
        std::fs::write(dir.join("notes.txt"), "hello").unwrap();
        let mut session = EditorSession::new(&EditorConfig::default());
        assert!(matches!(
            session.open_directory(&dir),
            Err(SessionError::NoImages(_))
        ));
    }

    #[test]
    fn test_next_saves_before_loading() {
        let dir = scratch_dir("session", "next");
        write_png(&dir, "a.png", 200, 100);
        write_png(&dir, "b.png", 200, 100);

        let mut session = EditorSession::new(&EditorConfig::default());
        session.open_directory(&dir).unwrap();
        assert!(draw_box(&mut session, (40.0, 30.0), (140.0, 130.0)).is_some());
        assert!(session.secondary_clicked(Point::new(90.0, 60.0)));

        let loaded = session.next().unwrap().unwrap();
        assert_eq!(loaded.path, dir.join("b.png"));
        assert!(session.annotations().is_empty());
        assert_eq!(
            std::fs::read_to_string(dir.join("a.txt")).unwrap(),
            "0 0.450000 0.800000 0.500000 1.000000 0.450000 0.600000 2"
        );

        // End of list: nothing happens
        assert!(session.next().unwrap().is_none());
        assert_eq!(session.position(), Some((2, 2)));

        // Going back restores the saved annotations
        session.previous().unwrap().unwrap();
        assert_eq!(session.annotations().len(), 1);
        assert_eq!(session.annotations().selected(), None);
        assert!(dir.join("b.txt").exists());
    }

    #[test]
    fn test_next_skips_corrupt_images() {
        let dir = scratch_dir("session", "corrupt");
        write_png(&dir, "a.png", 32, 32);
        std::fs::write(dir.join("b.png"), b"garbage").unwrap();
        write_png(&dir, "c.png", 48, 16);

        let mut session = EditorSession::new(&EditorConfig::default());
        session.open_directory(&dir).unwrap();
        let loaded = session.next().unwrap().unwrap();
        assert_eq!(loaded.path, dir.join("c.png"));
        assert_eq!(session.images().len(), 2);
        assert_eq!(session.position(), Some((2, 2)));
    }

    #[test]
    fn test_only_corrupt_images() {
        let dir = scratch_dir("session", "all-corrupt");
        std::fs::write(dir.join("a.png"), b"garbage").unwrap();
        let mut session = EditorSession::new(&EditorConfig::default());
        assert!(matches!(
            session.open_directory(&dir),
            Err(SessionError::NoReadableImages)
        ));
        assert!(!session.has_image());
    }

    #[test]
    fn test_failed_save_blocks_navigation() {
        let dir = scratch_dir("session", "save-fail");
        write_png(&dir, "a.png", 100, 100);
        write_png(&dir, "b.png", 100, 100);

        let mut session = EditorSession::new(&EditorConfig::default());
        session.open_directory(&dir).unwrap();
        draw_box(&mut session, (10.0, 10.0), (50.0, 50.0)).unwrap();

        // A directory where the label file should go makes the write fail
        std::fs::create_dir_all(dir.join("a.txt")).unwrap();

        assert!(matches!(session.save(), Err(SessionError::Save { .. })));
        assert!(matches!(session.next(), Err(SessionError::Save { .. })));
        assert_eq!(session.position(), Some((1, 2)));
        assert_eq!(session.annotations().len(), 1);

        std::fs::remove_dir_all(dir.join("a.txt")).unwrap();
        assert_eq!(session.save().unwrap(), Some(dir.join("a.txt")));
    }

    #[test]
    fn test_box_threshold_is_in_image_pixels() {
        let dir = scratch_dir("session", "threshold");
        write_png(&dir, "a.png", 400, 400);

        let mut session = EditorSession::new(&EditorConfig::default());
        session.open_directory(&dir).unwrap();

        // Past 4x zoom, a 4-pixel image box spans more than 16 screen pixels
        for _ in 0..15 {
            session.scrolled(Point::new(0.0, 0.0), 1.0);
        }
        let scale = session.view().scale;
        assert!(scale > 4.0);

        let before = session.annotations().clone();
        let small = 10.0 + 4.0 * scale;
        assert!(draw_box(&mut session, (10.0, 10.0), (small, small)).is_none());
        assert_eq!(session.annotations(), &before);

        let large = 10.0 + 6.0 * scale;
        assert!(draw_box(&mut session, (10.0, 10.0), (large, large)).is_some());
        let bbox = session.annotations().get(0).unwrap().bbox;
        assert_abs_diff_eq!(bbox.width(), 6.0, epsilon = 1e-9);
    }

    #[test]
    fn test_click_selects_instead_of_drawing() {
        let dir = scratch_dir("session", "select");
        write_png(&dir, "a.png", 200, 200);

        let mut session = EditorSession::new(&EditorConfig::default());
        session.open_directory(&dir).unwrap();
        draw_box(&mut session, (10.0, 10.0), (100.0, 100.0)).unwrap();
        draw_box(&mut session, (120.0, 120.0), (180.0, 180.0)).unwrap();
        assert_eq!(session.annotations().selected(), Some(1));

        session.primary_pressed(Point::new(50.0, 50.0));
        assert_eq!(session.annotations().selected(), Some(0));
        assert!(session.drag_preview(Point::new(60.0, 60.0)).is_none());
        assert!(session.primary_released(Point::new(150.0, 150.0)).is_none());
        assert_eq!(session.annotations().len(), 2);

        // Clicking empty space clears the selection
        session.primary_pressed(Point::new(110.0, 5.0));
        assert_eq!(session.annotations().selected(), None);
        assert!(!session.secondary_clicked(Point::new(50.0, 50.0)));
    }

    #[test]
    fn test_keypoints_use_image_space_and_visibility() {
        let dir = scratch_dir("session", "keypoints");
        write_png(&dir, "a.png", 200, 200);

        let mut session = EditorSession::new(&EditorConfig::default());
        session.open_directory(&dir).unwrap();
        draw_box(&mut session, (0.0, 0.0), (100.0, 100.0)).unwrap();

        session.pan_started(Point::new(0.0, 0.0));
        session.pan_moved(Point::new(20.0, 10.0));
        session.pan_moved(Point::new(30.0, 40.0));
        session.pan_ended();
        assert_eq!(session.view().offset_x, 30.0);
        assert_eq!(session.view().offset_y, 40.0);

        session.keypoint_visibility = Visibility::Occluded;
        assert!(session.secondary_clicked(Point::new(80.0, 90.0)));
        let kp = session.annotations().get(0).unwrap().keypoints[0];
        assert_eq!(kp, Keypoint::new(50.0, 50.0, Visibility::Occluded));

        assert!(session.delete_last_keypoint().is_some());
        assert!(session.delete_last_keypoint().is_none());
    }

    #[test]
    fn test_class_id_text() {
        let mut session = EditorSession::new(&EditorConfig::default());
        assert!(session.set_class_id_text(" 4 "));
        assert_eq!(session.current_class_id, 4);
        assert!(!session.set_class_id_text("abc"));
        assert!(!session.set_class_id_text("-1"));
        assert_eq!(session.current_class_id, 4);
    }

    #[test]
    fn test_load_resets_view_and_selection() {
        let dir = scratch_dir("session", "reset");
        let a = write_png(&dir, "a.png", 64, 64);

        let mut session = EditorSession::new(&EditorConfig::default());
        session.open_directory(&dir).unwrap();
        draw_box(&mut session, (0.0, 0.0), (30.0, 30.0)).unwrap();
        session.scrolled(Point::new(5.0, 5.0), -1.0);
        session.save().unwrap();

        session.load_image(&a).unwrap();
        assert_eq!(session.view(), ViewState::default());
        assert_eq!(session.annotations().len(), 1);
        assert_eq!(session.annotations().selected(), None);
        assert!(session.delete_selected().is_none());
    }

    #[test]
    fn test_bad_bytes_in_label_file_keep_valid_lines() {
        let dir = scratch_dir("session", "non-utf8");
        write_png(&dir, "a.png", 200, 100);
        write_png(&dir, "b.png", 200, 100);
        let valid = "0 0.450000 0.800000 0.500000 1.000000 0.450000 0.600000 2";
        let mut bytes = valid.as_bytes().to_vec();
        bytes.extend_from_slice(b"\n1 0.5 0.5 0.2 0.2 \xff");
        std::fs::write(dir.join("a.txt"), bytes).unwrap();

        let mut session = EditorSession::new(&EditorConfig::default());
        session.open_directory(&dir).unwrap();
        assert_eq!(session.annotations().len(), 1);

        session.next().unwrap().unwrap();
        assert_eq!(std::fs::read_to_string(dir.join("a.txt")).unwrap(), valid);
    }

    #[test]
    fn test_unreadable_label_file_is_never_overwritten() {
        let dir = scratch_dir("session", "unreadable");
        write_png(&dir, "a.png", 200, 100);
        write_png(&dir, "b.png", 200, 100);
        // Reading a directory fails with an error other than not-found
        std::fs::create_dir_all(dir.join("a.txt")).unwrap();

        let mut session = EditorSession::new(&EditorConfig::default());
        session.open_directory(&dir).unwrap();
        assert!(session.annotations().is_empty());
        draw_box(&mut session, (10.0, 10.0), (50.0, 50.0)).unwrap();

        assert!(matches!(
            session.save(),
            Err(SessionError::LabelsNotLoaded { .. })
        ));
        assert_eq!(session.autosave().unwrap(), None);

        let loaded = session.next().unwrap().unwrap();
        assert_eq!(loaded.path, dir.join("b.png"));
        assert!(dir.join("a.txt").is_dir());

        // Labels of the next image load normally and save again
        assert_eq!(session.save().unwrap(), Some(dir.join("b.txt")));
    }
}
