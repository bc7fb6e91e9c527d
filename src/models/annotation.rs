// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Annotation data structures.
//!
//! This module defines the per-image annotation model: bounding boxes,
//! their ordered keypoint lists, and the set of objects for the image
//! currently being edited together with its selection cursor.

use serde::{Deserialize, Serialize};

/// A 2D point in image-pixel or screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Visibility flag attached to every keypoint.
///
/// The integer codes are the ones written to label files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    /// Not labeled.
    Absent,
    /// Present but occluded.
    Occluded,
    /// Present and visible.
    #[default]
    Visible,
}

impl Visibility {
    pub fn code(self) -> u8 {
        match self {
            Visibility::Absent => 0,
            Visibility::Occluded => 1,
            Visibility::Visible => 2,
        }
    }

    /// Map a label-file code back to a visibility flag.
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Visibility::Absent),
            1 => Some(Visibility::Occluded),
            2 => Some(Visibility::Visible),
            _ => None,
        }
    }

    pub fn all() -> &'static [Visibility] {
        &[Visibility::Absent, Visibility::Occluded, Visibility::Visible]
    }

    pub fn name(self) -> &'static str {
        match self {
            Visibility::Absent => "Absent",
            Visibility::Occluded => "Occluded",
            Visibility::Visible => "Visible",
        }
    }
}

/// A single keypoint in image-pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keypoint {
    pub x: f64,
    pub y: f64,
    pub visibility: Visibility,
}

impl Keypoint {
    pub fn new(x: f64, y: f64, visibility: Visibility) -> Self {
        Self { x, y, visibility }
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// Axis-aligned box in image-pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl BoundingBox {
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Build a box from two opposite corners, in any order.
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self {
            x1: a.x.min(b.x),
            y1: a.y.min(b.y),
            x2: a.x.max(b.x),
            y2: a.y.max(b.y),
        }
    }

    /// Return the box with `x1 <= x2` and `y1 <= y2`.
    pub fn normalized(&self) -> Self {
        Self::from_corners(Point::new(self.x1, self.y1), Point::new(self.x2, self.y2))
    }

    pub fn width(&self) -> f64 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> f64 {
        self.y2 - self.y1
    }

    pub fn center(&self) -> Point {
        Point::new((self.x1 + self.x2) / 2.0, (self.y1 + self.y2) / 2.0)
    }

    /// Inclusive containment test.
    pub fn contains(&self, p: Point) -> bool {
        self.x1 <= p.x && p.x <= self.x2 && self.y1 <= p.y && p.y <= self.y2
    }
}

/// A labeled object: one box plus its ordered keypoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedObject {
    pub class_id: u32,
    pub bbox: BoundingBox,
    pub keypoints: Vec<Keypoint>,
}

impl AnnotatedObject {
    /// Create a new object with an empty keypoint list.
    pub fn new(class_id: u32, bbox: BoundingBox) -> Self {
        Self {
            class_id,
            bbox,
            keypoints: Vec::new(),
        }
    }

    pub fn keypoint_count(&self) -> usize {
        self.keypoints.len()
    }
}

/// All objects for one image plus the selection cursor.
///
/// `selected` is always either `None` or a valid index into `objects`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnnotationSet {
    objects: Vec<AnnotatedObject>,
    selected: Option<usize>,
}

impl AnnotationSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from decoded objects, with nothing selected.
    pub fn from_objects(objects: Vec<AnnotatedObject>) -> Self {
        Self {
            objects,
            selected: None,
        }
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AnnotatedObject> {
        self.objects.iter()
    }

    pub fn get(&self, index: usize) -> Option<&AnnotatedObject> {
        self.objects.get(index)
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn selected_object(&self) -> Option<&AnnotatedObject> {
        self.selected.and_then(|idx| self.get(idx))
    }

    fn selected_object_mut(&mut self) -> Option<&mut AnnotatedObject> {
        self.selected.and_then(|idx| self.objects.get_mut(idx))
    }

    /// Topmost (most recently added) object whose box contains `point`.
    pub fn hit_test(&self, point: Point) -> Option<usize> {
        self.objects.iter().rposition(|obj| obj.bbox.contains(point))
    }

    /// Append a new object and select it.
    ///
    /// Boxes whose width or height is not greater than `min_size` image
    /// pixels are rejected and leave the set unchanged.
    pub fn create_object(
        &mut self,
        bbox: BoundingBox,
        class_id: u32,
        min_size: f64,
    ) -> Option<usize> {
        let bbox = bbox.normalized();
        if bbox.width() <= min_size || bbox.height() <= min_size {
            log::debug!(
                "Rejected box {:.1}x{:.1} (minimum {:.1})",
                bbox.width(),
                bbox.height(),
                min_size
            );
            return None;
        }

        self.objects.push(AnnotatedObject::new(class_id, bbox));
        let index = self.objects.len() - 1;
        self.selected = Some(index);
        log::debug!("Created object {} with class {}", index, class_id);
        Some(index)
    }

    /// Set the selection cursor. Out-of-range indices clear it.
    pub fn select(&mut self, index: Option<usize>) {
        self.selected = index.filter(|&idx| idx < self.objects.len());
    }

    /// Remove the selected object and clear the selection.
    pub fn delete_selected(&mut self) -> Option<AnnotatedObject> {
        let index = self.selected.take()?;
        if index < self.objects.len() {
            Some(self.objects.remove(index))
        } else {
            None
        }
    }

    /// Remove the object at `index`, keeping the selection on the same object
    /// if it survives.
    pub fn remove(&mut self, index: usize) -> Option<AnnotatedObject> {
        if index >= self.objects.len() {
            return None;
        }
        let removed = self.objects.remove(index);
        self.selected = match self.selected {
            Some(sel) if sel == index => None,
            Some(sel) if sel > index => Some(sel - 1),
            other => other,
        };
        Some(removed)
    }

    /// Append a keypoint to the selected object. No-op without a selection.
    pub fn append_keypoint(&mut self, point: Point, visibility: Visibility) -> bool {
        match self.selected_object_mut() {
            Some(obj) => {
                obj.keypoints.push(Keypoint::new(point.x, point.y, visibility));
                true
            }
            None => false,
        }
    }

    /// Remove the last keypoint of the selected object, if any.
    pub fn delete_last_keypoint(&mut self) -> Option<Keypoint> {
        self.selected_object_mut()?.keypoints.pop()
    }
}
