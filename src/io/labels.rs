// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Keypoint label file encoding and decoding.
//!
//! One text file per image, one line per object:
//!
//! ```text
//! <class> <xc> <yc> <w> <h> [<kx> <ky> <v>]*
//! ```
//!
//! Box and keypoint coordinates are normalized by the image size and written
//! with six decimals. On read, keypoints written as bare `x y` pairs are also
//! accepted; see [`resolve_stride`].

use std::fs::File;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::io::error::LabelError;
use crate::models::annotation::{
    AnnotatedObject, AnnotationSet, BoundingBox, Keypoint, Point, Visibility,
};
use crate::util::geometry::{denormalize_coordinates, normalize_coordinates};

/// Number of leading fields describing the class and box.
const BOX_FIELDS: usize = 5;

/// Number of numeric fields used per keypoint in a label line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeypointStride {
    /// `x y v`
    Triplet,
    /// `x y`, visibility defaults to visible
    Pair,
}

impl KeypointStride {
    pub fn width(self) -> usize {
        match self {
            KeypointStride::Triplet => 3,
            KeypointStride::Pair => 2,
        }
    }
}

/// Pick the keypoint stride for `count` trailing fields.
///
/// A count divisible by 3 is always read as triplets, even when it is also
/// divisible by 2. Pairs are used only for even counts that are not multiples
/// of 3. Counts matching neither fall back to triplets and the caller drops
/// the remainder.
pub fn resolve_stride(count: usize) -> KeypointStride {
    if count % 3 == 0 {
        if count > 0 && count % 2 == 0 {
            log::debug!("{} keypoint fields fit both strides, reading as triplets", count);
        }
        KeypointStride::Triplet
    } else if count % 2 == 0 {
        KeypointStride::Pair
    } else {
        KeypointStride::Triplet
    }
}

/// Label file path for an image: same stem, `.txt` extension.
pub fn label_path_for(image_path: &Path) -> PathBuf {
    image_path.with_extension("txt")
}

/// Encode an annotation set as label text. Lines are joined with `\n`
/// without a trailing newline.
pub fn encode(set: &AnnotationSet, width: u32, height: u32) -> String {
    set.iter()
        .map(|obj| encode_object(obj, width, height))
        .collect::<Vec<_>>()
        .join("\n")
}

fn encode_object(obj: &AnnotatedObject, width: u32, height: u32) -> String {
    let bbox = obj.bbox.normalized();
    let center = bbox.center();
    let center = normalize_coordinates(center.x, center.y, width, height);
    let size = normalize_coordinates(bbox.width(), bbox.height(), width, height);

    let mut line = format!(
        "{} {:.6} {:.6} {:.6} {:.6}",
        obj.class_id, center.x, center.y, size.x, size.y
    );

    for kp in &obj.keypoints {
        let n = normalize_coordinates(kp.x, kp.y, width, height);
        line.push_str(&format!(" {:.6} {:.6} {}", n.x, n.y, kp.visibility.code()));
    }

    line
}

/// Decode label text into an annotation set.
///
/// Bad lines are logged and skipped; they never abort the decode.
pub fn decode(text: &str, width: u32, height: u32) -> AnnotationSet {
    let mut objects = Vec::new();

    for (idx, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match decode_line(idx + 1, line, width, height) {
            Ok(obj) => objects.push(obj),
            Err(e) => log::warn!("Skipping label line: {}", e),
        }
    }

    AnnotationSet::from_objects(objects)
}

fn parse_field(line: usize, token: &str) -> Result<f64, LabelError> {
    token
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| LabelError::InvalidNumber {
            line,
            token: token.to_string(),
        })
}

/// Decode a single non-empty label line. `line` is the 1-based line number
/// used in error reports.
pub fn decode_line(
    line: usize,
    text: &str,
    width: u32,
    height: u32,
) -> Result<AnnotatedObject, LabelError> {
    let values = text
        .split_whitespace()
        .map(|token| parse_field(line, token))
        .collect::<Result<Vec<f64>, _>>()?;

    if values.len() < BOX_FIELDS {
        return Err(LabelError::MalformedLine {
            line,
            fields: values.len(),
        });
    }

    let class = values[0].trunc();
    if class < 0.0 {
        return Err(LabelError::NegativeClassId { line, value: class });
    }

    let (cx, cy) = denormalize_coordinates(&Point::new(values[1], values[2]), width, height);
    let (bw, bh) = denormalize_coordinates(&Point::new(values[3], values[4]), width, height);
    let bbox = BoundingBox::new(cx - bw / 2.0, cy - bh / 2.0, cx + bw / 2.0, cy + bh / 2.0);

    let data = &values[BOX_FIELDS..];
    let stride = resolve_stride(data.len());
    let chunks = data.chunks_exact(stride.width());
    if !chunks.remainder().is_empty() {
        log::warn!(
            "Line {}: dropping {} trailing keypoint field(s)",
            line,
            chunks.remainder().len()
        );
    }

    let keypoints = chunks
        .map(|chunk| {
            let (x, y) = denormalize_coordinates(&Point::new(chunk[0], chunk[1]), width, height);
            let visibility = match stride {
                KeypointStride::Pair => Visibility::Visible,
                KeypointStride::Triplet => {
                    let code = chunk[2].trunc() as i64;
                    Visibility::from_code(code).unwrap_or_else(|| {
                        log::warn!("Line {}: unknown visibility {}, using visible", line, code);
                        Visibility::Visible
                    })
                }
            };
            Keypoint::new(x, y, visibility)
        })
        .collect();

    Ok(AnnotatedObject {
        class_id: class as u32,
        bbox,
        keypoints,
    })
}

/// Read the label file at `path`. A missing file yields an empty set.
///
/// Invalid UTF-8 is replaced rather than rejected, so only the lines it
/// touches fail to decode.
pub fn read_labels(path: &Path, width: u32, height: u32) -> Result<AnnotationSet, LabelError> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(decode(&String::from_utf8_lossy(&bytes), width, height)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(AnnotationSet::new()),
        Err(e) => Err(e.into()),
    }
}

/// Write `set` to `path`, flushed to disk before returning.
pub fn write_labels(
    path: &Path,
    set: &AnnotationSet,
    width: u32,
    height: u32,
) -> Result<(), LabelError> {
    let text = encode(set, width, height);
    let mut file = File::create(path)?;
    file.write_all(text.as_bytes())?;
    file.sync_all()?;
    Ok(())
}
