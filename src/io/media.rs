// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Media file loading.
//!
//! This module discovers images in a directory and decodes them into RGBA
//! pixel buffers suitable for uploading as egui textures.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::io::error::MediaError;

/// A decoded image ready for display.
pub struct LoadedImage {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
    /// RGBA8, row-major
    pub pixels: Vec<u8>,
}

impl std::fmt::Debug for LoadedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedImage")
            .field("path", &self.path)
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

/// Whether `path` has one of `extensions`, compared case-insensitively.
pub fn has_image_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
        .unwrap_or(false)
}

/// List image files directly inside `dir`, sorted and de-duplicated.
pub fn discover_images(dir: &Path, extensions: &[String]) -> Result<Vec<PathBuf>, MediaError> {
    let read_dir_error = |source: std::io::Error| MediaError::ReadDir {
        path: dir.to_path_buf(),
        source,
    };

    let mut images = BTreeSet::new();
    for entry in std::fs::read_dir(dir).map_err(read_dir_error)? {
        let path = entry.map_err(read_dir_error)?.path();
        if path.is_file() && has_image_extension(&path, extensions) {
            images.insert(path);
        }
    }

    log::info!("Found {} images in {}", images.len(), dir.display());
    Ok(images.into_iter().collect())
}

/// Decode an image file into RGBA pixels.
pub fn load_image(path: &Path) -> Result<LoadedImage, MediaError> {
    let img = image::open(path).map_err(|source| MediaError::Decode {
        path: path.to_path_buf(),
        source,
    })?;

    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();

    Ok(LoadedImage {
        path: path.to_path_buf(),
        width,
        height,
        pixels: rgba.into_raw(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::scratch_dir;

    fn default_extensions() -> Vec<String> {
        ["jpg", "jpeg", "png", "bmp"].iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_has_image_extension_case_insensitive() {
        let exts = default_extensions();
        assert!(has_image_extension(Path::new("a/b.PNG"), &exts));
        assert!(has_image_extension(Path::new("a/b.Jpeg"), &exts));
        assert!(!has_image_extension(Path::new("a/b.txt"), &exts));
        assert!(!has_image_extension(Path::new("a/noext"), &exts));
    }

    #[test]
    fn test_discover_images_sorted_and_filtered() {
        let dir = scratch_dir("media", "discover");
        for name in ["b.png", "a.JPG", "c.txt", "d.bmp"] {
            std::fs::write(dir.join(name), b"x").unwrap();
        }
        std::fs::create_dir_all(dir.join("nested.png")).unwrap();

        let images = discover_images(&dir, &default_extensions()).unwrap();
        let names: Vec<_> = images
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.JPG", "b.png", "d.bmp"]);
    }

    #[test]
    fn test_discover_missing_dir_errors() {
        let dir = scratch_dir("media", "gone").join("does-not-exist");
        assert!(matches!(
            discover_images(&dir, &default_extensions()),
            Err(MediaError::ReadDir { .. })
        ));
    }

    #[test]
    fn test_load_image_dimensions() {
        let dir = scratch_dir("media", "load");
        let path = dir.join("frame.png");
        image::RgbaImage::new(12, 7).save(&path).unwrap();

        let loaded = load_image(&path).unwrap();
        assert_eq!((loaded.width, loaded.height), (12, 7));
        assert_eq!(loaded.pixels.len(), 12 * 7 * 4);
    }

    #[test]
    fn test_load_corrupt_image_errors() {
        let dir = scratch_dir("media", "corrupt");
        let path = dir.join("broken.png");
        std::fs::write(&path, b"definitely not a png").unwrap();

        assert!(matches!(load_image(&path), Err(MediaError::Decode { .. })));
    }
}
