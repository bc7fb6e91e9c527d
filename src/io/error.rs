// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Error types for label, media and session operations.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while reading or writing label files.
///
/// The per-line variants are recovered from inside the decoder: the line is
/// logged and skipped, and decoding continues.
#[derive(Error, Debug)]
pub enum LabelError {
    /// I/O error during file operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Line has fewer than the five box fields
    #[error("Line {line}: expected at least 5 fields, found {fields}")]
    MalformedLine {
        /// 1-based line number
        line: usize,
        /// Number of fields found
        fields: usize,
    },

    /// A field could not be parsed as a finite number
    #[error("Line {line}: invalid number '{token}'")]
    InvalidNumber {
        /// 1-based line number
        line: usize,
        /// The offending token
        token: String,
    },

    /// Class id field is negative
    #[error("Line {line}: negative class id {value}")]
    NegativeClassId {
        /// 1-based line number
        line: usize,
        /// The parsed class value
        value: f64,
    },
}

/// Errors from the image collaborator.
#[derive(Error, Debug)]
pub enum MediaError {
    /// Image file could not be opened or decoded
    #[error("Failed to decode image {path:?}: {source}")]
    Decode {
        /// Path of the image
        path: PathBuf,
        /// Underlying decoder error
        #[source]
        source: image::ImageError,
    },

    /// Directory could not be listed
    #[error("Failed to read directory {path:?}: {source}")]
    ReadDir {
        /// Directory that was listed
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// Errors surfaced by the editing session to the UI.
#[derive(Error, Debug)]
pub enum SessionError {
    /// Writing the label file failed; in-memory annotations are kept
    #[error("Failed to save labels to {path:?}: {source}")]
    Save {
        /// Label file path
        path: PathBuf,
        /// Underlying label error
        #[source]
        source: LabelError,
    },

    /// The label file existed but could not be read, so saving over it is
    /// refused
    #[error("Labels in {path:?} were not loaded; refusing to overwrite them")]
    LabelsNotLoaded {
        /// Label file path
        path: PathBuf,
    },

    /// Image collaborator failure
    #[error(transparent)]
    Media(#[from] MediaError),

    /// Directory contains no images with a configured extension
    #[error("No images found in {0:?}")]
    NoImages(PathBuf),

    /// None of the listed images could be decoded
    #[error("No readable images left in the list")]
    NoReadableImages,
}
