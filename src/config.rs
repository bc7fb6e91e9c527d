// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Editor configuration.
//!
//! Settings are read from a YAML or JSON file, chosen by extension. Missing
//! fields fall back to their defaults.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::models::annotation::Visibility;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "KEYPOINT_LABELER_CONFIG";

/// Config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "keypoint_labeler.yaml";

/// Log level setting for the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Convert to log crate's LevelFilter.
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// User-tunable editor settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Directory opened at startup
    pub image_dir: Option<PathBuf>,
    /// Extensions (without dot) treated as images, case-insensitive
    pub image_extensions: Vec<String>,
    /// Minimum box width and height in image pixels
    pub min_box_size: f64,
    /// Class id used for new boxes until changed in the toolbar
    pub default_class_id: u32,
    /// Visibility given to new keypoints
    pub default_visibility: Visibility,
    /// Scale multiplier per scroll step towards the user
    pub zoom_in_factor: f64,
    /// Scale multiplier per scroll step away from the user
    pub zoom_out_factor: f64,
    /// Keypoint marker radius in screen pixels
    pub keypoint_radius: f32,
    pub log_level: LogLevel,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            image_dir: None,
            image_extensions: ["jpg", "jpeg", "png", "bmp"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            min_box_size: 5.0,
            default_class_id: 0,
            default_visibility: Visibility::Visible,
            zoom_in_factor: 1.1,
            zoom_out_factor: 0.9,
            keypoint_radius: 4.0,
            log_level: LogLevel::Info,
        }
    }
}

impl EditorConfig {
    /// Load a config file, picking the parser from its extension.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let extension = path.extension().and_then(|s| s.to_str());
        let config: Self = match extension {
            Some("yaml") | Some("yml") => serde_yaml::from_str(&text)?,
            Some("json") => serde_json::from_str(&text)?,
            _ => bail!("Unsupported config file extension: {:?}", extension),
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would break box or zoom invariants.
    pub fn validate(&self) -> Result<()> {
        if !(self.min_box_size.is_finite() && self.min_box_size >= 0.0) {
            bail!("min_box_size must be a non-negative number, got {}", self.min_box_size);
        }
        if !(self.zoom_in_factor.is_finite() && self.zoom_in_factor > 1.0) {
            bail!("zoom_in_factor must be greater than 1, got {}", self.zoom_in_factor);
        }
        if !(self.zoom_out_factor.is_finite()
            && self.zoom_out_factor > 0.0
            && self.zoom_out_factor < 1.0)
        {
            bail!("zoom_out_factor must be between 0 and 1, got {}", self.zoom_out_factor);
        }
        if !(self.keypoint_radius.is_finite() && self.keypoint_radius > 0.0) {
            bail!("keypoint_radius must be positive, got {}", self.keypoint_radius);
        }
        Ok(())
    }

    /// Path of the config file to use, if one exists.
    pub fn locate() -> Option<PathBuf> {
        if let Some(path) = std::env::var_os(CONFIG_ENV_VAR) {
            return Some(PathBuf::from(path));
        }
        let local = PathBuf::from(DEFAULT_CONFIG_FILE);
        local.exists().then_some(local)
    }
}
