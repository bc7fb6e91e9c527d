// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! I/O operations for images and label files.

pub mod error;
pub mod labels;
pub mod media;
