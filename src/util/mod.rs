// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Coordinate helpers shared by the codec, the session and the canvas.

pub mod geometry;
