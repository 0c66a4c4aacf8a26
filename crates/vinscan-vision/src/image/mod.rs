// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image module — band crop, upscale and grayscale for camera frames.

pub mod processor;

pub use processor::{FrameProcessor, vin_band};
