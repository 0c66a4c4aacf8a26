// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// vinscan-vision — Image handling for the VIN scanner.
//
// Crops the expected VIN band out of a camera frame, enhances it (grayscale,
// adaptive threshold, denoise) and, with the `ocr` feature, reads it with the
// `ocrs` engine.

pub mod image;
pub mod scan;

pub use self::image::processor::FrameProcessor;
pub use scan::enhance::{ImageprocVision, ImageprocVisionLoader};
pub use scan::preprocess::FramePreprocessor;

#[cfg(feature = "ocr")]
pub use scan::ocr::{OcrModelPaths, OcrsTextRecognizer};
