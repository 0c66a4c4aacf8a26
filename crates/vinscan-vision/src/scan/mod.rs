// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scanning pipeline — frame preparation, enhancement and optical character
// recognition (OCR).

pub mod enhance;
pub mod preprocess;

#[cfg(feature = "ocr")]
pub mod ocr;

pub use enhance::{ImageprocVision, ImageprocVisionLoader};
pub use preprocess::FramePreprocessor;

#[cfg(feature = "ocr")]
pub use ocr::{OcrModelPaths, OcrsTextRecognizer};
