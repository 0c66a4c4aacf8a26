// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// vinscan-scan — The scan session: camera lifecycle, throttled recognition
// cycles, OCR/barcode candidate correction, sighting-based validation and
// registry enrichment.

pub mod capture;
pub mod corrector;
pub mod engine;
pub mod registry;
pub mod scheduler;
pub mod session;
pub mod validator;

#[cfg(test)]
mod testing;

pub use capture::CaptureSession;
pub use corrector::{correct_barcode_text, correct_ocr_text};
pub use engine::{BudgetVerdict, ErrorBudget, RecognitionEngine};
pub use registry::HttpVehicleRegistry;
pub use scheduler::{Scheduler, TokioScheduler};
pub use session::{ScanTicket, VinScanner};
pub use validator::Validator;
