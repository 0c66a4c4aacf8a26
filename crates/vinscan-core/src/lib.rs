// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// vinscan — VIN grammar, core types, and error definitions shared across all
// crates.

pub mod config;
pub mod error;
pub mod human_errors;
pub mod types;
pub mod vin;

pub use config::{FrameConfig, ScanConfig};
pub use error::VinScanError;
pub use types::*;
pub use vin::Vin;
