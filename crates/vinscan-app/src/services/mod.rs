// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Service layer — wires the scanner crates to what the command line has:
// image files instead of a camera, and the configured registry.

pub mod capabilities;
pub mod data_dir;
pub mod still_camera;
