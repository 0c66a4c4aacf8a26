// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for VIN scanning.

use image::DynamicImage;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::vin::Vin;

/// Unique identifier for a scan session (log correlation only).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which recognition engine a session runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanMode {
    /// Free-text optical character recognition on a cropped frame.
    Text,
    /// Barcode decoding directly from the live surface.
    Code,
}

impl std::fmt::Display for ScanMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Text => "text",
            Self::Code => "code",
        })
    }
}

impl std::str::FromStr for ScanMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" | "ocr" => Ok(Self::Text),
            "code" | "barcode" => Ok(Self::Code),
            other => Err(format!("unknown scan mode '{other}' (expected text or code)")),
        }
    }
}

/// Lifecycle states of a scan session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScanState {
    /// No session has been started yet.
    Idle,
    /// Acquiring vision capability, camera, and recognition engine.
    Initializing,
    /// Running recognition cycles.
    Scanning,
    /// Caller paused the session; no cycles are scheduled.
    Paused,
    /// A candidate was accepted and is being handed to the caller.
    CandidateFound,
    /// All resources released.
    Closed,
    /// A fatal error ended the session.
    Failed,
}

impl ScanState {
    /// Whether the session has ended (no further transitions).
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Closed | Self::Failed)
    }
}

/// How the scan loop treats an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorClass {
    /// Absorbed inside the loop; the next cycle tries again.
    Recoverable,
    /// The user has to do something (grant permission, retype the VIN).
    UserAction,
    /// Ends the session.
    Fatal,
    /// The caller closed the session.
    Cancelled,
}

/// Camera facing preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CameraFacing {
    /// Rear camera (the one pointed at the windshield).
    Environment,
    /// Front camera.
    User,
}

/// Barcode symbologies found on VIN plates and door-jamb labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Symbology {
    Code39,
    Code128,
    DataMatrix,
}

/// Symbology hints passed to code engines.
pub const VIN_SYMBOLOGIES: [Symbology; 3] =
    [Symbology::Code39, Symbology::Code128, Symbology::DataMatrix];

/// Pixel bounds of a region inside a source frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionBounds {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// One normalized image region, produced per cycle and consumed once.
#[derive(Debug, Clone)]
pub struct FrameSample {
    image: DynamicImage,
    region: RegionBounds,
}

impl FrameSample {
    pub fn new(image: DynamicImage, region: RegionBounds) -> Self {
        Self { image, region }
    }

    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    /// Where the sample was cut from in the source frame.
    pub fn region(&self) -> RegionBounds {
        self.region
    }

    pub fn into_image(self) -> DynamicImage {
        self.image
    }
}

/// Output of one recognition call.
#[derive(Debug, Clone, PartialEq)]
pub enum RecognitionResult {
    /// OCR text and the engine's confidence in `[0, 1]`.
    Text { raw_text: String, confidence: f32 },
    /// Decoded barcode payload.
    Code { decoded_text: String },
}

impl RecognitionResult {
    pub fn text(&self) -> &str {
        match self {
            Self::Text { raw_text, .. } => raw_text,
            Self::Code { decoded_text } => decoded_text,
        }
    }
}

/// Fields returned by the vehicle registry for one VIN.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryRecord {
    pub make: Option<String>,
    pub model: Option<String>,
    pub year: Option<u16>,
}

impl RegistryRecord {
    /// A record is usable when at least one field carries data.
    pub fn is_usable(&self) -> bool {
        let filled = |s: &Option<String>| s.as_deref().is_some_and(|v| !v.trim().is_empty());
        filled(&self.make) || filled(&self.model) || self.year.is_some()
    }
}

/// The confirmed scan result handed to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleInfo {
    pub vin: Vin,
    pub make: Option<String>,
    pub model: Option<String>,
    pub year: Option<u16>,
}

impl VehicleInfo {
    /// A VIN accepted on format alone.
    pub fn unenriched(vin: Vin) -> Self {
        Self {
            vin,
            make: None,
            model: None,
            year: None,
        }
    }

    /// A VIN enriched with registry fields (blank strings become `None`).
    pub fn from_record(vin: Vin, record: RegistryRecord) -> Self {
        let keep = |s: Option<String>| s.map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        Self {
            vin,
            make: keep(record.make),
            model: keep(record.model),
            year: record.year,
        }
    }

    /// Whether the registry contributed anything.
    pub fn is_enriched(&self) -> bool {
        self.make.is_some() || self.model.is_some() || self.year.is_some()
    }
}

/// Snapshot of the running session, published to the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionStatus {
    pub session_id: Option<SessionId>,
    pub state: ScanState,
    pub mode: Option<ScanMode>,
    pub frame_count: u64,
    pub has_flash: bool,
    pub flash_on: bool,
}

impl Default for SessionStatus {
    fn default() -> Self {
        Self {
            session_id: None,
            state: ScanState::Idle,
            mode: None,
            frame_count: 0,
            has_flash: false,
            flash_on: false,
        }
    }
}
