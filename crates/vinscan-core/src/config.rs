// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scanner configuration.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::CameraFacing;

/// Persistent scanner settings.
///
/// Every field has a default, so a partial JSON file only overrides what it
/// names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Minimum interval between scan cycles, in milliseconds.
    pub scan_interval_ms: u64,
    /// Bound on one recognition call.
    pub recognition_timeout_ms: u64,
    /// Bound on engine initialization (model load, symbology setup).
    pub engine_init_timeout_ms: u64,
    /// Bound on one registry lookup.
    pub lookup_timeout_ms: u64,
    /// How long to wait for the surface's playback-ready signal before
    /// proceeding anyway.
    pub camera_ready_timeout_ms: u64,
    /// Sightings required before a candidate is looked up.
    pub min_match_count: u32,
    /// Consecutive recognition errors before the engine is restarted.
    pub max_consecutive_errors: u32,
    /// Engine restarts allowed per session before the failure is fatal.
    pub max_engine_restarts: u32,
    /// Camera to ask for first.
    pub preferred_facing: CameraFacing,
    /// Crop band and enhancement settings.
    pub frame: FrameConfig,
    /// Registry base URL, e.g. `https://vpic.nhtsa.dot.gov`; `None` disables
    /// lookups.
    pub registry_url: Option<String>,
    /// Path template on the registry, `{vin}` is substituted.
    pub registry_path: String,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            scan_interval_ms: 500,
            recognition_timeout_ms: 3_000,
            engine_init_timeout_ms: 15_000,
            lookup_timeout_ms: 5_000,
            camera_ready_timeout_ms: 3_000,
            min_match_count: 2,
            max_consecutive_errors: 5,
            max_engine_restarts: 1,
            preferred_facing: CameraFacing::Environment,
            frame: FrameConfig::default(),
            registry_url: None,
            registry_path: "/api/vehicles/DecodeVinValues/{vin}?format=json".into(),
        }
    }
}

impl ScanConfig {
    pub fn scan_interval(&self) -> Duration {
        Duration::from_millis(self.scan_interval_ms)
    }

    pub fn recognition_timeout(&self) -> Duration {
        Duration::from_millis(self.recognition_timeout_ms)
    }

    pub fn engine_init_timeout(&self) -> Duration {
        Duration::from_millis(self.engine_init_timeout_ms)
    }

    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_millis(self.lookup_timeout_ms)
    }

    pub fn camera_ready_timeout(&self) -> Duration {
        Duration::from_millis(self.camera_ready_timeout_ms)
    }

    /// Load a config file, falling back to defaults when it does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }

    /// Write the config as pretty JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

/// Where in the frame the VIN is expected and how the crop is prepared.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameConfig {
    /// Fraction of the frame width trimmed from each side.
    pub horizontal_margin: f32,
    /// Fraction of the frame height kept, centred vertically.
    pub band_height: f32,
    /// Upscale the crop 2x (nearest-neighbour) before recognition.
    pub upscale: bool,
    /// Neighbourhood radius for adaptive thresholding.
    pub threshold_radius: u32,
    /// Constant subtracted from the local mean during thresholding.
    pub threshold_offset: i32,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            horizontal_margin: 0.05,
            band_height: 0.30,
            upscale: true,
            threshold_radius: 15,
            threshold_offset: 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config: ScanConfig =
            serde_json::from_str(r#"{ "scan_interval_ms": 250, "frame": { "upscale": false } }"#)
                .unwrap();
        assert_eq!(config.scan_interval(), Duration::from_millis(250));
        assert_eq!(config.min_match_count, 2);
        assert!(!config.frame.upscale);
        assert_eq!(config.frame.band_height, 0.30);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ScanConfig::load(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config, ScanConfig::default());
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let config = ScanConfig {
            registry_url: Some("http://127.0.0.1:8080".into()),
            max_engine_restarts: 2,
            ..Default::default()
        };
        config.save(&path).unwrap();
        assert_eq!(ScanConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(ScanConfig::load(&path).is_err());
    }
}
