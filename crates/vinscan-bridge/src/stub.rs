// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Stub capabilities for builds with no camera or recognition backend.
//
// Camera and engines return `PlatformUnavailable`; the registry simply knows
// nothing, so scans still complete without enrichment.

use async_trait::async_trait;
use vinscan_core::error::{Result, VinScanError};
use vinscan_core::types::{CameraFacing, FrameSample, RegistryRecord, Symbology};
use vinscan_core::vin::Vin;

use crate::traits::*;

/// No-op bridge returned when no platform backend is compiled in.
pub struct StubBridge;

#[async_trait]
impl CameraProvider for StubBridge {
    async fn request_stream(&self, _facing: Option<CameraFacing>) -> Result<MediaStream> {
        tracing::warn!("CameraProvider::request_stream called on stub bridge");
        Err(VinScanError::PlatformUnavailable)
    }
}

#[async_trait]
impl VehicleRegistry for StubBridge {
    async fn decode(&self, _vin: &Vin) -> Result<Option<RegistryRecord>> {
        Ok(None)
    }
}

/// Text engine that never initializes.
pub struct StubTextRecognizer;

#[async_trait]
impl TextRecognizer for StubTextRecognizer {
    async fn initialize(
        &mut self,
        _profile: &LanguageProfile,
        _params: &TextEngineParams,
    ) -> Result<()> {
        tracing::warn!("TextRecognizer::initialize called on stub bridge");
        Err(VinScanError::PlatformUnavailable)
    }

    async fn recognize(&mut self, _frame: &FrameSample) -> Result<TextRecognition> {
        Err(VinScanError::PlatformUnavailable)
    }

    async fn dispose(&mut self) {}
}

/// Code engine that never initializes.
pub struct StubCodeRecognizer;

#[async_trait]
impl CodeRecognizer for StubCodeRecognizer {
    async fn initialize(&mut self, _hints: &[Symbology]) -> Result<()> {
        tracing::warn!("CodeRecognizer::initialize called on stub bridge");
        Err(VinScanError::PlatformUnavailable)
    }

    async fn decode_once(&mut self, _surface: &dyn RenderSurface) -> Result<Option<String>> {
        Err(VinScanError::PlatformUnavailable)
    }

    async fn reset(&mut self) {}
}
