// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Capability bundle for the command line: still-image camera, imageproc
// enhancement, ocrs text engine when built with `ocr`, and the HTTP registry
// when a base URL is configured. Everything else comes from the platform
// stubs.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{info, warn};
use vinscan_bridge::platform_capabilities;
use vinscan_bridge::stub::StubBridge;
use vinscan_bridge::traits::{CameraProvider, ScanCapabilities, VehicleRegistry};
use vinscan_core::ScanConfig;
use vinscan_scan::HttpVehicleRegistry;
use vinscan_vision::ImageprocVisionLoader;

/// Registry selected by the config: HTTP when a base URL is set, otherwise
/// one that knows nothing (VINs are accepted on format alone).
pub fn registry(config: &ScanConfig) -> Arc<dyn VehicleRegistry> {
    let Some(url) = &config.registry_url else {
        info!("No registry URL configured; lookups disabled");
        return Arc::new(StubBridge);
    };
    match HttpVehicleRegistry::new(url.clone(), config.registry_path.clone()) {
        Ok(registry) => {
            info!(url = %url, "Using HTTP vehicle registry");
            Arc::new(registry)
        }
        Err(e) => {
            warn!(error = %e, "Registry client unavailable; lookups disabled");
            Arc::new(StubBridge)
        }
    }
}

/// Full bundle around `camera`.
pub fn build(
    camera: Arc<dyn CameraProvider>,
    config: &ScanConfig,
    ocr_models: Option<PathBuf>,
) -> ScanCapabilities {
    let mut caps = platform_capabilities();
    caps.camera = camera;
    caps.vision = Some(Arc::new(ImageprocVisionLoader::new(&config.frame)));
    caps.registry = registry(config);
    install_text_engine(&mut caps, ocr_models);
    caps
}

#[cfg(feature = "ocr")]
fn install_text_engine(caps: &mut ScanCapabilities, ocr_models: Option<PathBuf>) {
    use vinscan_bridge::traits::TextRecognizer;
    use vinscan_vision::{OcrModelPaths, OcrsTextRecognizer};

    let paths = ocr_models.map(OcrModelPaths::from_dir).unwrap_or_default();
    info!(detection = %paths.detection.display(), "Using ocrs text engine");
    caps.text_engines = Arc::new(move || {
        Box::new(OcrsTextRecognizer::new(paths.clone())) as Box<dyn TextRecognizer>
    });
}

#[cfg(not(feature = "ocr"))]
fn install_text_engine(_caps: &mut ScanCapabilities, ocr_models: Option<PathBuf>) {
    if ocr_models.is_some() {
        warn!("--ocr-models ignored: built without the `ocr` feature");
    }
}
