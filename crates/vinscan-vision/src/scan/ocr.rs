// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Text recognition engine on `ocrs`, a pure-Rust OCR engine backed by neural
// network models executed via `rten`.
//
// # Feature Gate
//
// Only available with the `ocr` feature:
//
// ```toml
// vinscan-vision = { path = "crates/vinscan-vision", features = ["ocr"] }
// ```
//
// # Model Setup
//
// Two model files are required:
//
// - **Detection model** (`text-detection.rten`) — locates text regions.
// - **Recognition model** (`text-recognition.rten`) — decodes characters.
//
// Running `ocrs-cli` once downloads both to `$XDG_CACHE_HOME/ocrs`
// (typically `~/.cache/ocrs`), which is where this engine looks by default.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use ocrs::{ImageSource, OcrEngine as OcrsEngine, OcrEngineParams};
use rten::Model;
use tracing::{debug, info, instrument, warn};
use vinscan_bridge::traits::{
    LanguageProfile, SegmentationMode, TextEngineParams, TextRecognition, TextRecognizer,
};
use vinscan_core::error::{Result, VinScanError};
use vinscan_core::types::FrameSample;

const DETECTION_MODEL_FILENAME: &str = "text-detection.rten";
const RECOGNITION_MODEL_FILENAME: &str = "text-recognition.rten";

/// `$XDG_CACHE_HOME/ocrs`, falling back to `~/.cache/ocrs`.
fn default_model_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CACHE_HOME") {
        PathBuf::from(xdg).join("ocrs")
    } else if let Ok(home) = std::env::var("HOME") {
        PathBuf::from(home).join(".cache").join("ocrs")
    } else {
        PathBuf::from("ocrs-models")
    }
}

/// Where the engine finds its models.
#[derive(Debug, Clone)]
pub struct OcrModelPaths {
    pub detection: PathBuf,
    pub recognition: PathBuf,
}

impl Default for OcrModelPaths {
    fn default() -> Self {
        Self::from_dir(default_model_dir())
    }
}

impl OcrModelPaths {
    /// Expects `text-detection.rten` and `text-recognition.rten` in `dir`.
    pub fn from_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            detection: dir.join(DETECTION_MODEL_FILENAME),
            recognition: dir.join(RECOGNITION_MODEL_FILENAME),
        }
    }

    fn validate(&self) -> Result<()> {
        for path in [&self.detection, &self.recognition] {
            if !path.exists() {
                return Err(VinScanError::EngineInitializationFailed(format!(
                    "OCR model not found at {}; run `ocrs-cli` once to download models",
                    path.display()
                )));
            }
        }
        Ok(())
    }
}

/// `TextRecognizer` over `ocrs`.
///
/// Models are loaded on `initialize` and kept until `dispose`. Inference runs
/// on the blocking pool so the scan loop stays responsive to cancellation.
pub struct OcrsTextRecognizer {
    paths: OcrModelPaths,
    engine: Option<Arc<OcrsEngine>>,
    segmentation: SegmentationMode,
    whitelist: String,
}

impl OcrsTextRecognizer {
    pub fn new(paths: OcrModelPaths) -> Self {
        Self {
            paths,
            engine: None,
            segmentation: SegmentationMode::SingleLine,
            whitelist: String::new(),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.engine.is_some()
    }
}

impl Default for OcrsTextRecognizer {
    fn default() -> Self {
        Self::new(OcrModelPaths::default())
    }
}

fn load_engine(paths: &OcrModelPaths, allowed_chars: String) -> Result<OcrsEngine> {
    paths.validate()?;

    info!("Loading OCR detection model");
    let detection_model = Model::load_file(&paths.detection).map_err(|err| {
        VinScanError::EngineInitializationFailed(format!(
            "failed to load detection model from {}: {}",
            paths.detection.display(),
            err
        ))
    })?;

    info!("Loading OCR recognition model");
    let recognition_model = Model::load_file(&paths.recognition).map_err(|err| {
        VinScanError::EngineInitializationFailed(format!(
            "failed to load recognition model from {}: {}",
            paths.recognition.display(),
            err
        ))
    })?;

    OcrsEngine::new(OcrEngineParams {
        detection_model: Some(detection_model),
        recognition_model: Some(recognition_model),
        allowed_chars: Some(allowed_chars),
        ..Default::default()
    })
    .map_err(|err| {
        VinScanError::EngineInitializationFailed(format!("failed to initialise OCR engine: {}", err))
    })
}

fn run_ocr(engine: &OcrsEngine, rgb: &image::RgbImage) -> Result<String> {
    let (width, height) = rgb.dimensions();
    let source = ImageSource::from_bytes(rgb.as_raw(), (width, height)).map_err(|err| {
        VinScanError::Recognition(format!(
            "failed to create image source ({}x{}): {}",
            width, height, err
        ))
    })?;
    let input = engine
        .prepare_input(source)
        .map_err(|err| VinScanError::Recognition(format!("OCR preprocessing failed: {}", err)))?;
    engine
        .get_text(&input)
        .map_err(|err| VinScanError::Recognition(format!("OCR text recognition failed: {}", err)))
}

/// Pick the engine's output according to the segmentation mode. In
/// single-line mode the longest line wins, since the plate label ("VIN") is
/// usually shorter than the number itself.
fn select_text(raw: &str, segmentation: SegmentationMode) -> String {
    match segmentation {
        SegmentationMode::SingleLine => raw
            .lines()
            .map(str::trim)
            .max_by_key(|line| line.len())
            .unwrap_or_default()
            .to_string(),
        SegmentationMode::SingleBlock => raw.split_whitespace().collect::<Vec<_>>().join(" "),
    }
}

/// Share of non-space characters that fall inside the whitelist.
fn whitelist_confidence(text: &str, whitelist: &str) -> f32 {
    let mut total = 0usize;
    let mut allowed = 0usize;
    for c in text.chars().filter(|c| !c.is_whitespace()) {
        total += 1;
        if whitelist.contains(c.to_ascii_uppercase()) {
            allowed += 1;
        }
    }
    if total == 0 {
        0.0
    } else {
        allowed as f32 / total as f32
    }
}

#[async_trait]
impl TextRecognizer for OcrsTextRecognizer {
    #[instrument(skip_all, fields(language = %profile.language))]
    async fn initialize(
        &mut self,
        profile: &LanguageProfile,
        params: &TextEngineParams,
    ) -> Result<()> {
        if profile.language != "eng" {
            warn!(language = %profile.language, "ocrs ships a Latin model only; using it anyway");
        }
        let paths = self.paths.clone();
        let allowed = params.char_whitelist.clone();
        let engine = tokio::task::spawn_blocking(move || load_engine(&paths, allowed))
            .await
            .map_err(|e| VinScanError::EngineInitializationFailed(format!("model loader panicked: {e}")))??;

        self.segmentation = params.segmentation;
        self.whitelist = params.char_whitelist.clone();
        self.engine = Some(Arc::new(engine));
        info!("OCR engine initialised");
        Ok(())
    }

    async fn recognize(&mut self, frame: &FrameSample) -> Result<TextRecognition> {
        let engine = self.engine.clone().ok_or_else(|| {
            VinScanError::Recognition("recognize called before initialize".into())
        })?;
        let rgb = frame.image().to_rgb8();

        let raw = tokio::task::spawn_blocking(move || run_ocr(&engine, &rgb))
            .await
            .map_err(|e| VinScanError::Recognition(format!("OCR worker panicked: {e}")))??;

        let text = select_text(&raw, self.segmentation);
        let confidence = whitelist_confidence(&text, &self.whitelist);
        debug!(chars = text.len(), confidence, "OCR cycle complete");
        Ok(TextRecognition { text, confidence })
    }

    async fn dispose(&mut self) {
        if self.engine.take().is_some() {
            debug!("OCR engine disposed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vinscan_core::vin::VIN_ALPHABET;

    #[test]
    fn model_paths_from_dir() {
        let paths = OcrModelPaths::from_dir("/tmp/my-models");
        assert_eq!(paths.detection, PathBuf::from("/tmp/my-models/text-detection.rten"));
        assert_eq!(
            paths.recognition,
            PathBuf::from("/tmp/my-models/text-recognition.rten")
        );
    }

    #[tokio::test]
    async fn missing_models_fail_initialization() {
        let mut engine = OcrsTextRecognizer::new(OcrModelPaths::from_dir("/nonexistent/ocr"));
        let result = engine
            .initialize(&LanguageProfile::default(), &TextEngineParams::vin())
            .await;
        assert!(matches!(result, Err(VinScanError::EngineInitializationFailed(_))));
        assert!(!engine.is_ready());
    }

    #[test]
    fn single_line_keeps_longest_line() {
        let raw = "VIN\n 1HGCM82633A004352 \n";
        assert_eq!(
            select_text(raw, SegmentationMode::SingleLine),
            "1HGCM82633A004352"
        );
        assert_eq!(select_text("", SegmentationMode::SingleLine), "");
    }

    #[test]
    fn confidence_counts_whitelisted_characters() {
        assert_eq!(whitelist_confidence("1HGC", VIN_ALPHABET), 1.0);
        assert_eq!(whitelist_confidence("1H-C", VIN_ALPHABET), 0.75);
        assert_eq!(whitelist_confidence("", VIN_ALPHABET), 0.0);
    }
}
