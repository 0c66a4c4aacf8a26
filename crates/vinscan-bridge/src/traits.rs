// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Platform-agnostic trait definitions for the capabilities a scan session
// consumes.
//
// The scanner never talks to a camera, an OCR library, a barcode library or
// the vehicle registry directly. Each one sits behind a trait here; platforms
// (and tests) supply the implementations.

use std::sync::Arc;

use async_trait::async_trait;
use image::{DynamicImage, GrayImage, RgbaImage};
use vinscan_core::error::Result;
use vinscan_core::types::{CameraFacing, FrameSample, RegistryRecord, Symbology};
use vinscan_core::vin::{VIN_ALPHABET, Vin};

// ---------------------------------------------------------------------------
// Camera
// ---------------------------------------------------------------------------

/// Kind of media carried by a track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackKind {
    Video,
    Audio,
}

/// Optional features a track reports at acquisition time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrackCapabilities {
    /// The track can drive the device torch (flash held on).
    pub torch: bool,
}

/// One media track within a camera stream.
pub trait MediaTrack: Send + Sync {
    /// Device label (e.g. "Back Camera").
    fn label(&self) -> &str;

    fn kind(&self) -> TrackKind;

    fn capabilities(&self) -> TrackCapabilities;

    /// Apply the torch constraint. Only called when `capabilities().torch`.
    fn apply_torch(&self, on: bool) -> Result<()>;

    /// Stop the track and release the device. Must be idempotent.
    fn stop(&self);

    /// Whether the track is still delivering media.
    fn is_live(&self) -> bool;

    /// Latest decoded video frame, if the track has one ready.
    fn grab_frame(&self) -> Option<RgbaImage> {
        None
    }
}

/// A live camera stream: the set of tracks handed out by one request.
#[derive(Clone)]
pub struct MediaStream {
    tracks: Vec<Arc<dyn MediaTrack>>,
}

impl MediaStream {
    pub fn new(tracks: Vec<Arc<dyn MediaTrack>>) -> Self {
        Self { tracks }
    }

    pub fn tracks(&self) -> &[Arc<dyn MediaTrack>] {
        &self.tracks
    }

    /// The first video track, which carries frames and the torch.
    pub fn video_track(&self) -> Option<&Arc<dyn MediaTrack>> {
        self.tracks.iter().find(|t| t.kind() == TrackKind::Video)
    }

    /// Stop every track in the stream.
    pub fn stop_all(&self) {
        for track in &self.tracks {
            track.stop();
        }
    }

    pub fn live_track_count(&self) -> usize {
        self.tracks.iter().filter(|t| t.is_live()).count()
    }
}

impl std::fmt::Debug for MediaStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaStream")
            .field("tracks", &self.tracks.iter().map(|t| t.label()).collect::<Vec<_>>())
            .finish()
    }
}

/// Hands out camera streams.
#[async_trait]
pub trait CameraProvider: Send + Sync {
    /// Request a stream from the camera facing `facing`, or from any camera
    /// when `facing` is `None`.
    async fn request_stream(&self, facing: Option<CameraFacing>) -> Result<MediaStream>;
}

/// The surface a stream is rendered into (a video element, a preview layer).
#[async_trait]
pub trait RenderSurface: Send + Sync {
    fn attach(&self, stream: &MediaStream);

    fn detach(&self);

    /// Start playback. Resolves when the surface signals it is ready.
    async fn play(&self) -> Result<()>;

    fn is_attached(&self) -> bool;

    /// The frame currently shown, or `None` when the surface is not yet
    /// ready for reads.
    fn current_frame(&self) -> Option<RgbaImage>;
}

// ---------------------------------------------------------------------------
// Vision preprocessing
// ---------------------------------------------------------------------------

/// Pure image-in/image-out enhancement operations.
pub trait VisionPreprocessing: Send + Sync {
    fn grayscale(&self, frame: &DynamicImage) -> GrayImage;

    fn adaptive_threshold(&self, frame: &GrayImage) -> GrayImage;

    fn denoise(&self, region: &GrayImage) -> GrayImage;
}

/// Acquires a vision capability for one session.
#[async_trait]
pub trait VisionLoader: Send + Sync {
    async fn load(&self) -> Result<Arc<dyn VisionPreprocessing>>;
}

// ---------------------------------------------------------------------------
// Recognition engines
// ---------------------------------------------------------------------------

/// Language data a text engine loads at initialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageProfile {
    pub language: String,
}

impl Default for LanguageProfile {
    fn default() -> Self {
        Self {
            language: "eng".into(),
        }
    }
}

/// How the text engine segments the image into lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentationMode {
    SingleLine,
    SingleBlock,
}

/// Text engine parameters applied at initialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEngineParams {
    /// Characters the engine may emit.
    pub char_whitelist: String,
    pub segmentation: SegmentationMode,
}

impl TextEngineParams {
    /// VIN alphabet, single line.
    pub fn vin() -> Self {
        Self {
            char_whitelist: VIN_ALPHABET.to_string(),
            segmentation: SegmentationMode::SingleLine,
        }
    }
}

/// Raw output of a text engine.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRecognition {
    pub text: String,
    /// Engine confidence in `[0, 1]`.
    pub confidence: f32,
}

/// Free-text OCR engine. One instance belongs to one session.
#[async_trait]
pub trait TextRecognizer: Send {
    async fn initialize(&mut self, profile: &LanguageProfile, params: &TextEngineParams)
    -> Result<()>;

    async fn recognize(&mut self, frame: &FrameSample) -> Result<TextRecognition>;

    /// Release models and workers. Must be safe on an uninitialized engine.
    async fn dispose(&mut self);
}

/// Barcode engine decoding straight from the live surface.
#[async_trait]
pub trait CodeRecognizer: Send {
    async fn initialize(&mut self, hints: &[Symbology]) -> Result<()>;

    /// Decode whatever is on the surface now. `Ok(None)` means nothing found.
    async fn decode_once(&mut self, surface: &dyn RenderSurface) -> Result<Option<String>>;

    async fn reset(&mut self);
}

/// Creates a fresh text engine for every session.
pub trait TextEngineFactory: Send + Sync {
    fn create(&self) -> Box<dyn TextRecognizer>;
}

impl<F> TextEngineFactory for F
where
    F: Fn() -> Box<dyn TextRecognizer> + Send + Sync,
{
    fn create(&self) -> Box<dyn TextRecognizer> {
        self()
    }
}

/// Creates a fresh code engine for every session.
pub trait CodeEngineFactory: Send + Sync {
    fn create(&self) -> Box<dyn CodeRecognizer>;
}

impl<F> CodeEngineFactory for F
where
    F: Fn() -> Box<dyn CodeRecognizer> + Send + Sync,
{
    fn create(&self) -> Box<dyn CodeRecognizer> {
        self()
    }
}

// ---------------------------------------------------------------------------
// Vehicle registry
// ---------------------------------------------------------------------------

/// Best-effort enrichment of a VIN with make, model and year.
#[async_trait]
pub trait VehicleRegistry: Send + Sync {
    /// `Ok(None)` means the registry has nothing for this VIN.
    async fn decode(&self, vin: &Vin) -> Result<Option<RegistryRecord>>;
}

// ---------------------------------------------------------------------------
// Capability bundle
// ---------------------------------------------------------------------------

/// Everything a scanner needs, supplied once by the platform.
#[derive(Clone)]
pub struct ScanCapabilities {
    pub camera: Arc<dyn CameraProvider>,
    /// `None` runs recognition on the raw crop.
    pub vision: Option<Arc<dyn VisionLoader>>,
    pub text_engines: Arc<dyn TextEngineFactory>,
    pub code_engines: Arc<dyn CodeEngineFactory>,
    pub registry: Arc<dyn VehicleRegistry>,
}
