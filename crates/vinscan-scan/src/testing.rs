// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Test doubles for the capability traits: a camera that hands out trackable
// tracks, scripted recognition engines, and a counting registry.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use image::{Rgba, RgbaImage};
use vinscan_bridge::traits::*;
use vinscan_core::error::{Result, VinScanError};
use vinscan_core::types::{CameraFacing, FrameSample, RegistryRecord, Symbology};
use vinscan_core::vin::Vin;

pub const HONDA_VIN: &str = "1HGCM82633A004352";

// -- Camera -------------------------------------------------------------------

pub struct MockTrack {
    live: AtomicBool,
    torch: bool,
    torch_on: AtomicBool,
}

impl MockTrack {
    pub fn torch_on(&self) -> bool {
        self.torch_on.load(Ordering::SeqCst)
    }
}

impl MediaTrack for MockTrack {
    fn label(&self) -> &str {
        "mock camera"
    }
    fn kind(&self) -> TrackKind {
        TrackKind::Video
    }
    fn capabilities(&self) -> TrackCapabilities {
        TrackCapabilities { torch: self.torch }
    }
    fn apply_torch(&self, on: bool) -> Result<()> {
        self.torch_on.store(on, Ordering::SeqCst);
        Ok(())
    }
    fn stop(&self) {
        self.live.store(false, Ordering::SeqCst);
    }
    fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }
    fn grab_frame(&self) -> Option<RgbaImage> {
        Some(RgbaImage::from_pixel(64, 48, Rgba([220, 220, 220, 255])))
    }
}

/// Camera double. Remembers every request and every track it handed out.
#[derive(Default)]
pub struct MockCamera {
    pub torch: bool,
    /// Refuse requests for a specific facing.
    pub refuse_facing: bool,
    /// Refuse every request with this message.
    pub deny: Option<String>,
    /// Delay before the stream is handed out.
    pub delay: Duration,
    pub(crate) requests: Mutex<Vec<Option<CameraFacing>>>,
    pub(crate) issued: Mutex<Vec<Arc<MockTrack>>>,
}

impl MockCamera {
    pub fn requests(&self) -> Vec<Option<CameraFacing>> {
        self.requests.lock().unwrap().clone()
    }

    pub fn issued(&self) -> Vec<Arc<MockTrack>> {
        self.issued.lock().unwrap().clone()
    }

    pub fn live_tracks(&self) -> usize {
        self.issued().iter().filter(|t| t.is_live()).count()
    }
}

#[async_trait]
impl CameraProvider for MockCamera {
    async fn request_stream(&self, facing: Option<CameraFacing>) -> Result<MediaStream> {
        self.requests.lock().unwrap().push(facing);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if let Some(reason) = &self.deny {
            return Err(VinScanError::CameraUnavailable(reason.clone()));
        }
        if self.refuse_facing && facing.is_some() {
            return Err(VinScanError::CameraUnavailable("OverconstrainedError".into()));
        }
        let track = Arc::new(MockTrack {
            live: AtomicBool::new(true),
            torch: self.torch,
            torch_on: AtomicBool::new(false),
        });
        self.issued.lock().unwrap().push(track.clone());
        Ok(MediaStream::new(vec![track as Arc<dyn MediaTrack>]))
    }
}

// -- Engines ------------------------------------------------------------------

/// One scripted engine response.
#[derive(Debug, Clone)]
pub enum Step {
    Read(&'static str),
    Nothing,
    Fail,
    Hang,
}

/// Shared counters for every engine a factory produced.
#[derive(Default)]
pub struct EngineCounters {
    pub inits: AtomicUsize,
    pub calls: AtomicUsize,
    pub disposals: AtomicUsize,
    pub fail_init: AtomicBool,
}

impl EngineCounters {
    pub fn inits(&self) -> usize {
        self.inits.load(Ordering::SeqCst)
    }
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
    pub fn disposals(&self) -> usize {
        self.disposals.load(Ordering::SeqCst)
    }
}

/// A script consumed front to back; once empty, `fallback` repeats.
pub struct Script {
    steps: Mutex<VecDeque<Step>>,
    fallback: Step,
}

impl Script {
    pub fn new(steps: impl IntoIterator<Item = Step>, fallback: Step) -> Arc<Self> {
        Arc::new(Self {
            steps: Mutex::new(steps.into_iter().collect()),
            fallback,
        })
    }

    pub fn repeat(step: Step) -> Arc<Self> {
        Self::new([], step)
    }

    fn next(&self) -> Step {
        self.steps
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone())
    }
}

async fn play(step: Step) -> Result<Option<String>> {
    match step {
        Step::Read(text) => Ok(Some(text.to_string())),
        Step::Nothing => Ok(None),
        Step::Fail => Err(VinScanError::Recognition("engine hiccup".into())),
        Step::Hang => std::future::pending().await,
    }
}

pub struct ScriptedText {
    pub script: Arc<Script>,
    pub counters: Arc<EngineCounters>,
}

#[async_trait]
impl TextRecognizer for ScriptedText {
    async fn initialize(&mut self, _p: &LanguageProfile, params: &TextEngineParams) -> Result<()> {
        assert_eq!(params.segmentation, SegmentationMode::SingleLine);
        self.counters.inits.fetch_add(1, Ordering::SeqCst);
        if self.counters.fail_init.load(Ordering::SeqCst) {
            return Err(VinScanError::EngineInitializationFailed("no language data".into()));
        }
        Ok(())
    }

    async fn recognize(&mut self, _frame: &FrameSample) -> Result<TextRecognition> {
        self.counters.calls.fetch_add(1, Ordering::SeqCst);
        let text = play(self.script.next()).await?.unwrap_or_default();
        Ok(TextRecognition {
            text,
            confidence: 0.9,
        })
    }

    async fn dispose(&mut self) {
        self.counters.disposals.fetch_add(1, Ordering::SeqCst);
    }
}

pub struct ScriptedCode {
    pub script: Arc<Script>,
    pub counters: Arc<EngineCounters>,
}

#[async_trait]
impl CodeRecognizer for ScriptedCode {
    async fn initialize(&mut self, hints: &[Symbology]) -> Result<()> {
        assert!(hints.contains(&Symbology::Code39));
        self.counters.inits.fetch_add(1, Ordering::SeqCst);
        if self.counters.fail_init.load(Ordering::SeqCst) {
            return Err(VinScanError::EngineInitializationFailed("decoder".into()));
        }
        Ok(())
    }

    async fn decode_once(&mut self, _surface: &dyn RenderSurface) -> Result<Option<String>> {
        self.counters.calls.fetch_add(1, Ordering::SeqCst);
        play(self.script.next()).await
    }

    async fn reset(&mut self) {
        self.counters.disposals.fetch_add(1, Ordering::SeqCst);
    }
}

pub fn text_factory(script: Arc<Script>, counters: Arc<EngineCounters>) -> Arc<dyn TextEngineFactory> {
    Arc::new(move || {
        Box::new(ScriptedText {
            script: script.clone(),
            counters: counters.clone(),
        }) as Box<dyn TextRecognizer>
    })
}

pub fn code_factory(script: Arc<Script>, counters: Arc<EngineCounters>) -> Arc<dyn CodeEngineFactory> {
    Arc::new(move || {
        Box::new(ScriptedCode {
            script: script.clone(),
            counters: counters.clone(),
        }) as Box<dyn CodeRecognizer>
    })
}

// -- Registry -----------------------------------------------------------------

#[derive(Debug, Clone)]
pub enum RegistryMode {
    Answer(RegistryRecord),
    /// Knows exactly one VIN.
    Only(&'static str, RegistryRecord),
    Unknown,
    Fail,
    Hang,
}

pub fn honda_record() -> RegistryRecord {
    RegistryRecord {
        make: Some("HONDA".into()),
        model: Some("Accord".into()),
        year: Some(2003),
    }
}

pub struct CountingRegistry {
    pub mode: RegistryMode,
    lookups: AtomicUsize,
}

impl CountingRegistry {
    pub fn new(mode: RegistryMode) -> Arc<Self> {
        Arc::new(Self {
            mode,
            lookups: AtomicUsize::new(0),
        })
    }

    pub fn honda() -> Arc<Self> {
        Self::new(RegistryMode::Answer(honda_record()))
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VehicleRegistry for CountingRegistry {
    async fn decode(&self, vin: &Vin) -> Result<Option<RegistryRecord>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        match &self.mode {
            RegistryMode::Answer(record) => Ok(Some(record.clone())),
            RegistryMode::Only(known, record) => {
                Ok((vin.as_str() == *known).then(|| record.clone()))
            }
            RegistryMode::Unknown => Ok(None),
            RegistryMode::Fail => Err(VinScanError::Registry("HTTP 503".into())),
            RegistryMode::Hang => std::future::pending().await,
        }
    }
}

/// A complete capability bundle around the given doubles.
pub struct Rig {
    pub camera: Arc<MockCamera>,
    pub text_counters: Arc<EngineCounters>,
    pub code_counters: Arc<EngineCounters>,
    pub registry: Arc<CountingRegistry>,
    pub caps: ScanCapabilities,
}

impl Rig {
    pub fn new(
        camera: MockCamera,
        text: Arc<Script>,
        code: Arc<Script>,
        registry: Arc<CountingRegistry>,
    ) -> Self {
        let camera = Arc::new(camera);
        let text_counters = Arc::new(EngineCounters::default());
        let code_counters = Arc::new(EngineCounters::default());
        let caps = ScanCapabilities {
            camera: camera.clone(),
            vision: None,
            text_engines: text_factory(text, text_counters.clone()),
            code_engines: code_factory(code, code_counters.clone()),
            registry: registry.clone(),
        };
        Self {
            camera,
            text_counters,
            code_counters,
            registry,
            caps,
        }
    }

    /// Both engines read `text` on every call.
    pub fn reading(text: &'static str) -> Self {
        Self::new(
            MockCamera::default(),
            Script::repeat(Step::Read(text)),
            Script::repeat(Step::Read(text)),
            CountingRegistry::honda(),
        )
    }
}
