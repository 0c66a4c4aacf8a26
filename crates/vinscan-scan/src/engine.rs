// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Recognition engine adapter — one interface over the text (OCR) and code
// (barcode) engines, with per-call timeouts and an error budget.
//
// A failing engine is not hammered forever. After `max_consecutive_errors`
// failures in a row it is torn down and initialized again; once the restart
// allowance is spent, the next run of failures ends the session.

use std::time::Duration;

use tracing::{debug, info, instrument, warn};
use vinscan_bridge::traits::{
    CodeRecognizer, LanguageProfile, RenderSurface, TextEngineParams, TextRecognizer,
};
use vinscan_core::config::ScanConfig;
use vinscan_core::error::{Result, VinScanError};
use vinscan_core::types::{RecognitionResult, ScanMode, VIN_SYMBOLOGIES};
use vinscan_vision::FramePreprocessor;

/// What the budget says after a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BudgetVerdict {
    /// Keep going with the same engine.
    Continue,
    /// Tear the engine down and initialize it again.
    Restart,
    /// No restarts left; the failure is fatal.
    Exhausted,
}

/// Consecutive-failure tracking for one engine.
#[derive(Debug, Clone)]
pub struct ErrorBudget {
    consecutive_failures: u32,
    restarts: u32,
    max_consecutive: u32,
    max_restarts: u32,
}

impl ErrorBudget {
    pub fn new(max_consecutive: u32, max_restarts: u32) -> Self {
        Self {
            consecutive_failures: 0,
            restarts: 0,
            max_consecutive: max_consecutive.max(1),
            max_restarts,
        }
    }

    pub fn record_success(&mut self) {
        if self.consecutive_failures > 0 {
            debug!(
                previous_failures = self.consecutive_failures,
                "Engine recovered"
            );
        }
        self.consecutive_failures = 0;
    }

    pub fn record_failure(&mut self) -> BudgetVerdict {
        self.consecutive_failures += 1;
        if self.consecutive_failures < self.max_consecutive {
            BudgetVerdict::Continue
        } else if self.restarts < self.max_restarts {
            BudgetVerdict::Restart
        } else {
            BudgetVerdict::Exhausted
        }
    }

    pub fn record_restart(&mut self) {
        self.restarts += 1;
        self.consecutive_failures = 0;
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub fn restarts(&self) -> u32 {
        self.restarts
    }
}

enum EngineKind {
    Text {
        engine: Box<dyn TextRecognizer>,
        preprocessor: FramePreprocessor,
        profile: LanguageProfile,
        params: TextEngineParams,
    },
    Code {
        engine: Box<dyn CodeRecognizer>,
    },
}

/// The session's recognition engine.
pub struct RecognitionEngine {
    kind: EngineKind,
    recognition_timeout: Duration,
    init_timeout: Duration,
    budget: ErrorBudget,
}

impl RecognitionEngine {
    pub fn text(
        engine: Box<dyn TextRecognizer>,
        preprocessor: FramePreprocessor,
        config: &ScanConfig,
    ) -> Self {
        Self::with_kind(
            EngineKind::Text {
                engine,
                preprocessor,
                profile: LanguageProfile::default(),
                params: TextEngineParams::vin(),
            },
            config,
        )
    }

    pub fn code(engine: Box<dyn CodeRecognizer>, config: &ScanConfig) -> Self {
        Self::with_kind(EngineKind::Code { engine }, config)
    }

    fn with_kind(kind: EngineKind, config: &ScanConfig) -> Self {
        Self {
            kind,
            recognition_timeout: config.recognition_timeout(),
            init_timeout: config.engine_init_timeout(),
            budget: ErrorBudget::new(config.max_consecutive_errors, config.max_engine_restarts),
        }
    }

    pub fn mode(&self) -> ScanMode {
        match self.kind {
            EngineKind::Text { .. } => ScanMode::Text,
            EngineKind::Code { .. } => ScanMode::Code,
        }
    }

    pub fn budget(&self) -> &ErrorBudget {
        &self.budget
    }

    /// Initialize the engine, bounded by the init timeout.
    #[instrument(skip(self), fields(mode = %self.mode()))]
    pub async fn initialize(&mut self) -> Result<()> {
        let init_timeout = self.init_timeout;
        let init = async {
            match &mut self.kind {
                EngineKind::Text {
                    engine,
                    profile,
                    params,
                    ..
                } => engine.initialize(profile, params).await,
                EngineKind::Code { engine } => engine.initialize(&VIN_SYMBOLOGIES).await,
            }
        };
        tokio::time::timeout(init_timeout, init)
            .await
            .map_err(|_| {
                VinScanError::EngineInitializationFailed(format!(
                    "engine did not initialize within {}ms",
                    init_timeout.as_millis()
                ))
            })?
            .map_err(|e| match e {
                VinScanError::EngineInitializationFailed(_) => e,
                other => VinScanError::EngineInitializationFailed(other.to_string()),
            })?;
        info!("Recognition engine ready");
        Ok(())
    }

    /// Run one recognition call against the surface.
    ///
    /// `Ok(None)` covers "no frame ready" and "nothing recognized". Errors and
    /// timeouts are charged to the budget and absorbed until it runs out.
    pub async fn cycle(&mut self, surface: &dyn RenderSurface) -> Result<Option<RecognitionResult>> {
        match self.recognize_once(surface).await {
            Ok(result) => Ok(result),
            Err(err) => {
                let verdict = self.budget.record_failure();
                warn!(
                    error = %err,
                    consecutive = self.budget.consecutive_failures(),
                    ?verdict,
                    "Recognition cycle failed"
                );
                match verdict {
                    BudgetVerdict::Continue => Ok(None),
                    BudgetVerdict::Restart => {
                        self.restart().await?;
                        Ok(None)
                    }
                    BudgetVerdict::Exhausted => Err(VinScanError::RecognitionEngineFailure(
                        format!(
                            "{} consecutive failures after {} restart(s); last: {}",
                            self.budget.consecutive_failures(),
                            self.budget.restarts(),
                            err
                        ),
                    )),
                }
            }
        }
    }

    async fn recognize_once(
        &mut self,
        surface: &dyn RenderSurface,
    ) -> Result<Option<RecognitionResult>> {
        let limit = self.recognition_timeout;
        match &mut self.kind {
            EngineKind::Text {
                engine,
                preprocessor,
                ..
            } => {
                let Some(frame) = preprocessor.capture_frame(surface) else {
                    return Ok(None);
                };
                let read = tokio::time::timeout(limit, engine.recognize(&frame))
                    .await
                    .map_err(|_| VinScanError::RecognitionTimeout(limit))?
                    .map_err(as_recognition_error)?;
                self.budget.record_success();
                debug!(text = %read.text, confidence = read.confidence, "Text recognized");
                Ok(Some(RecognitionResult::Text {
                    raw_text: read.text,
                    confidence: read.confidence,
                }))
            }
            EngineKind::Code { engine } => {
                let decoded = tokio::time::timeout(limit, engine.decode_once(surface))
                    .await
                    .map_err(|_| VinScanError::RecognitionTimeout(limit))?
                    .map_err(as_recognition_error)?;
                self.budget.record_success();
                Ok(decoded.map(|decoded_text| {
                    debug!(text = %decoded_text, "Code decoded");
                    RecognitionResult::Code { decoded_text }
                }))
            }
        }
    }

    async fn restart(&mut self) -> Result<()> {
        info!(restarts = self.budget.restarts() + 1, "Restarting recognition engine");
        self.dispose().await;
        self.initialize().await.map_err(|e| {
            VinScanError::RecognitionEngineFailure(format!("engine restart failed: {e}"))
        })?;
        self.budget.record_restart();
        Ok(())
    }

    /// Release the engine. Safe on an engine that never initialized.
    pub async fn dispose(&mut self) {
        match &mut self.kind {
            EngineKind::Text { engine, .. } => engine.dispose().await,
            EngineKind::Code { engine } => engine.reset().await,
        }
    }
}

fn as_recognition_error(err: VinScanError) -> VinScanError {
    match err {
        VinScanError::Recognition(_) | VinScanError::RecognitionTimeout(_) => err,
        other => VinScanError::Recognition(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{EngineCounters, MockCamera, Script, ScriptedCode, ScriptedText, Step};
    use std::sync::Arc;
    use std::sync::atomic::Ordering;
    use vinscan_bridge::VideoSurface;
    use vinscan_core::config::FrameConfig;
    use vinscan_core::types::CameraFacing;

    use crate::capture::CaptureSession;

    fn config() -> ScanConfig {
        ScanConfig {
            max_consecutive_errors: 3,
            max_engine_restarts: 1,
            ..Default::default()
        }
    }

    fn text_engine(script: Arc<Script>, counters: Arc<EngineCounters>) -> RecognitionEngine {
        RecognitionEngine::text(
            Box::new(ScriptedText { script, counters }),
            FramePreprocessor::new(FrameConfig::default(), None),
            &config(),
        )
    }

    async fn live_surface() -> (CaptureSession, Arc<MockCamera>) {
        let camera = Arc::new(MockCamera::default());
        let capture = CaptureSession::new(
            camera.clone(),
            Arc::new(VideoSurface::new()),
            Duration::from_secs(1),
        );
        capture.start(CameraFacing::Environment).await.unwrap();
        (capture, camera)
    }

    #[test]
    fn budget_restarts_then_exhausts() {
        let mut budget = ErrorBudget::new(2, 1);
        assert_eq!(budget.record_failure(), BudgetVerdict::Continue);
        assert_eq!(budget.record_failure(), BudgetVerdict::Restart);
        budget.record_restart();
        assert_eq!(budget.record_failure(), BudgetVerdict::Continue);
        assert_eq!(budget.record_failure(), BudgetVerdict::Exhausted);
    }

    #[test]
    fn success_resets_consecutive_count() {
        let mut budget = ErrorBudget::new(2, 0);
        budget.record_failure();
        budget.record_success();
        assert_eq!(budget.record_failure(), BudgetVerdict::Continue);
    }

    #[tokio::test]
    async fn text_cycle_reads_cropped_frame() {
        let (capture, _camera) = live_surface().await;
        let counters = Arc::new(EngineCounters::default());
        let mut engine = text_engine(Script::repeat(Step::Read("1HGCM82633A004352")), counters);
        engine.initialize().await.unwrap();

        let result = engine.cycle(capture.surface().as_ref()).await.unwrap();
        assert_eq!(result.unwrap().text(), "1HGCM82633A004352");
    }

    #[tokio::test]
    async fn failed_init_is_engine_initialization_error() {
        let counters = Arc::new(EngineCounters::default());
        counters.fail_init.store(true, Ordering::SeqCst);
        let mut engine = text_engine(Script::repeat(Step::Nothing), counters);
        assert!(matches!(
            engine.initialize().await,
            Err(VinScanError::EngineInitializationFailed(_))
        ));
    }

    #[tokio::test]
    async fn repeated_failures_restart_once_then_fail() {
        let (capture, _camera) = live_surface().await;
        let counters = Arc::new(EngineCounters::default());
        let mut engine = text_engine(Script::repeat(Step::Fail), counters.clone());
        engine.initialize().await.unwrap();
        let surface = capture.surface().clone();

        // Three failures trigger the restart, three more exhaust the budget.
        for _ in 0..5 {
            assert!(engine.cycle(surface.as_ref()).await.unwrap().is_none());
        }
        assert_eq!(counters.inits(), 2);
        assert_eq!(counters.disposals(), 1);

        let err = engine.cycle(surface.as_ref()).await.unwrap_err();
        assert!(matches!(err, VinScanError::RecognitionEngineFailure(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn timeouts_count_toward_budget() {
        let (capture, _camera) = live_surface().await;
        let counters = Arc::new(EngineCounters::default());
        let mut engine = RecognitionEngine::code(
            Box::new(ScriptedCode {
                script: Script::repeat(Step::Hang),
                counters: counters.clone(),
            }),
            &ScanConfig {
                max_consecutive_errors: 2,
                max_engine_restarts: 0,
                ..Default::default()
            },
        );
        engine.initialize().await.unwrap();
        let surface = capture.surface().clone();

        assert!(engine.cycle(surface.as_ref()).await.unwrap().is_none());
        assert_eq!(engine.budget().consecutive_failures(), 1);
        assert!(matches!(
            engine.cycle(surface.as_ref()).await,
            Err(VinScanError::RecognitionEngineFailure(_))
        ));
    }

    #[tokio::test]
    async fn no_frame_is_not_a_failure() {
        let counters = Arc::new(EngineCounters::default());
        let mut engine = text_engine(Script::repeat(Step::Fail), counters.clone());
        engine.initialize().await.unwrap();
        let detached = VideoSurface::new();
        assert!(engine.cycle(&detached).await.unwrap().is_none());
        assert_eq!(counters.calls(), 0);
        assert_eq!(engine.budget().consecutive_failures(), 0);
    }
}
