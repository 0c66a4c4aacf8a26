// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scan session state machine and the controller callers drive it through.
//
// Each session runs as one tokio task:
//
//   Initializing  vision capability, camera, recognition engine
//   Scanning      throttled cycles: recognize, correct, validate
//   Paused        no cycles until resumed
//   CandidateFound → Closed, or Failed on a fatal error
//
// The controller talks to the task over a `watch` channel. Every suspension
// point in the task races against cancellation, and teardown (camera stopped,
// engine disposed) runs on every exit path. `cancel_session` additionally
// stops the camera synchronously, so tracks are released without waiting for
// the task to notice.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{Instrument, debug, error, info, info_span, warn};
use vinscan_bridge::traits::{RenderSurface, ScanCapabilities};
use vinscan_core::config::ScanConfig;
use vinscan_core::error::{Result, VinScanError};
use vinscan_core::types::{ScanMode, ScanState, SessionId, SessionStatus, VehicleInfo};
use vinscan_vision::FramePreprocessor;

use crate::capture::CaptureSession;
use crate::corrector::{correct_barcode_text, correct_ocr_text};
use crate::engine::RecognitionEngine;
use crate::scheduler::{Scheduler, TokioScheduler};
use crate::validator::Validator;

/// Control signal from the controller to the session task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Control {
    Run,
    Pause,
    Cancel,
}

/// Handle on a running session's outcome.
pub struct ScanTicket {
    session_id: SessionId,
    mode: ScanMode,
    outcome: oneshot::Receiver<Result<VehicleInfo>>,
}

impl ScanTicket {
    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    pub fn mode(&self) -> ScanMode {
        self.mode
    }

    /// Wait for the session to end. Resolves to `Cancelled` when the session
    /// was closed before it found a VIN.
    pub async fn outcome(self) -> Result<VehicleInfo> {
        self.outcome.await.unwrap_or(Err(VinScanError::Cancelled))
    }
}

struct ActiveSession {
    id: SessionId,
    control: watch::Sender<Control>,
    capture: Arc<CaptureSession>,
    task: JoinHandle<()>,
}

impl ActiveSession {
    /// Signal cancellation and release the camera now.
    fn cancel(&self) {
        self.control.send_replace(Control::Cancel);
        self.capture.stop();
    }
}

/// Caller-facing scanner: starts, pauses, switches and cancels sessions.
///
/// At most one session is active. Starting a new one tears the previous one
/// down completely first.
pub struct VinScanner {
    caps: ScanCapabilities,
    surface: Arc<dyn RenderSurface>,
    config: ScanConfig,
    scheduler: Arc<dyn Scheduler>,
    status: Arc<watch::Sender<SessionStatus>>,
    active: Mutex<Option<ActiveSession>>,
}

impl VinScanner {
    pub fn new(caps: ScanCapabilities, surface: Arc<dyn RenderSurface>, config: ScanConfig) -> Self {
        Self::with_scheduler(caps, surface, config, Arc::new(TokioScheduler))
    }

    pub fn with_scheduler(
        caps: ScanCapabilities,
        surface: Arc<dyn RenderSurface>,
        config: ScanConfig,
        scheduler: Arc<dyn Scheduler>,
    ) -> Self {
        let (status, _) = watch::channel(SessionStatus::default());
        Self {
            caps,
            surface,
            config,
            scheduler,
            status: Arc::new(status),
            active: Mutex::new(None),
        }
    }

    fn active(&self) -> MutexGuard<'_, Option<ActiveSession>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Subscribe to status snapshots.
    pub fn status(&self) -> watch::Receiver<SessionStatus> {
        self.status.subscribe()
    }

    pub fn current_status(&self) -> SessionStatus {
        self.status.borrow().clone()
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Start scanning in `mode`, tearing down any running session first.
    pub async fn start_session(&self, mode: ScanMode) -> ScanTicket {
        let previous = self.active().take();
        if let Some(previous) = previous {
            info!(session = %previous.id, "Tearing down previous session");
            previous.cancel();
            if let Err(e) = previous.task.await {
                warn!(error = %e, "Previous session task ended abnormally");
            }
        }

        let id = SessionId::new();
        let (control_tx, control_rx) = watch::channel(Control::Run);
        let (outcome_tx, outcome_rx) = oneshot::channel();
        let capture = Arc::new(CaptureSession::new(
            self.caps.camera.clone(),
            self.surface.clone(),
            self.config.camera_ready_timeout(),
        ));

        self.status.send_replace(SessionStatus {
            session_id: Some(id),
            state: ScanState::Initializing,
            mode: Some(mode),
            ..Default::default()
        });

        let task = SessionTask {
            id,
            mode,
            started_at: Utc::now(),
            config: self.config.clone(),
            caps: self.caps.clone(),
            capture: capture.clone(),
            scheduler: self.scheduler.clone(),
            status: self.status.clone(),
            control: control_rx,
        };
        let span = info_span!("scan_session", session = %id, %mode);
        let handle = tokio::spawn(
            async move {
                let outcome = task.run().await;
                let _ = outcome_tx.send(outcome);
            }
            .instrument(span),
        );

        *self.active() = Some(ActiveSession {
            id,
            control: control_tx,
            capture,
            task: handle,
        });
        ScanTicket {
            session_id: id,
            mode,
            outcome: outcome_rx,
        }
    }

    /// Close the running session immediately. Idempotent; does not wait for
    /// in-flight acquisitions or recognition calls.
    pub fn cancel_session(&self) {
        let Some(active) = self.active().take() else {
            return;
        };
        info!(session = %active.id, "Cancelling scan session");
        active.cancel();
        let id = active.id;
        self.status.send_if_modified(|s| {
            if s.session_id == Some(id) && !s.state.is_terminal() {
                s.state = ScanState::Closed;
                s.flash_on = false;
                true
            } else {
                false
            }
        });
    }

    /// Cancel and wait until the session task has released everything.
    pub async fn shutdown(&self) {
        let active = self.active().take();
        if let Some(active) = active {
            active.cancel();
            let _ = active.task.await;
        }
    }

    pub fn pause_session(&self) {
        if let Some(active) = self.active().as_ref() {
            active.control.send_if_modified(|c| {
                let pause = *c == Control::Run;
                if pause {
                    *c = Control::Pause;
                }
                pause
            });
        }
    }

    pub fn resume_session(&self) {
        if let Some(active) = self.active().as_ref() {
            active.control.send_if_modified(|c| {
                let resume = *c == Control::Pause;
                if resume {
                    *c = Control::Run;
                }
                resume
            });
        }
    }

    /// Flip the torch on the active session. Returns the new torch state;
    /// `false` when there is no session or no torch.
    pub fn toggle_flash(&self) -> Result<bool> {
        let (id, flash_on) = match self.active().as_ref() {
            Some(active) => (active.id, active.capture.toggle_flash()?),
            None => return Ok(false),
        };
        publish(&self.status, id, |s| s.flash_on = flash_on);
        Ok(flash_on)
    }

    /// Full teardown, then a fresh session in `mode`. The previous ticket
    /// resolves to `Cancelled`.
    pub async fn switch_mode(&self, mode: ScanMode) -> ScanTicket {
        info!(%mode, "Switching scan mode");
        self.start_session(mode).await
    }

    /// Validate a typed-in VIN through the same registry the sessions use.
    pub async fn validate_manual_entry(&self, input: &str) -> Result<VehicleInfo> {
        Validator::new(
            self.caps.registry.clone(),
            self.config.min_match_count,
            self.config.lookup_timeout(),
        )
        .validate_manual(input)
        .await
    }
}

impl Drop for VinScanner {
    fn drop(&mut self) {
        self.cancel_session();
    }
}

/// Update the status snapshot for session `id`, unless it already ended.
fn publish(status: &watch::Sender<SessionStatus>, id: SessionId, f: impl FnOnce(&mut SessionStatus)) {
    status.send_if_modified(|s| {
        if s.session_id != Some(id) || s.state.is_terminal() {
            return false;
        }
        f(s);
        true
    });
}

/// Everything one session task owns.
struct SessionTask {
    id: SessionId,
    mode: ScanMode,
    started_at: DateTime<Utc>,
    config: ScanConfig,
    caps: ScanCapabilities,
    capture: Arc<CaptureSession>,
    scheduler: Arc<dyn Scheduler>,
    status: Arc<watch::Sender<SessionStatus>>,
    control: watch::Receiver<Control>,
}

impl SessionTask {
    async fn run(mut self) -> Result<VehicleInfo> {
        info!(started_at = %self.started_at, "Scan session started");

        let outcome = self.initialize_and_scan().await;
        self.capture.stop();

        let elapsed_ms = (Utc::now() - self.started_at).num_milliseconds();
        match &outcome {
            Ok(info) => {
                info!(vin = %info.vin, enriched = info.is_enriched(), elapsed_ms, "VIN accepted");
                self.set_state(ScanState::Closed);
            }
            Err(VinScanError::Cancelled) => {
                info!(elapsed_ms, "Scan session cancelled");
                self.set_state(ScanState::Closed);
            }
            Err(e) => {
                error!(error = %e, elapsed_ms, "Scan session failed");
                self.set_state(ScanState::Failed);
            }
        }
        outcome
    }

    fn set_state(&self, state: ScanState) {
        publish(&self.status, self.id, |s| {
            s.state = state;
            if state.is_terminal() {
                s.flash_on = false;
            }
        });
    }

    async fn initialize_and_scan(&mut self) -> Result<VehicleInfo> {
        let vision = match self.caps.vision.clone() {
            Some(loader) => Some(
                self.until_cancelled(loader.load())
                    .await?
                    .map_err(|e| VinScanError::EngineInitializationFailed(format!("vision: {e}")))?,
            ),
            None => None,
        };

        let capture = self.capture.clone();
        let has_flash = self
            .until_cancelled(capture.start(self.config.preferred_facing))
            .await??;
        publish(&self.status, self.id, |s| s.has_flash = has_flash);

        let mut engine = match self.mode {
            ScanMode::Text => RecognitionEngine::text(
                self.caps.text_engines.create(),
                FramePreprocessor::new(self.config.frame.clone(), vision),
                &self.config,
            ),
            ScanMode::Code => RecognitionEngine::code(self.caps.code_engines.create(), &self.config),
        };

        let outcome = self.drive(&mut engine).await;
        engine.dispose().await;
        debug!("Recognition engine disposed");
        outcome
    }

    async fn drive(&mut self, engine: &mut RecognitionEngine) -> Result<VehicleInfo> {
        self.until_cancelled(engine.initialize()).await??;

        let mut validator = Validator::new(
            self.caps.registry.clone(),
            self.config.min_match_count,
            self.config.lookup_timeout(),
        );
        let surface = self.capture.surface().clone();
        let interval = self.config.scan_interval();
        let mut last_cycle: Option<Instant> = None;
        let mut frame_count: u64 = 0;
        self.set_state(ScanState::Scanning);

        loop {
            if self.hold_while_paused().await? {
                last_cycle = None;
            }

            if let Some(last) = last_cycle {
                let due = last + interval;
                let now = Instant::now();
                if due > now {
                    let scheduler = self.scheduler.clone();
                    self.until_cancelled(scheduler.sleep(due - now)).await?;
                    continue;
                }
            }
            last_cycle = Some(Instant::now());
            frame_count += 1;
            publish(&self.status, self.id, |s| s.frame_count = frame_count);

            let Some(result) = self.until_cancelled(engine.cycle(surface.as_ref())).await?? else {
                continue;
            };
            let candidates = match self.mode {
                ScanMode::Text => correct_ocr_text(result.text()),
                ScanMode::Code => correct_barcode_text(result.text()),
            };
            if candidates.is_empty() {
                continue;
            }
            debug!(count = candidates.len(), frame = frame_count, "Candidates found");

            if let Some(info) = self.until_cancelled(validator.evaluate(&candidates)).await? {
                self.set_state(ScanState::CandidateFound);
                return Ok(info);
            }
        }
    }

    /// Block while paused. Returns whether a pause happened, so the caller
    /// can schedule the next cycle immediately.
    async fn hold_while_paused(&mut self) -> Result<bool> {
        let mut paused = false;
        loop {
            let current = *self.control.borrow_and_update();
            match current {
                Control::Run => {
                    if paused {
                        info!("Scan session resumed");
                        self.set_state(ScanState::Scanning);
                    }
                    return Ok(paused);
                }
                Control::Cancel => return Err(VinScanError::Cancelled),
                Control::Pause if !paused => {
                    info!("Scan session paused");
                    self.set_state(ScanState::Paused);
                    paused = true;
                }
                Control::Pause => {}
            }
            if self.control.changed().await.is_err() {
                return Err(VinScanError::Cancelled);
            }
        }
    }

    /// Run `fut` unless the session is cancelled first. A result that is
    /// ready at the same moment as the cancellation is discarded.
    async fn until_cancelled<F: Future>(&mut self, fut: F) -> Result<F::Output> {
        let control = &mut self.control;
        tokio::select! {
            biased;
            _ = cancelled(control) => Err(VinScanError::Cancelled),
            out = fut => Ok(out),
        }
    }
}

/// Resolve once the controller asks for cancellation or goes away.
async fn cancelled(control: &mut watch::Receiver<Control>) {
    loop {
        if *control.borrow_and_update() == Control::Cancel {
            return;
        }
        if control.changed().await.is_err() {
            return;
        }
    }
}
