// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Capture device session — acquires the camera stream, attaches it to the
// render surface, and guarantees every track is stopped on the way out.
//
// `stop` is synchronous and idempotent so it can run from cancellation paths
// and `Drop`. Each `stop` bumps a generation counter; a stream whose request
// started under an older generation is stopped on arrival and never attached.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tracing::{debug, info, instrument, warn};
use vinscan_bridge::traits::{CameraProvider, MediaStream, RenderSurface};
use vinscan_core::error::{Result, VinScanError};
use vinscan_core::types::CameraFacing;

/// The live stream of one session plus what it can do.
struct CaptureHandle {
    stream: MediaStream,
    has_flash: bool,
    flash_on: bool,
}

#[derive(Default)]
struct CaptureState {
    handle: Option<CaptureHandle>,
    generation: u64,
}

/// Camera and surface lifecycle for a single scan session.
pub struct CaptureSession {
    camera: Arc<dyn CameraProvider>,
    surface: Arc<dyn RenderSurface>,
    ready_timeout: Duration,
    state: Mutex<CaptureState>,
}

impl CaptureSession {
    pub fn new(
        camera: Arc<dyn CameraProvider>,
        surface: Arc<dyn RenderSurface>,
        ready_timeout: Duration,
    ) -> Self {
        Self {
            camera,
            surface,
            ready_timeout,
            state: Mutex::new(CaptureState::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, CaptureState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn surface(&self) -> &Arc<dyn RenderSurface> {
        &self.surface
    }

    /// Acquire a stream, preferring `preferred` and falling back to any
    /// camera, then attach it and start playback.
    ///
    /// Returns whether the video track can drive a torch. Fails with
    /// `CameraUnavailable` when no camera can be opened, or `Cancelled` when
    /// [`stop`](Self::stop) ran while the request was in flight.
    #[instrument(skip(self))]
    pub async fn start(&self, preferred: CameraFacing) -> Result<bool> {
        let generation = self.state().generation;

        let stream = match self.camera.request_stream(Some(preferred)).await {
            Ok(stream) => stream,
            Err(first) => {
                warn!(error = %first, "Preferred camera unavailable, trying any camera");
                self.camera
                    .request_stream(None)
                    .await
                    .map_err(camera_unavailable)?
            }
        };

        if self.state().generation != generation {
            info!("Stream arrived after stop; releasing it");
            stream.stop_all();
            return Err(VinScanError::Cancelled);
        }

        let Some(video) = stream.video_track().cloned() else {
            stream.stop_all();
            return Err(VinScanError::CameraUnavailable(
                "stream has no video track".into(),
            ));
        };

        self.surface.attach(&stream);
        match tokio::time::timeout(self.ready_timeout, self.surface.play()).await {
            Ok(Ok(())) => debug!("Surface ready"),
            Ok(Err(e)) => warn!(error = %e, "Playback did not start cleanly; continuing"),
            Err(_) => warn!(
                timeout_ms = self.ready_timeout.as_millis() as u64,
                "Surface ready signal timed out; continuing"
            ),
        }

        let has_flash = video.capabilities().torch;
        let mut state = self.state();
        if state.generation != generation {
            drop(state);
            stream.stop_all();
            self.surface.detach();
            return Err(VinScanError::Cancelled);
        }
        if let Some(previous) = state.handle.take() {
            previous.stream.stop_all();
        }
        info!(camera = video.label(), has_flash, "Camera started");
        state.handle = Some(CaptureHandle {
            stream,
            has_flash,
            flash_on: false,
        });
        Ok(has_flash)
    }

    /// Stop every track and detach the surface. Safe to call any number of
    /// times, from any state.
    pub fn stop(&self) {
        let handle = {
            let mut state = self.state();
            state.generation += 1;
            state.handle.take()
        };
        if let Some(handle) = handle {
            handle.stream.stop_all();
            debug!("Camera stopped");
        }
        self.surface.detach();
    }

    /// Flip the torch. No-op (returning `false`) without a torch-capable
    /// track; otherwise returns the new torch state.
    pub fn toggle_flash(&self) -> Result<bool> {
        let mut state = self.state();
        let Some(handle) = state.handle.as_mut() else {
            return Ok(false);
        };
        if !handle.has_flash {
            return Ok(false);
        }
        let Some(video) = handle.stream.video_track() else {
            return Ok(false);
        };
        let target = !handle.flash_on;
        video.apply_torch(target)?;
        handle.flash_on = target;
        debug!(flash_on = target, "Torch toggled");
        Ok(target)
    }

    pub fn is_active(&self) -> bool {
        self.state().handle.is_some()
    }

    pub fn has_flash(&self) -> bool {
        self.state().handle.as_ref().is_some_and(|h| h.has_flash)
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        self.stop();
    }
}

fn camera_unavailable(err: VinScanError) -> VinScanError {
    match err {
        VinScanError::CameraUnavailable(_) | VinScanError::Cancelled => err,
        other => VinScanError::CameraUnavailable(other.to_string()),
    }
}
