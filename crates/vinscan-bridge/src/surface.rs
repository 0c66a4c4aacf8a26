// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// In-process render surface that reads frames straight from the attached
// video track.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use image::RgbaImage;
use tracing::debug;
use vinscan_core::error::{Result, VinScanError};

use crate::traits::{MediaStream, MediaTrack, RenderSurface};

/// A surface with no display of its own. Playback is ready as soon as a live
/// video track is attached.
#[derive(Default)]
pub struct VideoSurface {
    track: Mutex<Option<Arc<dyn MediaTrack>>>,
    ready: AtomicBool,
}

impl VideoSurface {
    pub fn new() -> Self {
        Self::default()
    }

    fn attached_track(&self) -> Option<Arc<dyn MediaTrack>> {
        self.track.lock().ok().and_then(|guard| guard.clone())
    }
}

#[async_trait]
impl RenderSurface for VideoSurface {
    fn attach(&self, stream: &MediaStream) {
        if let Ok(mut guard) = self.track.lock() {
            *guard = stream.video_track().cloned();
        }
        self.ready.store(false, Ordering::SeqCst);
    }

    fn detach(&self) {
        if let Ok(mut guard) = self.track.lock() {
            if guard.take().is_some() {
                debug!("surface detached");
            }
        }
        self.ready.store(false, Ordering::SeqCst);
    }

    async fn play(&self) -> Result<()> {
        match self.attached_track() {
            Some(track) if track.is_live() => {
                self.ready.store(true, Ordering::SeqCst);
                Ok(())
            }
            Some(_) => Err(VinScanError::CameraUnavailable("video track ended".into())),
            None => Err(VinScanError::CameraUnavailable("no video track attached".into())),
        }
    }

    fn is_attached(&self) -> bool {
        self.attached_track().is_some()
    }

    fn current_frame(&self) -> Option<RgbaImage> {
        if !self.ready.load(Ordering::SeqCst) {
            return None;
        }
        let track = self.attached_track()?;
        if !track.is_live() {
            return None;
        }
        track.grab_frame()
    }
}
