// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// A camera made of still images. Each stream's video track hands out the
// loaded frames in order, looping, until it is stopped.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use image::RgbaImage;
use tracing::{debug, info};
use vinscan_bridge::traits::{
    CameraProvider, MediaStream, MediaTrack, TrackCapabilities, TrackKind,
};
use vinscan_core::error::{Result, VinScanError};
use vinscan_core::types::CameraFacing;

/// Camera provider over a fixed set of image files.
pub struct StillImageCamera {
    label: String,
    frames: Arc<Vec<RgbaImage>>,
}

impl StillImageCamera {
    /// Decode every file up front so a bad path fails before scanning starts.
    pub fn open(paths: &[PathBuf]) -> Result<Self> {
        if paths.is_empty() {
            return Err(VinScanError::CameraUnavailable("no images given".into()));
        }
        let frames = paths
            .iter()
            .map(|path| load_frame(path))
            .collect::<Result<Vec<_>>>()?;
        info!(frames = frames.len(), "Still-image camera ready");
        Ok(Self::from_frames(frames))
    }

    pub fn from_frames(frames: Vec<RgbaImage>) -> Self {
        let label = format!("still images ({})", frames.len());
        Self {
            label,
            frames: Arc::new(frames),
        }
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }
}

fn load_frame(path: &Path) -> Result<RgbaImage> {
    let img = image::open(path).map_err(|e| {
        VinScanError::ImageError(format!("failed to read {}: {}", path.display(), e))
    })?;
    debug!(path = %path.display(), width = img.width(), height = img.height(), "Frame loaded");
    Ok(img.to_rgba8())
}

#[async_trait]
impl CameraProvider for StillImageCamera {
    async fn request_stream(&self, facing: Option<CameraFacing>) -> Result<MediaStream> {
        debug!(?facing, "Still-image stream requested");
        let track = StillImageTrack {
            label: self.label.clone(),
            frames: self.frames.clone(),
            cursor: AtomicUsize::new(0),
            live: AtomicBool::new(true),
        };
        Ok(MediaStream::new(vec![Arc::new(track) as Arc<dyn MediaTrack>]))
    }
}

struct StillImageTrack {
    label: String,
    frames: Arc<Vec<RgbaImage>>,
    cursor: AtomicUsize,
    live: AtomicBool,
}

impl MediaTrack for StillImageTrack {
    fn label(&self) -> &str {
        &self.label
    }

    fn kind(&self) -> TrackKind {
        TrackKind::Video
    }

    fn capabilities(&self) -> TrackCapabilities {
        TrackCapabilities::default()
    }

    fn apply_torch(&self, _on: bool) -> Result<()> {
        Err(VinScanError::PlatformUnavailable)
    }

    fn stop(&self) {
        self.live.store(false, Ordering::SeqCst);
    }

    fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }

    fn grab_frame(&self) -> Option<RgbaImage> {
        if !self.is_live() || self.frames.is_empty() {
            return None;
        }
        let index = self.cursor.fetch_add(1, Ordering::Relaxed) % self.frames.len();
        self.frames.get(index).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn frame(shade: u8) -> RgbaImage {
        RgbaImage::from_pixel(8, 8, Rgba([shade, shade, shade, 255]))
    }

    #[tokio::test]
    async fn frames_cycle_until_stopped() {
        let camera = StillImageCamera::from_frames(vec![frame(10), frame(20)]);
        let stream = camera.request_stream(Some(CameraFacing::Environment)).await.unwrap();
        let track = stream.video_track().unwrap();

        let shades: Vec<u8> = (0..3)
            .map(|_| track.grab_frame().unwrap().get_pixel(0, 0)[0])
            .collect();
        assert_eq!(shades, vec![10, 20, 10]);
        assert!(!track.capabilities().torch);

        stream.stop_all();
        assert_eq!(stream.live_track_count(), 0);
        assert!(track.grab_frame().is_none());
    }

    #[test]
    fn open_reads_image_files() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("plate.png");
        frame(200).save(&path).unwrap();
        let camera = StillImageCamera::open(&[path]).unwrap();
        assert_eq!(camera.frame_count(), 1);
    }

    #[test]
    fn open_rejects_missing_files_and_empty_lists() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(matches!(
            StillImageCamera::open(&[tmp.path().join("nope.png")]),
            Err(VinScanError::ImageError(_))
        ));
        assert!(matches!(
            StillImageCamera::open(&[]),
            Err(VinScanError::CameraUnavailable(_))
        ));
    }
}
