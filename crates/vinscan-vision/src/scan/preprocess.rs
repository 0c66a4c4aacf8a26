// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Frame preprocessor — turns the surface's current frame into one normalized
// `FrameSample` per scan cycle.

use std::sync::Arc;

use image::DynamicImage;
use tracing::{debug, trace};
use vinscan_bridge::traits::{RenderSurface, VisionPreprocessing};
use vinscan_core::config::FrameConfig;
use vinscan_core::types::FrameSample;

use crate::image::processor::{FrameProcessor, vin_band};

/// Crops and enhances frames for the text engine.
///
/// With no vision capability the raw (optionally upscaled) crop is passed on.
#[derive(Clone)]
pub struct FramePreprocessor {
    config: FrameConfig,
    vision: Option<Arc<dyn VisionPreprocessing>>,
}

impl FramePreprocessor {
    pub fn new(config: FrameConfig, vision: Option<Arc<dyn VisionPreprocessing>>) -> Self {
        Self { config, vision }
    }

    pub fn has_vision(&self) -> bool {
        self.vision.is_some()
    }

    /// Read the surface's current frame and normalize it.
    ///
    /// Returns `None` when the surface has no frame ready or the frame is too
    /// small to crop. There is no retry here; the next cycle tries again.
    pub fn capture_frame(&self, surface: &dyn RenderSurface) -> Option<FrameSample> {
        let Some(frame) = surface.current_frame() else {
            trace!("Surface not ready");
            return None;
        };
        self.normalize(FrameProcessor::from_rgba(frame))
    }

    /// Normalize an already-captured frame.
    pub fn prepare(&self, frame: DynamicImage) -> Option<FrameSample> {
        self.normalize(FrameProcessor::from_dynamic(frame))
    }

    fn normalize(&self, frame: FrameProcessor) -> Option<FrameSample> {
        let region = vin_band(frame.width(), frame.height(), &self.config)?;
        let mut processor = frame.crop(region).ok()?;
        if self.config.upscale {
            processor = processor.upscale(2);
        }

        let image = match &self.vision {
            Some(vision) => {
                let gray = vision.grayscale(processor.as_dynamic());
                let binary = vision.adaptive_threshold(&gray);
                DynamicImage::ImageLuma8(vision.denoise(&binary))
            }
            None => processor.into_dynamic(),
        };

        debug!(
            width = image.width(),
            height = image.height(),
            enhanced = self.vision.is_some(),
            "Frame prepared"
        );
        Some(FrameSample::new(image, region))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::enhance::ImageprocVision;
    use image::{Rgba, RgbaImage};

    fn plate(w: u32, h: u32) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(w, h, Rgba([230, 230, 230, 255])))
    }

    #[test]
    fn raw_crop_without_vision() {
        let pre = FramePreprocessor::new(FrameConfig::default(), None);
        let sample = pre.prepare(plate(200, 100)).unwrap();
        assert_eq!(sample.region().width, 180);
        assert_eq!(sample.region().height, 30);
        assert_eq!(sample.image().width(), 360);
        assert!(matches!(sample.image(), DynamicImage::ImageRgba8(_)));
    }

    #[test]
    fn enhanced_crop_is_binary_luma() {
        let vision: Arc<dyn VisionPreprocessing> = Arc::new(ImageprocVision::default());
        let config = FrameConfig {
            upscale: false,
            ..Default::default()
        };
        let pre = FramePreprocessor::new(config, Some(vision));
        let sample = pre.prepare(plate(200, 100)).unwrap();
        let DynamicImage::ImageLuma8(gray) = sample.image() else {
            panic!("expected luma output");
        };
        assert!(gray.pixels().all(|p| p.0[0] == 0 || p.0[0] == 255));
        assert_eq!(gray.dimensions(), (180, 30));
    }

    /// A surface that always shows the same frame, or nothing.
    struct FixedSurface(Option<RgbaImage>);

    #[async_trait::async_trait]
    impl RenderSurface for FixedSurface {
        fn attach(&self, _stream: &vinscan_bridge::traits::MediaStream) {}
        fn detach(&self) {}
        async fn play(&self) -> vinscan_core::error::Result<()> {
            Ok(())
        }
        fn is_attached(&self) -> bool {
            self.0.is_some()
        }
        fn current_frame(&self) -> Option<RgbaImage> {
            self.0.clone()
        }
    }

    #[test]
    fn surface_frame_is_cropped_to_band() {
        let pre = FramePreprocessor::new(FrameConfig::default(), None);
        let frame = RgbaImage::from_pixel(200, 100, Rgba([230, 230, 230, 255]));
        let sample = pre.capture_frame(&FixedSurface(Some(frame))).unwrap();
        assert_eq!(sample.region().y, 35);
        assert_eq!(sample.image().height(), 60);
        assert!(pre.capture_frame(&FixedSurface(None)).is_none());
    }

    #[test]
    fn degenerate_frame_yields_nothing() {
        let pre = FramePreprocessor::new(FrameConfig::default(), None);
        assert!(pre.prepare(plate(1, 1)).is_none());
    }
}
