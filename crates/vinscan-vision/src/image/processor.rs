// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Frame processor — band crop and nearest-neighbour upscale for camera
// frames. Operates on in-memory images using the `image` crate.

use image::imageops::FilterType;
use image::{DynamicImage, RgbaImage};
use tracing::{debug, instrument};
use vinscan_core::config::FrameConfig;
use vinscan_core::error::{Result, VinScanError};
use vinscan_core::types::RegionBounds;

/// Compute the central band a VIN is expected in.
///
/// The band spans the full width minus `horizontal_margin` on each side and
/// the middle `band_height` of the frame. Returns `None` when the frame is too
/// small to yield a non-empty band.
pub fn vin_band(width: u32, height: u32, config: &FrameConfig) -> Option<RegionBounds> {
    let margin = config.horizontal_margin.clamp(0.0, 0.49);
    let band = config.band_height.clamp(0.0, 1.0);

    let x = (width as f32 * margin).round() as u32;
    let band_w = width.saturating_sub(2 * x);
    let band_h = (height as f32 * band).round() as u32;
    let y = height.saturating_sub(band_h) / 2;

    if band_w == 0 || band_h == 0 {
        return None;
    }
    Some(RegionBounds {
        x,
        y,
        width: band_w,
        height: band_h.min(height - y),
    })
}

/// Processing pipeline over one frame.
///
/// Each method consumes `self` and returns a new `FrameProcessor` wrapping the
/// transformed image, so steps chain:
///
/// ```ignore
/// let crop = FrameProcessor::from_rgba(frame)
///     .crop(region)?
///     .upscale(2)
///     .into_dynamic();
/// ```
pub struct FrameProcessor {
    image: DynamicImage,
}

impl FrameProcessor {
    /// Wrap a raw RGBA frame from the render surface.
    pub fn from_rgba(frame: RgbaImage) -> Self {
        Self {
            image: DynamicImage::ImageRgba8(frame),
        }
    }

    /// Wrap an already-decoded `DynamicImage`.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self { image }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn as_dynamic(&self) -> &DynamicImage {
        &self.image
    }

    pub fn into_dynamic(self) -> DynamicImage {
        self.image
    }

    /// Crop to `region`. The region must lie inside the image.
    #[instrument(skip(self), fields(x = region.x, y = region.y, w = region.width, h = region.height))]
    pub fn crop(self, region: RegionBounds) -> Result<Self> {
        let (img_w, img_h) = (self.image.width(), self.image.height());
        let fits = region.width > 0
            && region.height > 0
            && region.x.checked_add(region.width).is_some_and(|r| r <= img_w)
            && region.y.checked_add(region.height).is_some_and(|b| b <= img_h);
        if !fits {
            return Err(VinScanError::ImageError(format!(
                "crop {}x{}+{}+{} outside {}x{} frame",
                region.width, region.height, region.x, region.y, img_w, img_h
            )));
        }
        let cropped = self
            .image
            .crop_imm(region.x, region.y, region.width, region.height);
        Ok(Self { image: cropped })
    }

    /// Upscale by an integer `factor` with nearest-neighbour sampling, which
    /// keeps glyph edges hard.
    pub fn upscale(self, factor: u32) -> Self {
        if factor <= 1 {
            return self;
        }
        let (w, h) = (self.image.width(), self.image.height());
        debug!(factor, from_w = w, from_h = h, "Upscaling crop");
        let resized = self
            .image
            .resize_exact(w * factor, h * factor, FilterType::Nearest);
        Self { image: resized }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn frame(w: u32, h: u32) -> RgbaImage {
        RgbaImage::from_pixel(w, h, Rgba([200, 200, 200, 255]))
    }

    #[test]
    fn default_band_geometry() {
        let band = vin_band(1000, 1000, &FrameConfig::default()).unwrap();
        assert_eq!(band.x, 50);
        assert_eq!(band.width, 900);
        assert_eq!(band.height, 300);
        assert_eq!(band.y, 350);
    }

    #[test]
    fn tiny_frame_has_no_band() {
        assert!(vin_band(1, 1, &FrameConfig::default()).is_none());
        assert!(vin_band(0, 480, &FrameConfig::default()).is_none());
    }

    #[test]
    fn crop_then_upscale_doubles_dimensions() {
        let region = RegionBounds {
            x: 10,
            y: 20,
            width: 30,
            height: 8,
        };
        let out = FrameProcessor::from_rgba(frame(100, 50))
            .crop(region)
            .unwrap()
            .upscale(2);
        assert_eq!((out.width(), out.height()), (60, 16));
    }

    #[test]
    fn crop_outside_frame_is_rejected() {
        let region = RegionBounds {
            x: 90,
            y: 0,
            width: 20,
            height: 10,
        };
        let result = FrameProcessor::from_rgba(frame(100, 50)).crop(region);
        assert!(matches!(result, Err(VinScanError::ImageError(_))));
    }
}
