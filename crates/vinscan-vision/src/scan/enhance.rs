// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Vision preprocessing on `imageproc` — grayscale, adaptive thresholding and
// median denoise for VIN crops.

use std::sync::Arc;

use async_trait::async_trait;
use image::{DynamicImage, GrayImage, Luma};
use imageproc::filter::median_filter;
use tracing::{debug, info, instrument};
use vinscan_bridge::traits::{VisionLoader, VisionPreprocessing};
use vinscan_core::config::FrameConfig;
use vinscan_core::error::Result;

/// Enhancement operations backed by `imageproc`.
#[derive(Debug, Clone, Copy)]
pub struct ImageprocVision {
    /// Neighbourhood radius for the local mean.
    block_radius: u32,
    /// Constant subtracted from the local mean.
    offset: i32,
}

impl ImageprocVision {
    pub fn new(block_radius: u32, offset: i32) -> Self {
        Self {
            block_radius: block_radius.max(1),
            offset,
        }
    }

    pub fn from_config(config: &FrameConfig) -> Self {
        Self::new(config.threshold_radius, config.threshold_offset)
    }
}

impl Default for ImageprocVision {
    fn default() -> Self {
        Self::from_config(&FrameConfig::default())
    }
}

impl VisionPreprocessing for ImageprocVision {
    fn grayscale(&self, frame: &DynamicImage) -> GrayImage {
        frame.to_luma8()
    }

    /// Local mean thresholding: for each pixel the threshold is the mean
    /// intensity within `block_radius`, minus `offset`. Darker pixels become
    /// black, the rest white.
    #[instrument(skip_all, fields(width = frame.width(), height = frame.height()))]
    fn adaptive_threshold(&self, frame: &GrayImage) -> GrayImage {
        let (width, height) = frame.dimensions();
        let integral = compute_integral_image(frame);
        let mut output = GrayImage::new(width, height);

        for y in 0..height {
            for x in 0..width {
                let local_mean = region_mean(&integral, width, height, x, y, self.block_radius);
                let threshold = (local_mean as i32 - self.offset).clamp(0, 255) as u8;
                let value = frame.get_pixel(x, y).0[0];
                let binary = if value < threshold { 0u8 } else { 255u8 };
                output.put_pixel(x, y, Luma([binary]));
            }
        }

        debug!("Adaptive threshold complete");
        output
    }

    /// 3x3 median filter; removes salt-and-pepper specks left by
    /// thresholding without eroding glyph strokes.
    fn denoise(&self, region: &GrayImage) -> GrayImage {
        median_filter(region, 1, 1)
    }
}

/// Hands out an [`ImageprocVision`] per session.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageprocVisionLoader {
    vision: ImageprocVision,
}

impl ImageprocVisionLoader {
    pub fn new(config: &FrameConfig) -> Self {
        Self {
            vision: ImageprocVision::from_config(config),
        }
    }
}

#[async_trait]
impl VisionLoader for ImageprocVisionLoader {
    async fn load(&self) -> Result<Arc<dyn VisionPreprocessing>> {
        info!(
            block_radius = self.vision.block_radius,
            offset = self.vision.offset,
            "Vision preprocessing ready"
        );
        Ok(Arc::new(self.vision))
    }
}

// -- Helpers ------------------------------------------------------------------

/// Build a summed-area table with a zero row and column prepended.
fn compute_integral_image(gray: &GrayImage) -> Vec<u64> {
    let (w, h) = gray.dimensions();
    let stride = (w + 1) as usize;
    let mut table = vec![0u64; stride * (h + 1) as usize];

    for y in 0..h {
        let mut row_sum: u64 = 0;
        for x in 0..w {
            row_sum += gray.get_pixel(x, y).0[0] as u64;
            let idx = (y + 1) as usize * stride + (x + 1) as usize;
            let above = y as usize * stride + (x + 1) as usize;
            table[idx] = row_sum + table[above];
        }
    }

    table
}

/// Mean pixel value in the square of `radius` around (cx, cy), clamped to
/// the image.
fn region_mean(
    integral: &[u64],
    img_width: u32,
    img_height: u32,
    cx: u32,
    cy: u32,
    radius: u32,
) -> f64 {
    let stride = (img_width + 1) as usize;

    let x1 = cx.saturating_sub(radius) as usize;
    let y1 = cy.saturating_sub(radius) as usize;
    let x2 = (cx as usize + radius as usize + 1).min(img_width as usize);
    let y2 = (cy as usize + radius as usize + 1).min(img_height as usize);

    let area = ((x2 - x1) * (y2 - y1)) as f64;
    if area == 0.0 {
        return 128.0;
    }

    let sum = integral[y2 * stride + x2] as f64
        - integral[y1 * stride + x2] as f64
        - integral[y2 * stride + x1] as f64
        + integral[y1 * stride + x1] as f64;

    sum / area
}
