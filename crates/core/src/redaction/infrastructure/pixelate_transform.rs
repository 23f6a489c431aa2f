use image::imageops::{self, FilterType};
use image::RgbImage;

use crate::redaction::domain::frame_redactor::{RedactionError, RegionTransform};
use crate::redaction::domain::patch::Patch;
use crate::shared::constants::DEFAULT_PIXEL_REDUCTION;

/// Blocky pixelation: nearest-neighbor down to `reduction` pixels wide
/// (aspect preserved), then nearest-neighbor back up to the patch size.
pub struct PixelateTransform {
    reduction: u32,
}

impl PixelateTransform {
    pub fn new(reduction: u32) -> Self {
        Self {
            reduction: reduction.max(1),
        }
    }

    /// Size of the intermediate image for a `width` x `height` patch.
    pub fn reduced_size(&self, width: u32, height: u32) -> (u32, u32) {
        let small_w = self.reduction.min(width).max(1);
        let small_h = (height as f64 * small_w as f64 / width.max(1) as f64).round() as u32;
        (small_w, small_h.max(1))
    }
}

impl Default for PixelateTransform {
    fn default() -> Self {
        Self::new(DEFAULT_PIXEL_REDUCTION)
    }
}

impl RegionTransform for PixelateTransform {
    fn name(&self) -> &'static str {
        "pixelate"
    }

    fn apply(&self, patch: Patch, _region_index: usize) -> Result<Patch, RedactionError> {
        if patch.channels() != 3 {
            return Err(RedactionError::Transform(format!(
                "pixelation needs RGB input, got {} channels",
                patch.channels()
            )));
        }
        let (w, h) = (patch.width(), patch.height());
        let img = RgbImage::from_raw(w, h, patch.into_data())
            .ok_or_else(|| RedactionError::Transform("patch buffer too small".into()))?;

        let (small_w, small_h) = self.reduced_size(w, h);
        let small = imageops::resize(&img, small_w, small_h, FilterType::Nearest);
        let blocky = imageops::resize(&small, w, h, FilterType::Nearest);
        Ok(Patch::new(blocky.into_raw(), w, h, 3))
    }
}
