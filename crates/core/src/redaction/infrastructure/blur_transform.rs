use crate::redaction::domain::frame_redactor::{RedactionError, RegionTransform};
use crate::redaction::domain::patch::Patch;
use crate::shared::constants::{
    DEFAULT_BLUR_BASE_SIGMA, DEFAULT_BLUR_SIGMA_PER_PX, DEFAULT_CORNER_RADIUS,
};

use super::gaussian;

/// Gaussian blur whose strength grows with the region width, composited
/// through a rounded-rectangle mask so the patch has no hard square seam.
///
/// Sigma is `ceil(base_sigma + width * sigma_per_px)`. The corner radius is
/// capped at half the patch's shorter side, which turns small patches into
/// circles or capsules.
pub struct GaussianBlurTransform {
    base_sigma: f64,
    sigma_per_px: f64,
    corner_radius: u32,
}

impl GaussianBlurTransform {
    pub fn new(base_sigma: f64, sigma_per_px: f64, corner_radius: u32) -> Self {
        Self {
            base_sigma,
            sigma_per_px,
            corner_radius,
        }
    }

    pub fn sigma_for_width(&self, width: u32) -> f64 {
        (self.base_sigma + width as f64 * self.sigma_per_px).ceil()
    }
}

impl Default for GaussianBlurTransform {
    fn default() -> Self {
        Self::new(
            DEFAULT_BLUR_BASE_SIGMA,
            DEFAULT_BLUR_SIGMA_PER_PX,
            DEFAULT_CORNER_RADIUS,
        )
    }
}

impl RegionTransform for GaussianBlurTransform {
    fn name(&self) -> &'static str {
        "blur"
    }

    fn apply(&self, patch: Patch, _region_index: usize) -> Result<Patch, RedactionError> {
        let (w, h, c) = (patch.width(), patch.height(), patch.channels());
        let kernel_size = gaussian::kernel_size_for_sigma(self.sigma_for_width(w));
        let mut data = patch.into_data();
        gaussian::blur_patch(&mut data, w as usize, h as usize, c as usize, kernel_size);

        let blurred = Patch::new(data, w, h, c);
        match rounded_rect_mask(w, h, self.corner_radius) {
            Some(mask) => Ok(blurred.with_mask(mask)),
            None => Ok(blurred),
        }
    }
}

/// Coverage mask for a `width` x `height` rectangle with rounded corners,
/// sampled at pixel centers. `None` when the radius collapses to zero.
fn rounded_rect_mask(width: u32, height: u32, radius: u32) -> Option<Vec<u8>> {
    let r = radius.min(width / 2).min(height / 2) as f64;
    if r <= 0.0 {
        return None;
    }
    let (w, h) = (width as f64, height as f64);
    let mask = (0..height)
        .flat_map(|y| (0..width).map(move |x| (x, y)))
        .map(|(x, y)| {
            let px = x as f64 + 0.5;
            let py = y as f64 + 0.5;
            let dx = px - px.clamp(r, w - r);
            let dy = py - py.clamp(r, h - r);
            if dx * dx + dy * dy <= r * r {
                255
            } else {
                0
            }
        })
        .collect();
    Some(mask)
}
