use std::path::Path;

use image::imageops::{self, FilterType};
use image::RgbaImage;

use crate::redaction::domain::frame_redactor::{RedactionError, RegionTransform};
use crate::redaction::domain::patch::Patch;

/// Replaces each region with an icon stretched to the region's size.
///
/// Region `i` gets icon `i`, falling back to the first icon when there are
/// fewer icons than regions. The icon's alpha channel becomes the patch mask,
/// so transparent parts of the icon show the original frame.
pub struct IconTransform {
    icons: Vec<RgbaImage>,
}

impl IconTransform {
    pub fn new(icons: Vec<RgbaImage>) -> Result<Self, RedactionError> {
        if icons.is_empty() {
            return Err(RedactionError::Transform(
                "icon redaction needs at least one icon".into(),
            ));
        }
        Ok(Self { icons })
    }

    pub fn load(paths: &[impl AsRef<Path>]) -> Result<Self, Box<dyn std::error::Error>> {
        let icons = paths
            .iter()
            .map(|p| {
                image::open(p.as_ref())
                    .map(|img| img.to_rgba8())
                    .map_err(|e| format!("Failed to load icon {}: {e}", p.as_ref().display()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        log::info!("Loaded {} redaction icon(s)", icons.len());
        Ok(Self::new(icons)?)
    }

    pub fn icon_count(&self) -> usize {
        self.icons.len()
    }
}

impl RegionTransform for IconTransform {
    fn name(&self) -> &'static str {
        "icon"
    }

    fn apply(&self, patch: Patch, region_index: usize) -> Result<Patch, RedactionError> {
        if patch.channels() != 3 {
            return Err(RedactionError::Transform(format!(
                "icon overlay needs RGB input, got {} channels",
                patch.channels()
            )));
        }
        let icon = self
            .icons
            .get(region_index)
            .or_else(|| self.icons.first())
            .ok_or_else(|| RedactionError::Transform("no icon available".into()))?;

        let (w, h) = (patch.width(), patch.height());
        let resized = imageops::resize(icon, w, h, FilterType::Triangle);

        let mut rgb = Vec::with_capacity(patch.pixel_count() * 3);
        let mut alpha = Vec::with_capacity(patch.pixel_count());
        for px in resized.pixels() {
            rgb.extend_from_slice(&px.0[..3]);
            alpha.push(px.0[3]);
        }
        Ok(Patch::new(rgb, w, h, 3).with_mask(alpha))
    }
}
