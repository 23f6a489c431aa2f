use ndarray::{s, ArrayView2, ArrayView3, Axis, Zip};
use thiserror::Error;

use crate::shared::frame::Frame;
use crate::shared::region::Region;

use super::patch::Patch;

#[derive(Error, Debug, PartialEq)]
pub enum RedactionError {
    #[error("region {region:?} lies outside the {width}x{height} frame")]
    OutOfBounds {
        region: Region,
        width: u32,
        height: u32,
    },
    #[error("region {0:?} has no area")]
    EmptyRegion(Region),
    #[error("transform failed: {0}")]
    Transform(String),
}

/// Domain interface for redacting regions of a frame.
///
/// Returns a new frame; the input is never modified. Implementations must be
/// deterministic: the same frame and regions always give the same output.
/// A shard that is re-run reads back frames it already wrote, so a retry
/// applies the transform a second time on top of the first.
pub trait FrameRedactor: Send + Sync {
    fn redact(&self, frame: &Frame, regions: &[Region]) -> Frame;
}

/// A pixel policy applied to one extracted patch (blur, pixelation, icon).
///
/// `region_index` is the region's position in the frame's region list.
pub trait RegionTransform: Send + Sync {
    fn name(&self) -> &'static str;

    fn apply(&self, patch: Patch, region_index: usize) -> Result<Patch, RedactionError>;
}

/// Extracts every region from the original frame, runs it through a
/// [`RegionTransform`] and composites the results onto a copy.
///
/// Patches are always cut from the untouched input, so overlapping regions
/// never feed one transform's output into another. A region that cannot be
/// extracted or transformed is skipped with a warning and keeps its original
/// pixels.
pub struct CompositingRedactor {
    transform: Box<dyn RegionTransform>,
}

impl CompositingRedactor {
    pub fn new(transform: Box<dyn RegionTransform>) -> Self {
        Self { transform }
    }

    fn redact_region(
        &self,
        original: &Frame,
        target: &mut Frame,
        region: &Region,
        region_index: usize,
    ) -> Result<(), RedactionError> {
        let clipped = clip(region, original.width(), original.height())?;
        let patch = extract(original, &clipped);
        let transformed = self.transform.apply(patch, region_index)?;
        if !transformed.matches(clipped.width, clipped.height, original.channels()) {
            return Err(RedactionError::Transform(format!(
                "{} produced a {}x{} patch for a {}x{} region",
                self.transform.name(),
                transformed.width(),
                transformed.height(),
                clipped.width,
                clipped.height
            )));
        }
        composite(target, &clipped, &transformed)
    }
}

impl FrameRedactor for CompositingRedactor {
    fn redact(&self, frame: &Frame, regions: &[Region]) -> Frame {
        let mut out = frame.clone();
        for (i, region) in regions.iter().enumerate() {
            if let Err(e) = self.redact_region(frame, &mut out, region, i) {
                log::warn!("Skipping region {i} on frame {}: {e}", frame.index());
            }
        }
        out
    }
}

/// Trim `region` to the frame. Regions that start past the frame edge or
/// have no area are rejected.
fn clip(region: &Region, width: u32, height: u32) -> Result<Region, RedactionError> {
    if region.is_empty() {
        return Err(RedactionError::EmptyRegion(*region));
    }
    if region.left >= width || region.top >= height {
        return Err(RedactionError::OutOfBounds {
            region: *region,
            width,
            height,
        });
    }
    Ok(Region::new(
        region.top,
        region.left,
        region.width.min(width - region.left),
        region.height.min(height - region.top),
    ))
}

fn extract(frame: &Frame, region: &Region) -> Patch {
    let view = frame.as_ndarray();
    let roi = view.slice(s![
        region.top as usize..region.bottom() as usize,
        region.left as usize..region.right() as usize,
        ..
    ]);
    Patch::new(
        roi.iter().copied().collect(),
        region.width,
        region.height,
        frame.channels(),
    )
}

fn composite(frame: &mut Frame, region: &Region, patch: &Patch) -> Result<(), RedactionError> {
    let (h, w, c) = (
        region.height as usize,
        region.width as usize,
        patch.channels() as usize,
    );
    let src = ArrayView3::from_shape((h, w, c), patch.data())
        .map_err(|e| RedactionError::Transform(e.to_string()))?;

    let mut view = frame.as_ndarray_mut();
    let mut dst = view.slice_mut(s![
        region.top as usize..region.bottom() as usize,
        region.left as usize..region.right() as usize,
        ..
    ]);

    match patch.mask() {
        None => dst.assign(&src),
        Some(mask) => {
            let mask = ArrayView2::from_shape((h, w), mask)
                .map_err(|e| RedactionError::Transform(e.to_string()))?;
            Zip::from(dst.lanes_mut(Axis(2)))
                .and(src.lanes(Axis(2)))
                .and(&mask)
                .for_each(|mut d, s, &alpha| {
                    for (d, &s) in d.iter_mut().zip(s.iter()) {
                        *d = blend(*d, s, alpha);
                    }
                });
        }
    }
    Ok(())
}

fn blend(base: u8, over: u8, alpha: u8) -> u8 {
    let a = alpha as u32;
    ((over as u32 * a + base as u32 * (255 - a) + 127) / 255) as u8
}
