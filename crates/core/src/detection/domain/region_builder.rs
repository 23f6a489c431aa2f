use crate::shared::constants::{DEFAULT_EDGE_MARGIN, DEFAULT_INFLATION};
use crate::shared::region::Region;

use super::raw_detection::RelativeBox;

/// Converts relative detector boxes into inflated, clipped pixel regions.
///
/// The box is grown around its center by `inflation`, then clipped so it
/// stays `margin` pixels inside every frame edge. Clipping keeps the far
/// edges where they were; nothing is shifted or discarded.
#[derive(Clone, Debug)]
pub struct RegionBuilder {
    inflation: f64,
    margin: u32,
}

impl RegionBuilder {
    pub fn new(inflation: f64, margin: u32) -> Self {
        Self { inflation, margin }
    }

    pub fn inflation(&self) -> f64 {
        self.inflation
    }

    pub fn margin(&self) -> u32 {
        self.margin
    }

    /// Always returns an in-bounds region; nonsensical boxes collapse to a
    /// zero-size region at the nearest valid position.
    pub fn build(&self, bbox: &RelativeBox, frame_w: u32, frame_h: u32) -> Region {
        let (left, width) = self.axis(bbox.left, bbox.width, frame_w);
        let (top, height) = self.axis(bbox.top, bbox.height, frame_h);
        Region {
            top,
            left,
            width,
            height,
        }
    }

    /// Resolves one axis: returns the clamped start and the clipped length.
    fn axis(&self, start: f64, length: f64, frame_len: u32) -> (u32, u32) {
        let frame = frame_len as f64;
        let abs_len = finite_or_zero(length).max(0.0) * frame;
        let center = finite_or_zero(start) * frame + abs_len / 2.0;
        let inflated = abs_len * self.inflation;

        let lo = self.margin as f64;
        let hi = frame_len.saturating_sub(self.margin) as f64;

        let near = (center - inflated / 2.0).floor().max(lo).min(hi);
        let far = (center + inflated / 2.0).floor().min(hi);
        let len = (far - near).max(0.0);

        (near as u32, len as u32)
    }
}

impl Default for RegionBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_INFLATION, DEFAULT_EDGE_MARGIN)
    }
}

fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() {
        v
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const FRAME_W: u32 = 1000;
    const FRAME_H: u32 = 1000;

    #[test]
    fn test_inflates_around_center() {
        let builder = RegionBuilder::new(2.0, 1);
        let r = builder.build(&RelativeBox::new(0.1, 0.1, 0.1, 0.1), FRAME_W, FRAME_H);
        assert_eq!(r, Region::new(50, 50, 200, 200));
    }

    #[test]
    fn test_inflation_one_keeps_box_size() {
        let builder = RegionBuilder::new(1.0, 1);
        let r = builder.build(&RelativeBox::new(0.2, 0.3, 0.1, 0.2), FRAME_W, FRAME_H);
        assert_eq!(r, Region::new(200, 300, 100, 200));
    }

    #[test]
    fn test_clips_at_top_left_to_margin() {
        // center (50, 50), inflated 200x200 -> starts at -50, ends at 150
        let builder = RegionBuilder::new(2.0, 2);
        let r = builder.build(&RelativeBox::new(0.0, 0.0, 0.1, 0.1), FRAME_W, FRAME_H);
        assert_eq!(r.top, 2);
        assert_eq!(r.left, 2);
        assert_eq!(r.width, 148);
        assert_eq!(r.height, 148);
    }

    #[test]
    fn test_clips_at_bottom_right_to_margin() {
        let builder = RegionBuilder::new(2.0, 1);
        let r = builder.build(&RelativeBox::new(0.9, 0.9, 0.1, 0.1), FRAME_W, FRAME_H);
        assert_eq!(r.left, 850);
        assert_eq!(r.right(), FRAME_W - 1);
        assert_eq!(r.bottom(), FRAME_H - 1);
    }

    #[test]
    fn test_non_square_frame_uses_each_axis() {
        let builder = RegionBuilder::new(1.0, 1);
        let r = builder.build(&RelativeBox::new(0.5, 0.5, 0.25, 0.25), 400, 200);
        assert_eq!(r, Region::new(100, 200, 100, 50));
    }

    #[rstest]
    #[case::nan(RelativeBox::new(f64::NAN, f64::NAN, f64::NAN, f64::NAN))]
    #[case::negative_size(RelativeBox::new(0.5, 0.5, -0.3, -0.3))]
    #[case::far_outside(RelativeBox::new(5.0, -3.0, 0.1, 0.1))]
    #[case::infinite(RelativeBox::new(0.1, 0.1, f64::INFINITY, 0.1))]
    fn test_nonsensical_boxes_stay_in_bounds(#[case] bbox: RelativeBox) {
        let builder = RegionBuilder::default();
        let r = builder.build(&bbox, 640, 480);
        assert!(r.fits_within(640, 480));
        assert!(r.left >= 1 && r.top >= 1);
    }

    #[test]
    fn test_output_always_within_frame_minus_margin() {
        let builder = RegionBuilder::new(2.2, 3);
        let steps = [0.0, 0.05, 0.3, 0.5, 0.77, 0.95, 1.0];
        for &top in &steps {
            for &left in &steps {
                for &size in &[0.0, 0.01, 0.2, 0.6, 1.0] {
                    for &(w, h) in &[(1920u32, 1080u32), (7, 9), (640, 480)] {
                        let r = builder.build(&RelativeBox::new(top, left, size, size), w, h);
                        assert!(r.right() <= w - 3, "{r:?} in {w}x{h}");
                        assert!(r.bottom() <= h - 3, "{r:?} in {w}x{h}");
                        assert!(r.left >= 3 && r.top >= 3, "{r:?} in {w}x{h}");
                    }
                }
            }
        }
    }

    #[test]
    fn test_default_inflation() {
        let builder = RegionBuilder::default();
        assert_eq!(builder.inflation(), DEFAULT_INFLATION);
        assert_eq!(builder.margin(), DEFAULT_EDGE_MARGIN);
    }
}
