use serde::{Deserialize, Serialize};

/// An absolute, axis-aligned pixel rectangle inside a frame.
///
/// Regions produced by [`RegionBuilder`](crate::detection::domain::region_builder::RegionBuilder)
/// always satisfy `left + width <= frame_width` and `top + height <= frame_height`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Region {
    pub top: u32,
    pub left: u32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    pub fn new(top: u32, left: u32, width: u32, height: u32) -> Self {
        Self {
            top,
            left,
            width,
            height,
        }
    }

    pub fn right(&self) -> u32 {
        self.left + self.width
    }

    pub fn bottom(&self) -> u32 {
        self.top + self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Whether the whole rectangle lies inside a `frame_w` x `frame_h` frame.
    pub fn fits_within(&self, frame_w: u32, frame_h: u32) -> bool {
        self.right() <= frame_w && self.bottom() <= frame_h
    }

    pub fn center(&self) -> (f64, f64) {
        (
            self.left as f64 + self.width as f64 / 2.0,
            self.top as f64 + self.height as f64 / 2.0,
        )
    }

    /// Distance of the center from the frame origin, rounded to whole pixels.
    ///
    /// Collapses a 2D position onto one scalar so positions can be compared
    /// cheaply across samples.
    pub fn center_distance(&self) -> u32 {
        let (cx, cy) = self.center();
        diagonal(cx, cy)
    }
}

/// `round(sqrt(x² + y²))`.
pub fn diagonal(x: f64, y: f64) -> u32 {
    (x * x + y * y).sqrt().round() as u32
}
