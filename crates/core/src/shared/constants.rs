/// Growth applied to a detected box around its center.
pub const DEFAULT_INFLATION: f64 = 1.8;

/// Regions never touch the frame edge; they stay this many pixels inside.
pub const DEFAULT_EDGE_MARGIN: u32 = 1;

/// Percentage points of frame diagonal above which two samples count as fast motion.
pub const DEFAULT_QUICK_MOVEMENT_THRESHOLD: u32 = 10;

/// Sampling stride is `fps / DEFAULT_INTERVAL_DIVISOR`.
pub const DEFAULT_INTERVAL_DIVISOR: u32 = 2;

pub const DEFAULT_SHARD_COUNT: u32 = 4;

/// Width in pixels a region is squeezed to before being scaled back up.
pub const DEFAULT_PIXEL_REDUCTION: u32 = 15;

pub const DEFAULT_BLUR_BASE_SIGMA: f64 = 10.0;
pub const DEFAULT_BLUR_SIGMA_PER_PX: f64 = 0.02;
pub const DEFAULT_CORNER_RADIUS: u32 = 100;

pub const MAX_DURATION_SECS: f64 = 30.0;
pub const MAX_FPS: u32 = 30;
/// Longest allowed side (HD 1920x1080).
pub const MAX_DIMENSION: u32 = 1920;

pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mkv", "mov", "webm"];
