use crate::shared::frame_ref::FrameRef;

use super::raw_detection::RawDetection;

/// Domain interface for the external face-detection capability.
///
/// Given a stored frame, returns zero or more relative bounding boxes.
/// Calls may fail individually; callers treat a failure as "no data" for
/// that frame. Implementations may hold connection state, hence `&mut self`.
pub trait FaceOracle: Send {
    fn detect(&mut self, frame: &FrameRef) -> Result<Vec<RawDetection>, Box<dyn std::error::Error>>;
}
