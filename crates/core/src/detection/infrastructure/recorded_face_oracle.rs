use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use crate::detection::domain::face_oracle::FaceOracle;
use crate::detection::domain::raw_detection::RawDetection;
use crate::shared::frame_ref::FrameRef;

/// Replays pre-computed detection results by frame index.
///
/// Used when detections were captured earlier (or produced by a separate
/// tool) so tracking can run offline. The file holds `[index, detections]`
/// pairs, matching the pair-list layout of the frame dataset. Frames with no
/// entry report no faces.
pub struct RecordedFaceOracle {
    recorded: Arc<HashMap<u32, Vec<RawDetection>>>,
}

impl RecordedFaceOracle {
    pub fn new(recorded: Arc<HashMap<u32, Vec<RawDetection>>>) -> Self {
        Self { recorded }
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let pairs: Vec<(u32, Vec<RawDetection>)> = serde_json::from_str(json)?;
        Ok(Self::new(Arc::new(pairs.into_iter().collect())))
    }

    pub fn load(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| format!("cannot read detections {}: {e}", path.display()))?;
        Ok(Self::from_json(&json)?)
    }

    pub fn len(&self) -> usize {
        self.recorded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recorded.is_empty()
    }
}

impl FaceOracle for RecordedFaceOracle {
    fn detect(
        &mut self,
        frame: &FrameRef,
    ) -> Result<Vec<RawDetection>, Box<dyn std::error::Error>> {
        Ok(self.recorded.get(&frame.index).cloned().unwrap_or_default())
    }
}
