//! Deterministic storage key scheme for one video job.

const TEMPORAL_PREFIX: &str = "videos/temporal";

/// Addresses one extracted frame of one video.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FrameRef {
    pub video_id: String,
    pub index: u32,
}

impl FrameRef {
    pub fn new(video_id: impl Into<String>, index: u32) -> Self {
        Self {
            video_id: video_id.into(),
            index,
        }
    }

    pub fn key(&self) -> String {
        frame_key(&self.video_id, self.index)
    }
}

pub fn frame_key(video_id: &str, index: u32) -> String {
    format!("{TEMPORAL_PREFIX}/{video_id}/frame-{index}.png")
}

pub fn faces_data_key(video_id: &str) -> String {
    format!("{TEMPORAL_PREFIX}/{video_id}/faces-data.json")
}
