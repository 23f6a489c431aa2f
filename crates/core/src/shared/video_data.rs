use serde::{Deserialize, Serialize};

/// One video job, passed by value through every pipeline stage.
///
/// `width` and `height` are both zero while the dimensions are still
/// pending recomputation; see [`VideoData::has_dimensions`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoData {
    pub id: String,
    pub filename: String,
    pub extension: String,
    /// Duration in seconds.
    pub duration: f64,
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
    pub total_frames: u32,
    pub fps: u32,
    #[serde(default)]
    pub audio: bool,
    /// Storage key of the current working copy of the video.
    pub storage_key: String,
}

impl VideoData {
    pub fn has_dimensions(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    /// Frame count derived from duration at the given rate, rounded up.
    pub fn frames_at(&self, fps: u32) -> u32 {
        (self.duration * fps as f64).ceil() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn video() -> VideoData {
        VideoData {
            id: "abc".to_string(),
            filename: "abc.mp4".to_string(),
            extension: "mp4".to_string(),
            duration: 10.0,
            width: 1280,
            height: 720,
            total_frames: 300,
            fps: 30,
            audio: true,
            storage_key: "videos/source/abc/abc.mp4".to_string(),
        }
    }

    #[test]
    fn test_has_dimensions() {
        let mut v = video();
        assert!(v.has_dimensions());
        v.width = 0;
        v.height = 0;
        assert!(!v.has_dimensions());
    }

    #[test]
    fn test_frames_at_rounds_up() {
        let mut v = video();
        v.duration = 10.01;
        assert_eq!(v.frames_at(30), 301);
    }

    #[test]
    fn test_json_uses_camel_case() {
        let json = serde_json::to_value(video()).unwrap();
        assert_eq!(json["totalFrames"], 300);
        assert_eq!(json["storageKey"], "videos/source/abc/abc.mp4");
    }

    #[test]
    fn test_missing_dimensions_default_to_pending() {
        let json = r#"{
            "id": "x", "filename": "x.mov", "extension": "mov",
            "duration": 2.0, "totalFrames": 60, "fps": 30,
            "storageKey": "videos/source/x/x.mov"
        }"#;
        let v: VideoData = serde_json::from_str(json).unwrap();
        assert!(!v.has_dimensions());
        assert!(!v.audio);
    }
}
