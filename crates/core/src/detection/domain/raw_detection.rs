use serde::{Deserialize, Serialize};

/// A detector bounding box with every component a fraction of the frame
/// width (`left`, `width`) or height (`top`, `height`).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RelativeBox {
    pub top: f64,
    pub left: f64,
    pub width: f64,
    pub height: f64,
}

impl RelativeBox {
    pub fn new(top: f64, left: f64, width: f64, height: f64) -> Self {
        Self {
            top,
            left,
            width,
            height,
        }
    }
}

/// One face reported by the detection oracle for one sampled frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RawDetection {
    pub bounding_box: RelativeBox,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

impl RawDetection {
    pub fn new(bounding_box: RelativeBox) -> Self {
        Self {
            bounding_box,
            confidence: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_detector_style_json() {
        let json = r#"{
            "BoundingBox": {"Top": 0.1, "Left": 0.2, "Width": 0.3, "Height": 0.4},
            "Confidence": 99.5
        }"#;
        let det: RawDetection = serde_json::from_str(json).unwrap();
        assert_eq!(det.bounding_box, RelativeBox::new(0.1, 0.2, 0.3, 0.4));
        assert_eq!(det.confidence, Some(99.5));
    }

    #[test]
    fn test_confidence_is_optional() {
        let json = r#"{"BoundingBox": {"Top": 0, "Left": 0, "Width": 1, "Height": 1}}"#;
        let det: RawDetection = serde_json::from_str(json).unwrap();
        assert!(det.confidence.is_none());
    }
}
