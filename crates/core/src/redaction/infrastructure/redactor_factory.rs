use serde::{Deserialize, Serialize};

use crate::pipeline::config::RedactionConfig;
use crate::redaction::domain::frame_redactor::{CompositingRedactor, FrameRedactor, RegionTransform};

use super::blur_transform::GaussianBlurTransform;
use super::icon_transform::IconTransform;
use super::pixelate_transform::PixelateTransform;

/// Pixel policy applied to every redacted region.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RedactionStyle {
    #[default]
    Blur,
    Pixelate,
    Icon,
}

impl std::fmt::Display for RedactionStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RedactionStyle::Blur => write!(f, "blur"),
            RedactionStyle::Pixelate => write!(f, "pixelate"),
            RedactionStyle::Icon => write!(f, "icon"),
        }
    }
}

impl std::str::FromStr for RedactionStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "blur" => Ok(RedactionStyle::Blur),
            "pixelate" | "pixelation" => Ok(RedactionStyle::Pixelate),
            "icon" => Ok(RedactionStyle::Icon),
            other => Err(format!("Unknown redaction style: {other}")),
        }
    }
}

/// Builds the redactor described by `config`.
///
/// Fails only for the icon style, when the icon files cannot be loaded.
pub fn create_redactor(
    config: &RedactionConfig,
) -> Result<Box<dyn FrameRedactor>, Box<dyn std::error::Error>> {
    let transform: Box<dyn RegionTransform> = match config.style {
        RedactionStyle::Blur => Box::new(GaussianBlurTransform::new(
            config.blur_base_sigma,
            config.blur_sigma_per_px,
            config.corner_radius,
        )),
        RedactionStyle::Pixelate => Box::new(PixelateTransform::new(config.pixel_reduction)),
        RedactionStyle::Icon => {
            if config.icon_paths.is_empty() {
                return Err("Icon redaction requires at least one icon path".into());
            }
            Box::new(IconTransform::load(config.icon_paths.as_slice())?)
        }
    };
    log::info!("Using {} redaction", transform.name());
    Ok(Box::new(CompositingRedactor::new(transform)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::frame::Frame;
    use crate::shared::region::Region;
    use rstest::rstest;

    #[rstest]
    #[case("blur", RedactionStyle::Blur)]
    #[case("Pixelate", RedactionStyle::Pixelate)]
    #[case("pixelation", RedactionStyle::Pixelate)]
    #[case("ICON", RedactionStyle::Icon)]
    fn test_style_from_str(#[case] input: &str, #[case] expected: RedactionStyle) {
        assert_eq!(input.parse::<RedactionStyle>().unwrap(), expected);
    }

    #[test]
    fn test_unknown_style_rejected() {
        assert!("mosaic".parse::<RedactionStyle>().is_err());
    }

    #[test]
    fn test_style_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&RedactionStyle::Pixelate).unwrap(),
            "\"pixelate\""
        );
    }

    #[rstest]
    #[case(RedactionStyle::Blur)]
    #[case(RedactionStyle::Pixelate)]
    fn test_factory_redactor_changes_region(#[case] style: RedactionStyle) {
        let config = RedactionConfig {
            style,
            ..RedactionConfig::default()
        };
        let redactor = create_redactor(&config).unwrap();
        let data = (0..40 * 40)
            .flat_map(|i| if i % 2 == 0 { [255, 255, 255] } else { [0, 0, 0] })
            .collect();
        let frame = Frame::new(data, 40, 40, 3, 1);
        let out = redactor.redact(&frame, &[Region::new(5, 5, 30, 30)]);
        assert_ne!(out, frame);
    }

    #[test]
    fn test_icon_style_without_paths_fails() {
        let config = RedactionConfig {
            style: RedactionStyle::Icon,
            ..RedactionConfig::default()
        };
        assert!(create_redactor(&config).is_err());
    }
}
