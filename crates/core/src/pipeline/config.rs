use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::detection::domain::region_builder::RegionBuilder;
use crate::redaction::infrastructure::redactor_factory::RedactionStyle;
use crate::shared::constants::{
    DEFAULT_BLUR_BASE_SIGMA, DEFAULT_BLUR_SIGMA_PER_PX, DEFAULT_CORNER_RADIUS, DEFAULT_EDGE_MARGIN,
    DEFAULT_INFLATION, DEFAULT_INTERVAL_DIVISOR, DEFAULT_PIXEL_REDUCTION,
    DEFAULT_QUICK_MOVEMENT_THRESHOLD, DEFAULT_SHARD_COUNT, MAX_DIMENSION, MAX_DURATION_SECS,
    MAX_FPS, VIDEO_EXTENSIONS,
};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read settings file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("settings file {path} is not valid: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid setting `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

/// Tuning for sampling, region geometry and gap filling.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    pub inflation: f64,
    pub edge_margin: u32,
    pub quick_movement_threshold: u32,
    pub interval_divisor: u32,
    /// Fixed sampling stride; derived from fps when absent.
    pub interval: Option<u32>,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            inflation: DEFAULT_INFLATION,
            edge_margin: DEFAULT_EDGE_MARGIN,
            quick_movement_threshold: DEFAULT_QUICK_MOVEMENT_THRESHOLD,
            interval_divisor: DEFAULT_INTERVAL_DIVISOR,
            interval: None,
        }
    }
}

impl TrackingConfig {
    /// Sampling stride for a video at `fps`: `max(1, fps / interval_divisor)`
    /// unless overridden.
    pub fn interval_for(&self, fps: u32) -> u32 {
        self.interval
            .unwrap_or_else(|| fps / self.interval_divisor.max(1))
            .max(1)
    }

    pub fn region_builder(&self) -> RegionBuilder {
        RegionBuilder::new(self.inflation, self.edge_margin)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.inflation.is_finite() || self.inflation < 1.0 {
            return Err(invalid("inflation", format!("must be >= 1, got {}", self.inflation)));
        }
        if self.interval_divisor == 0 {
            return Err(invalid("interval_divisor", "must be >= 1"));
        }
        if self.interval == Some(0) {
            return Err(invalid("interval", "must be >= 1"));
        }
        if self.quick_movement_threshold > 100 {
            return Err(invalid(
                "quick_movement_threshold",
                "is a percentage and must be <= 100",
            ));
        }
        Ok(())
    }
}

/// Which pixel policy to apply and how strongly.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RedactionConfig {
    pub style: RedactionStyle,
    pub pixel_reduction: u32,
    pub blur_base_sigma: f64,
    pub blur_sigma_per_px: f64,
    pub corner_radius: u32,
    pub icon_paths: Vec<PathBuf>,
}

impl Default for RedactionConfig {
    fn default() -> Self {
        Self {
            style: RedactionStyle::default(),
            pixel_reduction: DEFAULT_PIXEL_REDUCTION,
            blur_base_sigma: DEFAULT_BLUR_BASE_SIGMA,
            blur_sigma_per_px: DEFAULT_BLUR_SIGMA_PER_PX,
            corner_radius: DEFAULT_CORNER_RADIUS,
            icon_paths: Vec::new(),
        }
    }
}

impl RedactionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pixel_reduction == 0 {
            return Err(invalid("pixel_reduction", "must be >= 1"));
        }
        if !self.blur_base_sigma.is_finite() || self.blur_base_sigma <= 0.0 {
            return Err(invalid("blur_base_sigma", "must be > 0"));
        }
        if !self.blur_sigma_per_px.is_finite() || self.blur_sigma_per_px < 0.0 {
            return Err(invalid("blur_sigma_per_px", "must be >= 0"));
        }
        if self.style == RedactionStyle::Icon && self.icon_paths.is_empty() {
            return Err(invalid("icon_paths", "icon style needs at least one icon"));
        }
        Ok(())
    }
}

/// Limits a source video must meet before any work is done on it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoPolicy {
    pub max_duration_secs: f64,
    /// Grace added to `max_duration_secs` before a video is rejected.
    pub duration_tolerance_secs: f64,
    pub max_fps: u32,
    pub max_dimension: u32,
    pub extensions: Vec<String>,
}

impl Default for VideoPolicy {
    fn default() -> Self {
        Self {
            max_duration_secs: MAX_DURATION_SECS,
            duration_tolerance_secs: 1.0,
            max_fps: MAX_FPS,
            max_dimension: MAX_DIMENSION,
            extensions: VIDEO_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
        }
    }
}

impl VideoPolicy {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.max_duration_secs.is_finite() || self.max_duration_secs <= 0.0 {
            return Err(invalid("max_duration_secs", "must be > 0"));
        }
        if self.max_fps == 0 {
            return Err(invalid("max_fps", "must be >= 1"));
        }
        if self.max_dimension == 0 {
            return Err(invalid("max_dimension", "must be >= 1"));
        }
        Ok(())
    }
}

/// Everything a pipeline run can be tuned with, loaded from JSON.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    pub tracking: TrackingConfig,
    pub redaction: RedactionConfig,
    pub policy: VideoPolicy,
    pub shard_count: u32,
    /// Frames a single shard fetches, redacts and stores concurrently.
    pub io_concurrency: usize,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            tracking: TrackingConfig::default(),
            redaction: RedactionConfig::default(),
            policy: VideoPolicy::default(),
            shard_count: DEFAULT_SHARD_COUNT,
            io_concurrency: 1,
        }
    }
}

impl PipelineSettings {
    /// `<config dir>/faceredact/settings.json`, when the platform has one.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("faceredact").join("settings.json"))
    }

    /// Loads settings from `path`, or from [`Self::default_path`] if it
    /// exists, or falls back to defaults. An explicitly given file must exist.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let settings = match path {
            Some(p) => Self::read(p)?,
            None => match Self::default_path().filter(|p| p.is_file()) {
                Some(p) => {
                    log::debug!("Loading settings from {}", p.display());
                    Self::read(&p)?
                }
                None => Self::default(),
            },
        };
        settings.validate()?;
        Ok(settings)
    }

    fn read(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&json).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.tracking.validate()?;
        self.redaction.validate()?;
        self.policy.validate()?;
        if self.shard_count == 0 {
            return Err(invalid("shard_count", "must be >= 1"));
        }
        if self.io_concurrency == 0 {
            return Err(invalid("io_concurrency", "must be >= 1"));
        }
        Ok(())
    }
}
