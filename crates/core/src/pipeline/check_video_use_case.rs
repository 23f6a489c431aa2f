use std::sync::Arc;

use thiserror::Error;

use crate::shared::frame_ref::frame_key;
use crate::shared::video_data::VideoData;
use crate::storage::domain::frame_storage::FrameStorage;
use crate::storage::infrastructure::png_frame_codec;

use super::config::VideoPolicy;

#[derive(Error, Debug, PartialEq)]
pub enum PolicyError {
    #[error("unsupported video extension `{0}`")]
    UnsupportedExtension(String),
    #[error("video duration {0} is not a valid length")]
    InvalidDuration(f64),
    #[error("video is {duration:.1}s long, the limit is {limit}s")]
    TooLong { duration: f64, limit: f64 },
    #[error("video is {width}x{height}, the longest side allowed is {max}")]
    TooLarge { width: u32, height: u32, max: u32 },
    #[error("video dimensions are unknown and could not be read from frame 1: {0}")]
    UnknownDimensions(String),
}

/// Validates a video against the [`VideoPolicy`] and normalizes it for the
/// later stages.
///
/// Missing dimensions are read from the first extracted frame. A frame rate
/// above the policy limit is clamped and `total_frames` recomputed, since the
/// frames are extracted at the clamped rate.
pub struct CheckVideoUseCase {
    policy: VideoPolicy,
    storage: Arc<dyn FrameStorage>,
}

impl CheckVideoUseCase {
    pub fn new(policy: VideoPolicy, storage: Arc<dyn FrameStorage>) -> Self {
        Self { policy, storage }
    }

    pub fn execute(&self, mut video: VideoData) -> Result<VideoData, PolicyError> {
        let extension = video.extension.trim_start_matches('.').to_ascii_lowercase();
        if !self.policy.extensions.iter().any(|e| e.eq_ignore_ascii_case(&extension)) {
            return Err(PolicyError::UnsupportedExtension(video.extension));
        }

        if !video.duration.is_finite() || video.duration < 0.0 {
            return Err(PolicyError::InvalidDuration(video.duration));
        }
        let limit = self.policy.max_duration_secs + self.policy.duration_tolerance_secs;
        if video.duration > limit {
            return Err(PolicyError::TooLong {
                duration: video.duration,
                limit: self.policy.max_duration_secs,
            });
        }

        if !video.has_dimensions() {
            let (width, height) = self.read_dimensions(&video.id)?;
            log::info!("Read dimensions {width}x{height} from first frame of {}", video.id);
            video.width = width;
            video.height = height;
        }

        if video.fps == 0 || video.fps > self.policy.max_fps {
            let fps = self.policy.max_fps;
            video.total_frames = video.frames_at(fps);
            log::info!(
                "Clamping {} from {} to {fps} fps ({} frames)",
                video.id,
                video.fps,
                video.total_frames
            );
            video.fps = fps;
        }

        let max = self.policy.max_dimension;
        if video.width > max || video.height > max {
            return Err(PolicyError::TooLarge {
                width: video.width,
                height: video.height,
                max,
            });
        }

        Ok(video)
    }

    fn read_dimensions(&self, video_id: &str) -> Result<(u32, u32), PolicyError> {
        let bytes = self
            .storage
            .get(&frame_key(video_id, 1))
            .map_err(|e| PolicyError::UnknownDimensions(e.to_string()))?;
        match png_frame_codec::dimensions(&bytes) {
            Ok((w, h)) if w > 0 && h > 0 => Ok((w, h)),
            Ok((w, h)) => Err(PolicyError::UnknownDimensions(format!("frame 1 is {w}x{h}"))),
            Err(e) => Err(PolicyError::UnknownDimensions(e.to_string())),
        }
    }
}
