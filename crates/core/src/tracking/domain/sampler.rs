use crate::detection::domain::face_oracle::FaceOracle;
use crate::shared::frame_ref::FrameRef;
use crate::shared::video_data::VideoData;

use super::faces_positions::SampleDetections;

/// Result of one sampling pass over a video.
#[derive(Debug, Default)]
pub struct SamplingOutcome {
    pub detections: SampleDetections,
    /// Highest sample index reached, whether or not it produced data.
    pub last_sample: u32,
    /// Samples whose oracle call failed and therefore carry no data.
    pub failed_samples: Vec<u32>,
}

/// Walks the frames at a fixed stride and asks the oracle about each sample.
///
/// Single-sample dropouts are absorbed as the walk goes: a face that shows
/// up after an empty sample is copied back onto that sample, and a sample
/// that loses every face inherits the previous sample's faces.
pub struct Sampler {
    interval: u32,
}

impl Sampler {
    pub fn new(interval: u32) -> Result<Self, &'static str> {
        if interval < 1 {
            return Err("sampling interval must be >= 1");
        }
        Ok(Self { interval })
    }

    /// Sample indices visited for `total_frames`: `1, 1+I, 1+2I, ...`.
    pub fn sample_indices(&self, total_frames: u32) -> impl Iterator<Item = u32> {
        (1..=total_frames).step_by(self.interval as usize)
    }

    pub fn sample(&self, video: &VideoData, oracle: &mut dyn FaceOracle) -> SamplingOutcome {
        let mut outcome = SamplingOutcome {
            last_sample: 1,
            ..Default::default()
        };

        for i in self.sample_indices(video.total_frames) {
            outcome.last_sample = i;

            let current = match oracle.detect(&FrameRef::new(video.id.as_str(), i)) {
                Ok(faces) => faces,
                Err(e) => {
                    log::warn!("Detection failed for frame {i} of {}: {e}", video.id);
                    outcome.failed_samples.push(i);
                    continue;
                }
            };

            let detections = &mut outcome.detections;
            let previous_index = i.checked_sub(self.interval).filter(|_| i > 1);
            let previous = previous_index
                .and_then(|p| detections.get(&p))
                .cloned()
                .unwrap_or_default();

            if let Some(p) = previous_index {
                if !current.is_empty() && previous.is_empty() {
                    log::debug!("Backfilling sample {p} from sample {i}");
                    detections.insert(p, current.clone());
                }
            }

            if current.is_empty() && !previous.is_empty() {
                log::debug!("Carrying {} face(s) forward onto sample {i}", previous.len());
                detections.insert(i, previous);
            } else {
                detections.insert(i, current);
            }
        }

        outcome
    }
}
