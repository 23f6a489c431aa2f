use std::collections::BTreeMap;

use super::faces_positions::FacesPositions;

/// Frame index → sample index whose regions apply to that frame.
pub type FrameMap = BTreeMap<u32, u32>;

/// Assigns every frame to its nearest sample.
///
/// A cursor walks the samples; it advances by one interval once a frame is
/// at or past the midpoint to the next sample. When the cursor's sample
/// carries no data, the frame falls back to the sample one interval
/// earlier. That fallback may itself carry no data (or be index 0 before
/// the first sample), in which case consumers skip the frame.
pub struct FrameMapper {
    interval: u32,
}

impl FrameMapper {
    pub fn new(interval: u32) -> Result<Self, &'static str> {
        if interval < 1 {
            return Err("sampling interval must be >= 1");
        }
        Ok(Self { interval })
    }

    pub fn map(&self, total_frames: u32, positions: &FacesPositions) -> FrameMap {
        let mut mapper = FrameMap::new();
        let mut frame_with_data: u32 = 1;

        for i in 1..=total_frames {
            // i >= frame_with_data + interval / 2, kept in integers
            if 2 * i as u64 >= 2 * frame_with_data as u64 + self.interval as u64 {
                frame_with_data += self.interval;
            }

            let mapped = if positions.contains_key(&frame_with_data) {
                frame_with_data
            } else {
                frame_with_data.saturating_sub(self.interval)
            };
            mapper.insert(i, mapped);
        }

        mapper
    }
}
