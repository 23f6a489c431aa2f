use std::ops::RangeInclusive;

use serde::Serialize;

/// A contiguous `[init_frame, last_frame]` range owned by one worker.
/// `index` is 1-based.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Shard {
    pub index: u32,
    pub init_frame: u32,
    pub last_frame: u32,
}

impl Shard {
    pub fn frames(&self) -> RangeInclusive<u32> {
        self.init_frame..=self.last_frame
    }

    pub fn frame_count(&self) -> u32 {
        self.last_frame - self.init_frame + 1
    }
}

/// Splits `1..=total_frames` into equal contiguous shards, folding the
/// remainder into the last one.
///
/// Asking for more shards than frames yields one single-frame shard per
/// frame. A video with no frames has no shards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShardPlan {
    total_frames: u32,
    shards: Vec<Shard>,
}

impl ShardPlan {
    pub fn new(total_frames: u32, count: u32) -> Self {
        let count = count.min(total_frames).max(1);
        let slice = total_frames / count;
        let shards = if total_frames == 0 {
            Vec::new()
        } else {
            (0..count)
                .map(|i| Shard {
                    index: i + 1,
                    init_frame: i * slice + 1,
                    last_frame: if i + 1 == count {
                        total_frames
                    } else {
                        (i + 1) * slice
                    },
                })
                .collect()
        };
        Self {
            total_frames,
            shards,
        }
    }

    pub fn total_frames(&self) -> u32 {
        self.total_frames
    }

    pub fn shards(&self) -> &[Shard] {
        &self.shards
    }

    pub fn len(&self) -> usize {
        self.shards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shards.is_empty()
    }

    /// Shard by 1-based index.
    pub fn shard(&self, index: u32) -> Option<&Shard> {
        index
            .checked_sub(1)
            .and_then(|i| self.shards.get(i as usize))
    }
}
