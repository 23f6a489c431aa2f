use std::collections::VecDeque;

use crate::shared::region::{diagonal, Region};

use super::faces_positions::FacesPositions;

/// Counters describing what one smoothing pass changed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FillStats {
    pub improved_current: usize,
    pub improved_previous: usize,
    pub quick_movements: usize,
}

/// Shares regions between neighbouring samples after sampling.
///
/// Every rule only ever adds regions: a missed face costs more than a
/// redacted patch of background.
///
/// Samples holding regions are visited in ascending order, skipping the
/// first sample and the last one reached. For each visited sample `k`:
/// 1. if `k` has fewer regions than `k + I`, the later regions are appended
///    to `k`;
/// 2. if `k` now has more regions than `k - I`, or the two samples differ by
///    a quick movement, the regions of `k` are appended to `k - I`. When
///    `k - I` had no regions before, it is queued and visited in turn, so a
///    late face walks back through a run of empty samples.
pub struct GapFiller {
    interval: u32,
    quick_movement_threshold: u32,
}

impl GapFiller {
    pub fn new(interval: u32, quick_movement_threshold: u32) -> Result<Self, &'static str> {
        if interval < 1 {
            return Err("sampling interval must be >= 1");
        }
        Ok(Self {
            interval,
            quick_movement_threshold,
        })
    }

    pub fn fill(
        &self,
        positions: &mut FacesPositions,
        last_sample: u32,
        frame_w: u32,
        frame_h: u32,
    ) -> FillStats {
        let mut stats = FillStats::default();
        let max_vector = diagonal(frame_w as f64, frame_h as f64);
        let mut pending: VecDeque<u32> = positions
            .iter()
            .filter(|(_, regions)| !regions.is_empty())
            .map(|(&k, _)| k)
            .collect();

        while let Some(k) = pending.pop_front() {
            if k <= self.interval || k >= last_sample {
                continue;
            }
            let previous = k - self.interval;
            let before = positions.get(&previous).cloned().unwrap_or_default();
            let after = positions.get(&(k + self.interval)).cloned().unwrap_or_default();
            let mut current = positions.get(&k).cloned().unwrap_or_default();

            if current.len() < after.len() {
                log::debug!("Improving sample {k} with {} later region(s)", after.len());
                current.extend_from_slice(&after);
                positions.insert(k, current.clone());
                stats.improved_current += 1;
            }

            let grew = current.len() > before.len();
            let quick = !grew && self.is_quick_movement(&before, &current, max_vector);
            if quick {
                log::debug!("Quick movement between samples {previous} and {k}");
                stats.quick_movements += 1;
            }

            if (grew || quick) && !current.is_empty() {
                log::debug!("Improving sample {previous} from sample {k}");
                if before.is_empty() {
                    pending.push_back(previous);
                }
                let mut merged = before;
                merged.extend_from_slice(&current);
                positions.insert(previous, merged);
                stats.improved_previous += 1;
            }
        }

        stats
    }

    /// Compares where faces sit in two samples.
    ///
    /// Each region center is reduced to its distance from the frame origin,
    /// expressed as a percentage of the frame diagonal. The samples differ by
    /// a quick movement when their closest or their farthest percentages are
    /// more than the threshold apart. One side empty and the other not also
    /// counts; two empty sides do not.
    pub fn is_quick_movement(
        &self,
        before: &[Region],
        current: &[Region],
        max_vector: u32,
    ) -> bool {
        match (spread(before, max_vector), spread(current, max_vector)) {
            (Some((b_min, b_max)), Some((c_min, c_max))) => {
                b_min.abs_diff(c_min) > self.quick_movement_threshold
                    || b_max.abs_diff(c_max) > self.quick_movement_threshold
            }
            (None, None) => false,
            _ => true,
        }
    }
}

/// `(min, max)` of region-center distances as whole percentages of `max_vector`.
fn spread(regions: &[Region], max_vector: u32) -> Option<(u32, u32)> {
    if max_vector == 0 {
        return None;
    }
    let percentages = regions
        .iter()
        .map(|r| (r.center_distance() as f64 * 100.0 / max_vector as f64).round() as u32);
    percentages.fold(None, |acc, p| match acc {
        None => Some((p, p)),
        Some((lo, hi)) => Some((lo.min(p), hi.max(p))),
    })
}
