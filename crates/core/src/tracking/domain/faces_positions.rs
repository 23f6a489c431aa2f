use std::collections::BTreeMap;

use crate::detection::domain::raw_detection::RawDetection;
use crate::detection::domain::region_builder::RegionBuilder;
use crate::shared::region::Region;

/// Sample index → regions to redact, for every sample that carries data.
pub type FacesPositions = BTreeMap<u32, Vec<Region>>;

/// Sample index → raw oracle output, as recorded by the sampler.
pub type SampleDetections = BTreeMap<u32, Vec<RawDetection>>;

/// Converts every non-empty sample into absolute regions.
///
/// Samples without detections get no entry at all, so the frame mapper can
/// tell "no data here" apart from "data with zero faces".
pub fn to_positions(
    detections: &SampleDetections,
    builder: &RegionBuilder,
    frame_w: u32,
    frame_h: u32,
) -> FacesPositions {
    detections
        .iter()
        .filter(|(_, faces)| !faces.is_empty())
        .map(|(&index, faces)| {
            let regions = faces
                .iter()
                .map(|f| builder.build(&f.bounding_box, frame_w, frame_h))
                .collect();
            (index, regions)
        })
        .collect()
}
