use std::sync::Arc;

use crate::detection::domain::face_oracle::FaceOracle;
use crate::shared::video_data::VideoData;
use crate::storage::domain::frame_storage::FrameStorage;
use crate::tracking::domain::faces_positions::to_positions;
use crate::tracking::domain::frame_dataset::FrameDataset;
use crate::tracking::domain::frame_mapper::FrameMapper;
use crate::tracking::domain::gap_filler::{FillStats, GapFiller};
use crate::tracking::domain::sampler::Sampler;

use super::config::TrackingConfig;

/// What the tracking stage did for one video.
#[derive(Clone, Debug, PartialEq)]
pub struct TrackingReport {
    pub interval: u32,
    pub samples: usize,
    pub failed_samples: Vec<u32>,
    pub fill: FillStats,
    pub frames_with_regions: usize,
}

/// Runs sampling, gap filling and frame mapping for one video, then stores
/// the resulting [`FrameDataset`] for the redaction shards.
pub struct TrackFacesUseCase {
    oracle: Box<dyn FaceOracle>,
    storage: Arc<dyn FrameStorage>,
    config: TrackingConfig,
}

impl TrackFacesUseCase {
    pub fn new(
        oracle: Box<dyn FaceOracle>,
        storage: Arc<dyn FrameStorage>,
        config: TrackingConfig,
    ) -> Self {
        Self {
            oracle,
            storage,
            config,
        }
    }

    pub fn execute(
        &mut self,
        video: &VideoData,
    ) -> Result<(FrameDataset, TrackingReport), Box<dyn std::error::Error>> {
        if !video.has_dimensions() {
            return Err(format!("Video {} has no dimensions; run the check first", video.id).into());
        }
        let (w, h) = (video.width, video.height);
        let interval = self.config.interval_for(video.fps);
        let sampler = Sampler::new(interval)?;
        let samples = sampler.sample_indices(video.total_frames).count();

        log::info!(
            "Tracking faces in {} ({} frames, {samples} samples every {interval} frames)",
            video.id,
            video.total_frames
        );
        let outcome = sampler.sample(video, self.oracle.as_mut());
        if samples > 0 && outcome.failed_samples.len() == samples {
            return Err(format!("Face detection failed for every sample of {}", video.id).into());
        }

        let mut positions = to_positions(&outcome.detections, &self.config.region_builder(), w, h);
        let filler = GapFiller::new(interval, self.config.quick_movement_threshold)?;
        let fill = filler.fill(&mut positions, outcome.last_sample, w, h);
        let mapper = FrameMapper::new(interval)?.map(video.total_frames, &positions);

        let dataset = FrameDataset::new(positions, mapper);
        dataset.store(self.storage.as_ref(), &video.id)?;

        let report = TrackingReport {
            interval,
            samples,
            failed_samples: outcome.failed_samples,
            fill,
            frames_with_regions: dataset.frames_with_regions(),
        };
        log::info!(
            "Stored frame data for {}: {} of {} frames redacted, {} failed sample(s), {:?}",
            video.id,
            report.frames_with_regions,
            video.total_frames,
            report.failed_samples.len(),
            report.fill
        );
        Ok((dataset, report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use crate::detection::domain::raw_detection::{RawDetection, RelativeBox};
    use crate::detection::infrastructure::recorded_face_oracle::RecordedFaceOracle;
    use crate::shared::frame_ref::FrameRef;
    use crate::shared::region::Region;
    use crate::storage::infrastructure::memory_frame_storage::MemoryFrameStorage;

    struct BrokenOracle;

    impl FaceOracle for BrokenOracle {
        fn detect(
            &mut self,
            _frame: &FrameRef,
        ) -> Result<Vec<RawDetection>, Box<dyn std::error::Error>> {
            Err("detector offline".into())
        }
    }

    fn face() -> RawDetection {
        RawDetection::new(RelativeBox::new(0.1, 0.1, 0.1, 0.1))
    }

    fn video(total_frames: u32, fps: u32) -> VideoData {
        VideoData {
            id: "vid".to_string(),
            filename: "vid.mp4".to_string(),
            extension: "mp4".to_string(),
            duration: total_frames as f64 / fps as f64,
            width: 1000,
            height: 1000,
            total_frames,
            fps,
            audio: false,
            storage_key: "videos/source/vid/vid.mp4".to_string(),
        }
    }

    fn recorded(entries: Vec<(u32, Vec<RawDetection>)>) -> Box<dyn FaceOracle> {
        Box::new(RecordedFaceOracle::new(Arc::new(
            entries.into_iter().collect::<HashMap<_, _>>(),
        )))
    }

    fn inflate_by_two() -> TrackingConfig {
        TrackingConfig {
            inflation: 2.0,
            ..TrackingConfig::default()
        }
    }

    #[test]
    fn test_dropout_absorbed_and_midpoint_mapping() {
        let storage = Arc::new(MemoryFrameStorage::new());
        let oracle = recorded(vec![(1, vec![face()]), (6, vec![]), (11, vec![face()])]);
        let mut use_case = TrackFacesUseCase::new(oracle, storage.clone(), inflate_by_two());

        let (dataset, report) = use_case.execute(&video(100, 10)).unwrap();

        assert_eq!(report.interval, 5);
        assert_eq!(report.samples, 20);
        assert_eq!(dataset.faces_positions()[&6].len(), 1);
        assert_eq!(dataset.mapper()[&8], 6);
        assert_eq!(dataset.mapper()[&9], 11);
        assert_eq!(
            dataset.regions_for(8).unwrap()[0],
            Region::new(50, 50, 200, 200)
        );
        assert!(storage.contains("videos/temporal/vid/faces-data.json"));
    }

    #[test]
    fn test_mapper_covers_every_frame() {
        let storage = Arc::new(MemoryFrameStorage::new());
        let oracle = recorded(vec![(1, vec![face()])]);
        let mut use_case = TrackFacesUseCase::new(oracle, storage, TrackingConfig::default());

        let (dataset, _) = use_case.execute(&video(47, 10)).unwrap();

        assert_eq!(
            dataset.mapper().keys().copied().collect::<Vec<_>>(),
            (1..=47).collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_no_faces_means_no_regions() {
        let storage = Arc::new(MemoryFrameStorage::new());
        let mut use_case =
            TrackFacesUseCase::new(recorded(vec![]), storage, TrackingConfig::default());
        let (dataset, report) = use_case.execute(&video(30, 10)).unwrap();
        assert_eq!(report.frames_with_regions, 0);
        assert!(dataset.faces_positions().is_empty());
    }

    #[test]
    fn test_stored_dataset_matches_returned() {
        let storage = Arc::new(MemoryFrameStorage::new());
        let oracle = recorded(vec![(6, vec![face()])]);
        let mut use_case = TrackFacesUseCase::new(oracle, storage.clone(), inflate_by_two());
        let (dataset, _) = use_case.execute(&video(20, 10)).unwrap();
        assert_eq!(FrameDataset::load(storage.as_ref(), "vid").unwrap(), dataset);
    }

    #[test]
    fn test_every_sample_failing_is_an_error() {
        let storage = Arc::new(MemoryFrameStorage::new());
        let mut use_case = TrackFacesUseCase::new(
            Box::new(BrokenOracle),
            storage.clone(),
            TrackingConfig::default(),
        );
        assert!(use_case.execute(&video(30, 10)).is_err());
        assert!(storage.is_empty());
    }

    #[test]
    fn test_missing_dimensions_is_an_error() {
        let storage = Arc::new(MemoryFrameStorage::new());
        let mut use_case =
            TrackFacesUseCase::new(recorded(vec![]), storage, TrackingConfig::default());
        let v = VideoData {
            width: 0,
            height: 0,
            ..video(30, 10)
        };
        assert!(use_case.execute(&v).is_err());
    }
}
