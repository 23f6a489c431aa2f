use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;

use crate::redaction::domain::frame_redactor::FrameRedactor;
use crate::shared::frame_ref::frame_key;
use crate::shared::region::Region;
use crate::shared::video_data::VideoData;
use crate::storage::domain::frame_storage::FrameStorage;
use crate::storage::infrastructure::png_frame_codec;
use crate::tracking::domain::frame_dataset::FrameDataset;

use super::pipeline_logger::{NullPipelineLogger, PipelineLogger};
use super::shard_plan::Shard;

type SendError = Box<dyn std::error::Error + Send + Sync>;

/// Outcome counts for one shard. Failed frames keep their original pixels
/// and are not a shard failure.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ShardReport {
    pub shard: u32,
    pub redacted: usize,
    /// Frames with no regions assigned; never fetched.
    pub skipped: usize,
    pub failed: usize,
    pub cancelled: bool,
}

struct FrameTimings {
    fetch_ms: f64,
    redact_ms: f64,
    store_ms: f64,
    regions: usize,
}

/// One redaction worker: fetches, redacts and stores every frame of its
/// shard that has regions assigned.
///
/// With `io_concurrency == 1` frames are processed one at a time in order.
/// Higher values dispatch frames over a bounded channel to that many scoped
/// threads. Each frame is still handled independently, so ordering between
/// frames does not matter. The cancel flag is checked before every frame.
pub struct RedactShardUseCase {
    storage: Arc<dyn FrameStorage>,
    redactor: Arc<dyn FrameRedactor>,
    io_concurrency: usize,
    cancelled: Arc<AtomicBool>,
    logger: Box<dyn PipelineLogger>,
}

impl RedactShardUseCase {
    pub fn new(
        storage: Arc<dyn FrameStorage>,
        redactor: Arc<dyn FrameRedactor>,
        io_concurrency: usize,
        cancelled: Option<Arc<AtomicBool>>,
        logger: Option<Box<dyn PipelineLogger>>,
    ) -> Self {
        Self {
            storage,
            redactor,
            io_concurrency: io_concurrency.max(1),
            cancelled: cancelled.unwrap_or_else(|| Arc::new(AtomicBool::new(false))),
            logger: logger.unwrap_or_else(|| Box::new(NullPipelineLogger)),
        }
    }

    /// Loads the video's frame dataset from storage and redacts `shard`.
    /// An unreadable dataset fails the shard.
    pub fn execute(
        &mut self,
        video: &VideoData,
        shard: &Shard,
    ) -> Result<ShardReport, Box<dyn std::error::Error>> {
        let dataset = FrameDataset::load(self.storage.as_ref(), &video.id)?;
        self.execute_with(video, &dataset, shard)
    }

    pub fn execute_with(
        &mut self,
        video: &VideoData,
        dataset: &FrameDataset,
        shard: &Shard,
    ) -> Result<ShardReport, Box<dyn std::error::Error>> {
        if shard.init_frame == 0
            || shard.init_frame > shard.last_frame
            || shard.last_frame > video.total_frames
        {
            return Err(format!(
                "Shard {} ({}..={}) is outside the {} frames of {}",
                shard.index, shard.init_frame, shard.last_frame, video.total_frames, video.id
            )
            .into());
        }

        let mut report = ShardReport {
            shard: shard.index,
            ..Default::default()
        };
        let mut jobs: Vec<(u32, &[Region])> = Vec::new();
        for index in shard.frames() {
            match dataset.regions_for(index) {
                Some(regions) => jobs.push((index, regions)),
                None => report.skipped += 1,
            }
        }
        self.logger.info(&format!(
            "frames {}..={} of {}: {} to redact, {} without faces",
            shard.init_frame,
            shard.last_frame,
            video.id,
            jobs.len(),
            report.skipped
        ));

        let total = shard.frame_count() as usize;
        if self.io_concurrency == 1 {
            self.run_sequential(&video.id, jobs, total, &mut report);
        } else {
            self.run_concurrent(&video.id, jobs, total, &mut report)?;
        }

        if report.cancelled {
            self.logger.info("cancelled");
        }
        self.logger.summary();
        log::info!(
            "Shard {} of {} done: {} redacted, {} skipped, {} failed",
            report.shard,
            video.id,
            report.redacted,
            report.skipped,
            report.failed
        );
        Ok(report)
    }

    fn run_sequential(
        &mut self,
        video_id: &str,
        jobs: Vec<(u32, &[Region])>,
        total: usize,
        report: &mut ShardReport,
    ) {
        for (index, regions) in jobs {
            if self.cancelled.load(Ordering::Relaxed) {
                report.cancelled = true;
                break;
            }
            let result = redact_frame(
                self.storage.as_ref(),
                self.redactor.as_ref(),
                video_id,
                index,
                regions,
            );
            record(self.logger.as_mut(), report, video_id, index, result);
            self.logger.progress(report_done(report), total);
        }
    }

    fn run_concurrent(
        &mut self,
        video_id: &str,
        jobs: Vec<(u32, &[Region])>,
        total: usize,
        report: &mut ShardReport,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let storage = self.storage.as_ref();
        let redactor = self.redactor.as_ref();
        let cancelled = self.cancelled.as_ref();
        let logger = self.logger.as_mut();
        let workers = self.io_concurrency;

        let (job_tx, job_rx) = crossbeam_channel::bounded::<(u32, &[Region])>(workers);
        let (result_tx, result_rx) =
            crossbeam_channel::bounded::<(u32, Result<FrameTimings, SendError>)>(workers);

        let panicked = std::thread::scope(|scope| {
            let feeder = scope.spawn(move || {
                for job in jobs {
                    if cancelled.load(Ordering::Relaxed) || job_tx.send(job).is_err() {
                        break;
                    }
                }
            });

            let handles: Vec<_> = (0..workers)
                .map(|_| {
                    let job_rx = job_rx.clone();
                    let result_tx = result_tx.clone();
                    scope.spawn(move || {
                        for (index, regions) in job_rx {
                            if cancelled.load(Ordering::Relaxed) {
                                break;
                            }
                            let result = redact_frame(storage, redactor, video_id, index, regions);
                            if result_tx.send((index, result)).is_err() {
                                break;
                            }
                        }
                    })
                })
                .collect();
            drop(job_rx);
            drop(result_tx);

            for (index, result) in result_rx {
                record(logger, report, video_id, index, result);
                logger.progress(report_done(report), total);
            }

            let mut panicked = feeder.join().is_err();
            for handle in handles {
                panicked |= handle.join().is_err();
            }
            panicked
        });

        if panicked {
            return Err("Shard worker thread panicked".into());
        }
        if cancelled.load(Ordering::Relaxed) {
            report.cancelled = true;
        }
        Ok(())
    }
}

fn report_done(report: &ShardReport) -> usize {
    report.skipped + report.redacted + report.failed
}

fn record(
    logger: &mut dyn PipelineLogger,
    report: &mut ShardReport,
    video_id: &str,
    index: u32,
    result: Result<FrameTimings, SendError>,
) {
    match result {
        Ok(t) => {
            logger.timing("fetch", t.fetch_ms);
            logger.timing("redact", t.redact_ms);
            logger.timing("store", t.store_ms);
            logger.metric("regions", t.regions as f64);
            report.redacted += 1;
        }
        Err(e) => {
            log::warn!("Frame {index} of {video_id} left unredacted: {e}");
            report.failed += 1;
        }
    }
}

fn elapsed_ms(since: Instant) -> f64 {
    since.elapsed().as_secs_f64() * 1000.0
}

/// Fetch, redact and write back a single frame under its own key.
fn redact_frame(
    storage: &dyn FrameStorage,
    redactor: &dyn FrameRedactor,
    video_id: &str,
    index: u32,
    regions: &[Region],
) -> Result<FrameTimings, SendError> {
    let key = frame_key(video_id, index);

    let t = Instant::now();
    let bytes = storage.get(&key)?;
    let frame = png_frame_codec::decode(&bytes, index)?;
    let fetch_ms = elapsed_ms(t);

    let t = Instant::now();
    let redacted = redactor.redact(&frame, regions);
    let redact_ms = elapsed_ms(t);

    let t = Instant::now();
    let encoded = png_frame_codec::encode(&redacted)?;
    storage.put(&key, &encoded)?;

    Ok(FrameTimings {
        fetch_ms,
        redact_ms,
        store_ms: elapsed_ms(t),
        regions: regions.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    use crate::pipeline::shard_plan::ShardPlan;
    use crate::redaction::domain::frame_redactor::CompositingRedactor;
    use crate::redaction::infrastructure::blur_transform::GaussianBlurTransform;
    use crate::shared::frame::Frame;
    use crate::storage::infrastructure::memory_frame_storage::MemoryFrameStorage;
    use crate::tracking::domain::faces_positions::FacesPositions;
    use crate::tracking::domain::frame_mapper::FrameMap;

    const RED: [u8; 3] = [255, 0, 0];
    const GREY: [u8; 3] = [90, 90, 90];

    /// Paints every region solid red.
    struct RedRedactor;

    impl FrameRedactor for RedRedactor {
        fn redact(&self, frame: &Frame, regions: &[Region]) -> Frame {
            let mut out = frame.clone();
            let w = frame.width();
            for r in regions {
                for y in r.top..r.bottom() {
                    for x in r.left..r.right() {
                        let i = ((y * w + x) * 3) as usize;
                        out.data_mut()[i..i + 3].copy_from_slice(&RED);
                    }
                }
            }
            out
        }
    }

    fn video(total_frames: u32) -> VideoData {
        VideoData {
            id: "vid".to_string(),
            filename: "vid.mp4".to_string(),
            extension: "mp4".to_string(),
            duration: total_frames as f64 / 10.0,
            width: 16,
            height: 16,
            total_frames,
            fps: 10,
            audio: false,
            storage_key: "videos/source/vid/vid.mp4".to_string(),
        }
    }

    /// Frames 1..=total stored grey; frames 1..=6 mapped to sample 1 which
    /// has one region, the rest mapped to a sample with no data.
    fn setup(total: u32) -> (Arc<MemoryFrameStorage>, FrameDataset) {
        let storage = Arc::new(MemoryFrameStorage::new());
        for i in 1..=total {
            let png = png_frame_codec::encode(&Frame::filled(16, 16, GREY, i)).unwrap();
            storage.put(&frame_key("vid", i), &png).unwrap();
        }
        let faces = FacesPositions::from([(1, vec![Region::new(2, 2, 4, 4)])]);
        let mapper: FrameMap = (1..=total).map(|i| (i, if i <= 6 { 1 } else { 11 })).collect();
        let dataset = FrameDataset::new(faces, mapper);
        dataset.store(storage.as_ref(), "vid").unwrap();
        (storage, dataset)
    }

    fn stored_pixel(storage: &MemoryFrameStorage, index: u32, x: u32, y: u32) -> [u8; 3] {
        let frame = png_frame_codec::decode(&storage.get(&frame_key("vid", index)).unwrap(), index)
            .unwrap();
        let i = ((y * frame.width() + x) * 3) as usize;
        [frame.data()[i], frame.data()[i + 1], frame.data()[i + 2]]
    }

    fn use_case(storage: Arc<MemoryFrameStorage>, io_concurrency: usize) -> RedactShardUseCase {
        RedactShardUseCase::new(storage, Arc::new(RedRedactor), io_concurrency, None, None)
    }

    #[rstest]
    #[case(1)]
    #[case(3)]
    fn test_redacts_mapped_frames_and_skips_rest(#[case] io_concurrency: usize) {
        let (storage, _) = setup(10);
        let shard = Shard {
            index: 1,
            init_frame: 1,
            last_frame: 10,
        };
        let report = use_case(storage.clone(), io_concurrency)
            .execute(&video(10), &shard)
            .unwrap();

        assert_eq!(
            report,
            ShardReport {
                shard: 1,
                redacted: 6,
                skipped: 4,
                failed: 0,
                cancelled: false
            }
        );
        assert_eq!(stored_pixel(&storage, 3, 3, 3), RED);
        assert_eq!(stored_pixel(&storage, 3, 10, 10), GREY);
        assert_eq!(stored_pixel(&storage, 8, 3, 3), GREY);
    }

    #[test]
    fn test_only_frames_in_shard_touched() {
        let (storage, _) = setup(10);
        let plan = ShardPlan::new(10, 4);
        let shard = plan.shard(2).unwrap();
        let report = use_case(storage.clone(), 1).execute(&video(10), shard).unwrap();

        assert_eq!(report.redacted, 2);
        assert_eq!(stored_pixel(&storage, 1, 3, 3), GREY);
        assert_eq!(stored_pixel(&storage, 3, 3, 3), RED);
        assert_eq!(stored_pixel(&storage, 4, 3, 3), RED);
        assert_eq!(stored_pixel(&storage, 5, 3, 3), GREY);
    }

    #[rstest]
    #[case(1)]
    #[case(4)]
    fn test_missing_frame_counted_as_failed(#[case] io_concurrency: usize) {
        let storage = Arc::new(MemoryFrameStorage::new());
        let (full, dataset) = setup(6);
        for i in [1, 2, 4, 5, 6] {
            let key = frame_key("vid", i);
            storage.put(&key, &full.get(&key).unwrap()).unwrap();
        }
        let shard = Shard {
            index: 1,
            init_frame: 1,
            last_frame: 6,
        };
        let report = use_case(storage.clone(), io_concurrency)
            .execute_with(&video(6), &dataset, &shard)
            .unwrap();

        assert_eq!((report.redacted, report.failed), (5, 1));
        assert_eq!(stored_pixel(&storage, 4, 3, 3), RED);
    }

    #[test]
    fn test_rerun_with_solid_paint_rewrites_same_bytes() {
        let (storage, _) = setup(6);
        let shard = Shard {
            index: 1,
            init_frame: 1,
            last_frame: 6,
        };
        use_case(storage.clone(), 1).execute(&video(6), &shard).unwrap();
        let first = storage.get(&frame_key("vid", 2)).unwrap();
        use_case(storage.clone(), 2).execute(&video(6), &shard).unwrap();
        assert_eq!(storage.get(&frame_key("vid", 2)).unwrap(), first);
    }

    #[test]
    fn test_blurred_output_independent_of_io_concurrency() {
        let striped = |index: u32| {
            let data = (0..16 * 16 * 3)
                .map(|i| if (i / 3) % 2 == 0 { 0 } else { 255 })
                .collect();
            Frame::new(data, 16, 16, 3, index)
        };
        let run = |io_concurrency: usize| {
            let (storage, dataset) = setup(8);
            for i in 1..=8 {
                let png = png_frame_codec::encode(&striped(i)).unwrap();
                storage.put(&frame_key("vid", i), &png).unwrap();
            }
            let redactor = CompositingRedactor::new(Box::new(GaussianBlurTransform::default()));
            let shard = Shard {
                index: 1,
                init_frame: 1,
                last_frame: 8,
            };
            RedactShardUseCase::new(storage.clone(), Arc::new(redactor), io_concurrency, None, None)
                .execute_with(&video(8), &dataset, &shard)
                .unwrap();
            storage
        };

        let sequential = run(1);
        let concurrent = run(3);

        for i in 1..=8 {
            let key = frame_key("vid", i);
            assert_eq!(sequential.get(&key).unwrap(), concurrent.get(&key).unwrap());
        }
        let untouched = png_frame_codec::encode(&striped(2)).unwrap();
        assert_ne!(sequential.get(&frame_key("vid", 2)).unwrap(), untouched);
        let unmapped = png_frame_codec::encode(&striped(7)).unwrap();
        assert_eq!(sequential.get(&frame_key("vid", 7)).unwrap(), unmapped);
    }

    #[rstest]
    #[case(1)]
    #[case(2)]
    fn test_cancelled_shard_leaves_frames_untouched(#[case] io_concurrency: usize) {
        let (storage, _) = setup(6);
        let cancelled = Arc::new(AtomicBool::new(true));
        let shard = Shard {
            index: 1,
            init_frame: 1,
            last_frame: 6,
        };
        let report = RedactShardUseCase::new(
            storage.clone(),
            Arc::new(RedRedactor),
            io_concurrency,
            Some(cancelled),
            None,
        )
        .execute(&video(6), &shard)
        .unwrap();

        assert!(report.cancelled);
        assert_eq!(report.redacted, 0);
        assert_eq!(stored_pixel(&storage, 1, 3, 3), GREY);
    }

    #[test]
    fn test_missing_dataset_fails_shard() {
        let storage = Arc::new(MemoryFrameStorage::new());
        let shard = Shard {
            index: 1,
            init_frame: 1,
            last_frame: 5,
        };
        assert!(use_case(storage, 1).execute(&video(5), &shard).is_err());
    }

    #[test]
    fn test_shard_beyond_video_rejected() {
        let (storage, dataset) = setup(5);
        let shard = Shard {
            index: 2,
            init_frame: 4,
            last_frame: 9,
        };
        assert!(use_case(storage, 1)
            .execute_with(&video(5), &dataset, &shard)
            .is_err());
    }

    #[test]
    fn test_reversed_shard_rejected() {
        let (storage, dataset) = setup(5);
        let shard = Shard {
            index: 1,
            init_frame: 4,
            last_frame: 2,
        };
        assert!(use_case(storage, 1)
            .execute_with(&video(5), &dataset, &shard)
            .is_err());
    }
}
