use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use crate::redaction::domain::frame_redactor::FrameRedactor;
use crate::shared::video_data::VideoData;
use crate::storage::domain::frame_storage::FrameStorage;
use crate::tracking::domain::frame_dataset::FrameDataset;

use super::redact_shard_use_case::ShardReport;
use super::shard_executor::{ShardExecutor, ShardJob};
use super::shard_plan::ShardPlan;

/// Redacts every frame of a video by splitting it into shards and handing
/// them to a [`ShardExecutor`].
///
/// The frame dataset is read from storage once and shared by all shards.
pub struct RedactVideoUseCase {
    executor: Box<dyn ShardExecutor>,
    storage: Arc<dyn FrameStorage>,
    redactor: Arc<dyn FrameRedactor>,
    shard_count: u32,
    io_concurrency: usize,
    cancelled: Arc<AtomicBool>,
}

impl RedactVideoUseCase {
    pub fn new(
        executor: Box<dyn ShardExecutor>,
        storage: Arc<dyn FrameStorage>,
        redactor: Arc<dyn FrameRedactor>,
        shard_count: u32,
        io_concurrency: usize,
        cancelled: Option<Arc<AtomicBool>>,
    ) -> Self {
        Self {
            executor,
            storage,
            redactor,
            shard_count,
            io_concurrency,
            cancelled: cancelled.unwrap_or_else(|| Arc::new(AtomicBool::new(false))),
        }
    }

    pub fn execute(
        &self,
        video: &VideoData,
    ) -> Result<Vec<ShardReport>, Box<dyn std::error::Error>> {
        let dataset = FrameDataset::load(self.storage.as_ref(), &video.id)?;
        let plan = ShardPlan::new(video.total_frames, self.shard_count);
        log::info!(
            "Redacting {} frames of {} in {} shard(s)",
            video.total_frames,
            video.id,
            plan.len()
        );

        let job = ShardJob {
            video: video.clone(),
            dataset: Arc::new(dataset),
            storage: self.storage.clone(),
            redactor: self.redactor.clone(),
            io_concurrency: self.io_concurrency,
            cancelled: self.cancelled.clone(),
        };
        let reports = self.executor.execute(job, &plan)?;

        let failed: usize = reports.iter().map(|r| r.failed).sum();
        if failed > 0 {
            log::warn!("{failed} frame(s) of {} could not be redacted", video.id);
        }
        Ok(reports)
    }
}
