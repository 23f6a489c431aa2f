use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use crate::redaction::domain::frame_redactor::FrameRedactor;
use crate::shared::video_data::VideoData;
use crate::storage::domain::frame_storage::FrameStorage;
use crate::tracking::domain::frame_dataset::FrameDataset;

use super::redact_shard_use_case::ShardReport;
use super::shard_plan::ShardPlan;

/// Everything a shard worker needs besides its shard.
#[derive(Clone)]
pub struct ShardJob {
    pub video: VideoData,
    pub dataset: Arc<FrameDataset>,
    pub storage: Arc<dyn FrameStorage>,
    pub redactor: Arc<dyn FrameRedactor>,
    pub io_concurrency: usize,
    pub cancelled: Arc<AtomicBool>,
}

/// Abstracts how the shards of one video are run.
///
/// Infrastructure decides placement: threads in this process, or separate
/// worker invocations driven by an external orchestrator.
pub trait ShardExecutor: Send {
    /// Runs every shard of `plan` and returns their reports in shard order,
    /// or the first shard failure.
    fn execute(
        &self,
        job: ShardJob,
        plan: &ShardPlan,
    ) -> Result<Vec<ShardReport>, Box<dyn std::error::Error>>;
}
