use std::thread::JoinHandle;

use crate::pipeline::pipeline_logger::LogPipelineLogger;
use crate::pipeline::redact_shard_use_case::{RedactShardUseCase, ShardReport};
use crate::pipeline::shard_executor::{ShardExecutor, ShardJob};
use crate::pipeline::shard_plan::{Shard, ShardPlan};

const DEFAULT_PROGRESS_THROTTLE: usize = 25;

type SendError = Box<dyn std::error::Error + Send + Sync>;

/// Runs each shard on its own thread and waits for all of them.
///
/// Shards never share frames, so the threads need no coordination beyond
/// the shared cancel flag. A failing shard does not stop the others.
pub struct ThreadedShardExecutor {
    progress_throttle: usize,
}

impl ThreadedShardExecutor {
    pub fn new() -> Self {
        Self {
            progress_throttle: DEFAULT_PROGRESS_THROTTLE,
        }
    }
}

impl Default for ThreadedShardExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl ShardExecutor for ThreadedShardExecutor {
    fn execute(
        &self,
        job: ShardJob,
        plan: &ShardPlan,
    ) -> Result<Vec<ShardReport>, Box<dyn std::error::Error>> {
        let handles: Vec<_> = plan
            .shards()
            .iter()
            .map(|shard| spawn_shard(job.clone(), *shard, self.progress_throttle))
            .collect();
        join_shards(handles)
    }
}

fn spawn_shard(
    job: ShardJob,
    shard: Shard,
    progress_throttle: usize,
) -> (u32, JoinHandle<Result<ShardReport, SendError>>) {
    let handle = std::thread::spawn(move || {
        let logger = LogPipelineLogger::new(format!("shard {}", shard.index), progress_throttle);
        let mut use_case = RedactShardUseCase::new(
            job.storage,
            job.redactor,
            job.io_concurrency,
            Some(job.cancelled),
            Some(Box::new(logger)),
        );
        use_case
            .execute_with(&job.video, &job.dataset, &shard)
            .map_err(|e| -> SendError { e.to_string().into() })
    });
    (shard.index, handle)
}

/// Joins every shard thread, keeping the first error encountered.
fn join_shards(
    handles: Vec<(u32, JoinHandle<Result<ShardReport, SendError>>)>,
) -> Result<Vec<ShardReport>, Box<dyn std::error::Error>> {
    let mut reports = Vec::with_capacity(handles.len());
    let mut first_error: Option<Box<dyn std::error::Error>> = None;

    for (index, handle) in handles {
        let err: Box<dyn std::error::Error> = match handle.join() {
            Ok(Ok(report)) => {
                reports.push(report);
                continue;
            }
            Ok(Err(e)) => format!("Shard {index} failed: {e}").into(),
            Err(_) => format!("Shard {index} thread panicked").into(),
        };
        log::warn!("{err}");
        if first_error.is_none() {
            first_error = Some(err);
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(reports),
    }
}
