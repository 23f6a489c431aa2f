use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};

use faceredact_core::detection::domain::face_oracle::FaceOracle;
use faceredact_core::detection::infrastructure::http_face_oracle::HttpFaceOracle;
use faceredact_core::detection::infrastructure::recorded_face_oracle::RecordedFaceOracle;
use faceredact_core::pipeline::check_video_use_case::CheckVideoUseCase;
use faceredact_core::pipeline::config::PipelineSettings;
use faceredact_core::pipeline::infrastructure::threaded_shard_executor::ThreadedShardExecutor;
use faceredact_core::pipeline::pipeline_logger::LogPipelineLogger;
use faceredact_core::pipeline::redact_shard_use_case::RedactShardUseCase;
use faceredact_core::pipeline::redact_video_use_case::RedactVideoUseCase;
use faceredact_core::pipeline::shard_plan::ShardPlan;
use faceredact_core::pipeline::track_faces_use_case::TrackFacesUseCase;
use faceredact_core::redaction::infrastructure::redactor_factory::{create_redactor, RedactionStyle};
use faceredact_core::shared::video_data::VideoData;
use faceredact_core::storage::domain::frame_storage::FrameStorage;
use faceredact_core::storage::infrastructure::fs_frame_storage::FsFrameStorage;

const PROGRESS_THROTTLE: usize = 25;

/// Temporal face tracking and redaction over extracted video frames.
#[derive(Parser)]
#[command(name = "faceredact", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Apply the video policy and print the normalized video JSON.
    Check {
        #[command(flatten)]
        job: JobArgs,
        #[command(flatten)]
        tuning: TuningArgs,
    },
    /// Sample, gap-fill and map face regions; store the frame dataset.
    Track {
        #[command(flatten)]
        job: JobArgs,
        #[command(flatten)]
        oracle: OracleArgs,
        #[command(flatten)]
        tuning: TuningArgs,
    },
    /// Redact the frames of one shard in place.
    Redact {
        #[command(flatten)]
        job: JobArgs,
        /// 1-based shard index.
        #[arg(long)]
        shard: u32,
        #[command(flatten)]
        tuning: TuningArgs,
    },
    /// Check, track and redact every shard in parallel.
    Run {
        #[command(flatten)]
        job: JobArgs,
        #[command(flatten)]
        oracle: OracleArgs,
        #[command(flatten)]
        tuning: TuningArgs,
    },
    /// Print the shard partition of a frame range.
    Shards {
        #[arg(long)]
        total_frames: u32,
        #[arg(long, default_value = "4")]
        count: u32,
    },
}

#[derive(Args)]
struct JobArgs {
    /// Root directory of the frame storage.
    #[arg(long)]
    storage: PathBuf,

    /// Video description (JSON).
    #[arg(long)]
    video: PathBuf,
}

#[derive(Args)]
#[group(required = true, multiple = false)]
struct OracleArgs {
    /// Recorded detections: JSON list of [frame, detections] pairs.
    #[arg(long)]
    detections: Option<PathBuf>,

    /// Face detection endpoint that accepts PNG frame bytes.
    #[arg(long)]
    oracle_url: Option<String>,
}

#[derive(Args)]
struct TuningArgs {
    /// Settings file (JSON). Defaults to the user config directory.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Redaction style: blur, pixelate or icon.
    #[arg(long)]
    style: Option<RedactionStyle>,

    /// Icon image for icon redaction (repeatable).
    #[arg(long = "icon")]
    icons: Vec<PathBuf>,

    /// Growth factor applied to detected boxes.
    #[arg(long)]
    inflation: Option<f64>,

    /// Fixed sampling interval in frames.
    #[arg(long)]
    interval: Option<u32>,

    /// Number of shards.
    #[arg(long)]
    shards: Option<u32>,

    /// Frames each shard processes concurrently.
    #[arg(long)]
    io_concurrency: Option<usize>,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    match Cli::parse().command {
        Command::Check { job, tuning } => {
            let settings = load_settings(&tuning)?;
            let storage = open_storage(&job.storage)?;
            let video = checked_video(&job.video, &settings, storage)?;
            println!("{}", serde_json::to_string_pretty(&video)?);
        }
        Command::Track {
            job,
            oracle,
            tuning,
        } => {
            let settings = load_settings(&tuning)?;
            let storage = open_storage(&job.storage)?;
            let video = checked_video(&job.video, &settings, storage.clone())?;
            track(&video, &oracle, &settings, storage)?;
        }
        Command::Redact { job, shard, tuning } => {
            let settings = load_settings(&tuning)?;
            let storage = open_storage(&job.storage)?;
            let video = checked_video(&job.video, &settings, storage.clone())?;
            redact_shard(&video, shard, &settings, storage)?;
        }
        Command::Run {
            job,
            oracle,
            tuning,
        } => {
            let settings = load_settings(&tuning)?;
            let storage = open_storage(&job.storage)?;
            let video = checked_video(&job.video, &settings, storage.clone())?;
            track(&video, &oracle, &settings, storage.clone())?;
            redact_all(&video, &settings, storage)?;
        }
        Command::Shards {
            total_frames,
            count,
        } => {
            let plan = ShardPlan::new(total_frames, count);
            println!("{}", serde_json::to_string_pretty(plan.shards())?);
        }
    }
    Ok(())
}

fn load_settings(tuning: &TuningArgs) -> Result<PipelineSettings, Box<dyn std::error::Error>> {
    let mut settings = PipelineSettings::load(tuning.config.as_deref())?;
    if let Some(style) = tuning.style {
        settings.redaction.style = style;
    }
    if !tuning.icons.is_empty() {
        settings.redaction.icon_paths = tuning.icons.clone();
    }
    if let Some(inflation) = tuning.inflation {
        settings.tracking.inflation = inflation;
    }
    if let Some(interval) = tuning.interval {
        settings.tracking.interval = Some(interval);
    }
    if let Some(shards) = tuning.shards {
        settings.shard_count = shards;
    }
    if let Some(n) = tuning.io_concurrency {
        settings.io_concurrency = n;
    }
    settings.validate()?;
    Ok(settings)
}

fn open_storage(root: &Path) -> Result<Arc<dyn FrameStorage>, Box<dyn std::error::Error>> {
    if !root.is_dir() {
        return Err(format!("Storage directory not found: {}", root.display()).into());
    }
    Ok(Arc::new(FsFrameStorage::new(root)))
}

fn checked_video(
    path: &Path,
    settings: &PipelineSettings,
    storage: Arc<dyn FrameStorage>,
) -> Result<VideoData, Box<dyn std::error::Error>> {
    let json = std::fs::read_to_string(path)
        .map_err(|e| format!("Cannot read video file {}: {e}", path.display()))?;
    let video: VideoData = serde_json::from_str(&json)?;
    Ok(CheckVideoUseCase::new(settings.policy.clone(), storage).execute(video)?)
}

fn build_oracle(
    args: &OracleArgs,
    storage: Arc<dyn FrameStorage>,
) -> Result<Box<dyn FaceOracle>, Box<dyn std::error::Error>> {
    match (&args.detections, &args.oracle_url) {
        (Some(path), _) => {
            let oracle = RecordedFaceOracle::load(path)?;
            log::info!("Replaying detections for {} frame(s)", oracle.len());
            Ok(Box::new(oracle))
        }
        (None, Some(url)) => Ok(Box::new(HttpFaceOracle::new(url.as_str(), storage)?)),
        (None, None) => Err("Either --detections or --oracle-url is required".into()),
    }
}

fn track(
    video: &VideoData,
    oracle: &OracleArgs,
    settings: &PipelineSettings,
    storage: Arc<dyn FrameStorage>,
) -> Result<(), Box<dyn std::error::Error>> {
    let oracle = build_oracle(oracle, storage.clone())?;
    let mut use_case = TrackFacesUseCase::new(oracle, storage, settings.tracking.clone());
    let (_, report) = use_case.execute(video)?;
    eprintln!(
        "Tracked {}: {} sample(s) every {} frames, {} frame(s) to redact",
        video.id, report.samples, report.interval, report.frames_with_regions
    );
    Ok(())
}

fn redact_shard(
    video: &VideoData,
    shard_index: u32,
    settings: &PipelineSettings,
    storage: Arc<dyn FrameStorage>,
) -> Result<(), Box<dyn std::error::Error>> {
    let plan = ShardPlan::new(video.total_frames, settings.shard_count);
    let shard = plan.shard(shard_index).ok_or_else(|| {
        format!(
            "Shard {shard_index} does not exist; {} frames split into {} shard(s)",
            video.total_frames,
            plan.len()
        )
    })?;
    let redactor = create_redactor(&settings.redaction)?;
    let logger = LogPipelineLogger::new(format!("shard {shard_index}"), PROGRESS_THROTTLE);

    let mut use_case = RedactShardUseCase::new(
        storage,
        Arc::from(redactor),
        settings.io_concurrency,
        None,
        Some(Box::new(logger)),
    );
    let report = use_case.execute(video, shard)?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn redact_all(
    video: &VideoData,
    settings: &PipelineSettings,
    storage: Arc<dyn FrameStorage>,
) -> Result<(), Box<dyn std::error::Error>> {
    let redactor = create_redactor(&settings.redaction)?;
    let use_case = RedactVideoUseCase::new(
        Box::new(ThreadedShardExecutor::new()),
        storage,
        Arc::from(redactor),
        settings.shard_count,
        settings.io_concurrency,
        None,
    );
    let reports = use_case.execute(video)?;
    println!("{}", serde_json::to_string_pretty(&reports)?);
    Ok(())
}
