use std::collections::BTreeMap;
use std::time::Instant;

/// Observer for pipeline progress and per-frame stage timings.
///
/// Use cases report through this trait instead of calling `log` directly so
/// callers can choose between silence and a throttled log with a summary.
pub trait PipelineLogger: Send {
    /// Frames finished so far out of `total`.
    fn progress(&mut self, current: usize, total: usize);

    /// Time spent in a named stage (`fetch`, `redact`, `store`) for one frame.
    fn timing(&mut self, stage: &str, duration_ms: f64);

    /// A per-frame quantity, such as regions redacted.
    fn metric(&mut self, name: &str, value: f64);

    fn info(&mut self, message: &str);

    /// Emit an end-of-run summary. Default: no-op.
    fn summary(&self) {}
}

/// Discards everything. Used by tests and by callers without a console.
pub struct NullPipelineLogger;

impl PipelineLogger for NullPipelineLogger {
    fn progress(&mut self, _current: usize, _total: usize) {}
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
    fn metric(&mut self, _name: &str, _value: f64) {}
    fn info(&mut self, _message: &str) {}
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StageStats {
    pub count: usize,
    pub total_ms: f64,
    pub max_ms: f64,
}

impl StageStats {
    fn record(&mut self, value: f64) {
        self.count += 1;
        self.total_ms += value;
        self.max_ms = self.max_ms.max(value);
    }

    pub fn avg_ms(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.total_ms / self.count as f64
        }
    }
}

/// Forwards to the `log` facade under a label (usually the shard).
///
/// Progress lines are throttled to one every `throttle_frames` frames.
/// Timings and metrics are aggregated and reported by [`summary`](PipelineLogger::summary).
pub struct LogPipelineLogger {
    label: String,
    throttle_frames: usize,
    stages: BTreeMap<String, StageStats>,
    metrics: BTreeMap<String, StageStats>,
    started: Instant,
    frames_done: usize,
}

impl LogPipelineLogger {
    pub fn new(label: impl Into<String>, throttle_frames: usize) -> Self {
        Self {
            label: label.into(),
            throttle_frames: throttle_frames.max(1),
            stages: BTreeMap::new(),
            metrics: BTreeMap::new(),
            started: Instant::now(),
            frames_done: 0,
        }
    }

    pub fn stage(&self, stage: &str) -> Option<&StageStats> {
        self.stages.get(stage)
    }

    pub fn metric_stats(&self, name: &str) -> Option<&StageStats> {
        self.metrics.get(name)
    }

    /// Summary text, or `None` when nothing was recorded.
    pub fn summary_string(&self) -> Option<String> {
        if self.stages.is_empty() && self.metrics.is_empty() {
            return None;
        }
        let elapsed_s = self.started.elapsed().as_secs_f64();
        let mut lines = vec![format!(
            "{} summary ({} frames, {elapsed_s:.1}s):",
            self.label, self.frames_done
        )];
        for (stage, s) in &self.stages {
            lines.push(format!(
                "  {stage:8}: avg {:6.1}ms  max {:6.1}ms  total {:7.0}ms",
                s.avg_ms(),
                s.max_ms,
                s.total_ms
            ));
        }
        for (name, s) in &self.metrics {
            lines.push(format!("  {name}: avg {:.1} over {}", s.avg_ms(), s.count));
        }
        Some(lines.join("\n"))
    }
}

impl PipelineLogger for LogPipelineLogger {
    fn progress(&mut self, current: usize, total: usize) {
        self.frames_done = current;
        if total > 0 && (current % self.throttle_frames == 0 || current == total) {
            let pct = current as f64 / total as f64 * 100.0;
            log::info!("{}: {current}/{total} frames ({pct:.1}%)", self.label);
        }
    }

    fn timing(&mut self, stage: &str, duration_ms: f64) {
        self.stages.entry(stage.to_string()).or_default().record(duration_ms);
    }

    fn metric(&mut self, name: &str, value: f64) {
        self.metrics.entry(name.to_string()).or_default().record(value);
    }

    fn info(&mut self, message: &str) {
        log::info!("{}: {message}", self.label);
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("{text}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_null_logger_accepts_everything() {
        let mut logger = NullPipelineLogger;
        logger.progress(1, 10);
        logger.timing("fetch", 5.0);
        logger.metric("regions", 2.0);
        logger.info("hello");
        logger.summary();
    }

    #[test]
    fn test_timings_aggregate_per_stage() {
        let mut logger = LogPipelineLogger::new("shard 1", 10);
        logger.timing("fetch", 20.0);
        logger.timing("fetch", 40.0);
        logger.timing("store", 5.0);

        let fetch = logger.stage("fetch").unwrap();
        assert_eq!(fetch.count, 2);
        assert_relative_eq!(fetch.avg_ms(), 30.0);
        assert_relative_eq!(fetch.max_ms, 40.0);
        assert_eq!(logger.stage("store").unwrap().count, 1);
        assert!(logger.stage("redact").is_none());
    }

    #[test]
    fn test_metrics_aggregate() {
        let mut logger = LogPipelineLogger::new("shard 1", 10);
        logger.metric("regions", 1.0);
        logger.metric("regions", 2.0);
        assert_relative_eq!(logger.metric_stats("regions").unwrap().avg_ms(), 1.5);
    }

    #[test]
    fn test_summary_lists_stages_in_order() {
        let mut logger = LogPipelineLogger::new("shard 2", 10);
        logger.progress(3, 3);
        logger.timing("store", 1.0);
        logger.timing("fetch", 1.0);
        logger.metric("regions", 4.0);

        let text = logger.summary_string().unwrap();
        assert!(text.starts_with("shard 2 summary (3 frames"));
        assert!(text.find("fetch").unwrap() < text.find("store").unwrap());
        assert!(text.contains("regions: avg 4.0 over 1"));
    }

    #[test]
    fn test_empty_summary_is_none() {
        assert!(LogPipelineLogger::new("x", 10).summary_string().is_none());
    }

    #[test]
    fn test_progress_tracks_frames_done() {
        let mut logger = LogPipelineLogger::new("x", 0);
        for i in 1..=20 {
            logger.progress(i, 20);
        }
        assert_eq!(logger.frames_done, 20);
        assert_eq!(logger.throttle_frames, 1);
    }

    #[test]
    fn test_stage_stats_empty_average() {
        assert_relative_eq!(StageStats::default().avg_ms(), 0.0);
    }
}
