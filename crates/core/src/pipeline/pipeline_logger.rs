use std::collections::BTreeMap;
use std::time::Instant;

/// Observer for reconstruction events.
///
/// Use cases report through this trait instead of calling `log` directly so
/// the caller decides whether progress is printed, collected, or dropped.
pub trait PipelineLogger: Send {
    /// Frames handled so far; `total` is 0 when the container gave no estimate.
    fn progress(&mut self, current: usize, total: usize);

    /// Wall time of one named stage (`decode`, `detect`, `hull`, ...).
    fn timing(&mut self, stage: &str, duration_ms: f64);

    fn metric(&mut self, name: &str, value: f64);

    fn info(&mut self, message: &str);

    /// Non-fatal problem, such as a frame with no detectable face.
    fn warn(&mut self, message: &str);

    /// End-of-run report. Default: no-op.
    fn summary(&self) {}
}

/// Discards every event.
pub struct NullPipelineLogger;

impl PipelineLogger for NullPipelineLogger {
    fn progress(&mut self, _current: usize, _total: usize) {}
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
    fn metric(&mut self, _name: &str, _value: f64) {}
    fn info(&mut self, _message: &str) {}
    fn warn(&mut self, _message: &str) {}
}

/// Forwards events to the `log` facade and keeps totals for a closing summary.
///
/// Progress lines are throttled to one every `throttle_frames` frames.
pub struct StdoutPipelineLogger {
    throttle_frames: usize,
    started: Instant,
    frames_seen: usize,
    timings: BTreeMap<String, Vec<f64>>,
    metrics: BTreeMap<String, f64>,
    warnings: usize,
}

impl StdoutPipelineLogger {
    pub fn new(throttle_frames: usize) -> Self {
        Self {
            throttle_frames: throttle_frames.max(1),
            started: Instant::now(),
            frames_seen: 0,
            timings: BTreeMap::new(),
            metrics: BTreeMap::new(),
            warnings: 0,
        }
    }

    pub fn warning_count(&self) -> usize {
        self.warnings
    }

    pub fn timings_for(&self, stage: &str) -> Option<&[f64]> {
        self.timings.get(stage).map(Vec::as_slice)
    }

    /// Latest value recorded under `name`.
    pub fn metric_value(&self, name: &str) -> Option<f64> {
        self.metrics.get(name).copied()
    }

    /// Formatted report, or `None` when nothing was recorded.
    pub fn summary_string(&self) -> Option<String> {
        if self.timings.is_empty() && self.metrics.is_empty() && self.warnings == 0 {
            return None;
        }

        let elapsed_s = self.started.elapsed().as_secs_f64();
        let mut lines = vec![format!(
            "Reconstruction summary ({} frames, {elapsed_s:.1}s):",
            self.frames_seen
        )];

        for (stage, durations) in &self.timings {
            let total_ms: f64 = durations.iter().sum();
            if durations.len() > 1 {
                let avg_ms = total_ms / durations.len() as f64;
                lines.push(format!(
                    "  {stage:10}: {total_ms:8.1}ms over {} calls (avg {avg_ms:.1}ms)",
                    durations.len()
                ));
            } else {
                lines.push(format!("  {stage:10}: {total_ms:8.1}ms"));
            }
        }
        for (name, value) in &self.metrics {
            lines.push(format!("  {name}: {value}"));
        }
        if self.warnings > 0 {
            lines.push(format!("  warnings: {}", self.warnings));
        }

        Some(lines.join("\n"))
    }
}

impl Default for StdoutPipelineLogger {
    fn default() -> Self {
        Self::new(25)
    }
}

impl PipelineLogger for StdoutPipelineLogger {
    fn progress(&mut self, current: usize, total: usize) {
        self.frames_seen = current;
        let due = current % self.throttle_frames == 0 || (total > 0 && current == total);
        if !due {
            return;
        }
        if total > 0 {
            let pct = current as f64 / total as f64 * 100.0;
            log::info!("Frames: {current}/{total} ({pct:.0}%)");
        } else {
            log::info!("Frames: {current}");
        }
    }

    fn timing(&mut self, stage: &str, duration_ms: f64) {
        self.timings
            .entry(stage.to_string())
            .or_default()
            .push(duration_ms);
    }

    fn metric(&mut self, name: &str, value: f64) {
        self.metrics.insert(name.to_string(), value);
    }

    fn info(&mut self, message: &str) {
        log::info!("{message}");
    }

    fn warn(&mut self, message: &str) {
        self.warnings += 1;
        log::warn!("{message}");
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n{text}");
        }
    }
}
