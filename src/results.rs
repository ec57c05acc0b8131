use crate::error::{AnalyzeError, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Aggregate outcome of one wsperf result file
///
/// `open_timestamps`, `close_timestamps` and the pre-init bounds only ever
/// reflect successful connections; failed ones are counted and nothing else.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunResult {
    pub success_count: u64,
    pub fail_count: u64,
    pub total_count: u64,

    /// Duration as reported by the benchmark tool inside the file
    pub reported_duration_micros: u64,

    /// Wall-clock bounds of the run, microseconds since the Unix epoch
    pub started_at_micros: u64,
    pub ended_at_micros: u64,
    pub wall_clock_duration_micros: u64,

    pub open_timestamps: Vec<u64>,
    pub close_timestamps: Vec<u64>,
    pub pre_init_min: Option<u64>,
    pub pre_init_max: Option<u64>,
}

/// Result of merging several runs; same shape as a single run
pub type AggregateResult = RunResult;

impl RunResult {
    /// Percentage of connections that failed, undefined when there were none
    pub fn fail_percent(&self) -> Option<f64> {
        crate::utils::ratio(self.fail_count as f64, self.total_count as f64).map(|r| r * 100.0)
    }

    /// Successful handshakes per wall-clock second, undefined for a zero-length run
    pub fn handshakes_per_sec(&self) -> Option<f64> {
        crate::utils::ratio(
            self.success_count as f64,
            self.wall_clock_duration_micros as f64 / 1_000_000.0,
        )
    }

    /// Fold one successful connection into the run
    pub(crate) fn record_success(&mut self, pre_init: u64, open: u64, close: u64) {
        self.success_count += 1;
        self.open_timestamps.push(open);
        self.close_timestamps.push(close);
        self.pre_init_min = Some(self.pre_init_min.map_or(pre_init, |min| min.min(pre_init)));
        self.pre_init_max = Some(self.pre_init_max.map_or(pre_init, |max| max.max(pre_init)));
    }

    pub(crate) fn record_failure(&mut self) {
        self.fail_count += 1;
    }
}

/// Merge per-file results into one aggregate
///
/// Counts and reported durations are summed and timestamp sequences are
/// concatenated in input order. The wall-clock span is rebuilt from the
/// earliest non-zero start and the latest end, so the outcome does not depend
/// on input order apart from the order of the concatenated samples.
pub fn merge_results<I>(results: I) -> Result<AggregateResult>
where
    I: IntoIterator<Item = RunResult>,
{
    let mut merged = AggregateResult::default();
    let mut started: Option<u64> = None;
    let mut runs = 0usize;

    for run in results {
        runs += 1;
        merged.success_count = merged.success_count.saturating_add(run.success_count);
        merged.fail_count = merged.fail_count.saturating_add(run.fail_count);
        merged.total_count = merged.total_count.saturating_add(run.total_count);
        merged.reported_duration_micros = merged
            .reported_duration_micros
            .saturating_add(run.reported_duration_micros);
        merged.open_timestamps.extend(run.open_timestamps);
        merged.close_timestamps.extend(run.close_timestamps);

        if run.started_at_micros != 0 {
            started = Some(started.map_or(run.started_at_micros, |s| s.min(run.started_at_micros)));
        }
        merged.ended_at_micros = merged.ended_at_micros.max(run.ended_at_micros);

        merged.pre_init_min = match (merged.pre_init_min, run.pre_init_min) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        merged.pre_init_max = match (merged.pre_init_max, run.pre_init_max) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };
    }

    if runs == 0 {
        return Err(AnalyzeError::EmptyInput("no result files to merge"));
    }

    merged.started_at_micros = started.unwrap_or(0);
    merged.wall_clock_duration_micros = merged
        .ended_at_micros
        .saturating_sub(merged.started_at_micros);

    debug!(
        "Merged {} runs: {} connections, {} successful",
        runs, merged.total_count, merged.success_count
    );
    Ok(merged)
}
