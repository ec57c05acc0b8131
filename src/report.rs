use crate::error::{AnalyzeError, Result};
use crate::metrics::{Quantile, Sample, StatsSummary};
use crate::results::AggregateResult;
use crate::utils::{format_epoch_micros, micros_to_millis};
use serde::Serialize;
use std::fmt::Display;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use tracing::{info, warn};

const TITLE: &str = "Aggregate results (WebSocket Opening+Closing Handshake)";
const UNDEFINED: &str = "undefined";

/// Scalar part of an aggregate, with the derived rates resolved
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub total_connections: u64,
    pub successful_connections: u64,
    pub failed_connections: u64,
    pub fail_percent: Option<f64>,
    pub handshakes_per_sec: Option<u64>,
    pub wall_clock_duration_us: u64,
    pub reported_duration_us: u64,
    pub started_at_us: u64,
    pub ended_at_us: u64,
    pub pre_init_min_us: Option<u64>,
    pub pre_init_max_us: Option<u64>,
}

impl RunSummary {
    fn from_aggregate(aggregate: &AggregateResult) -> Self {
        Self {
            total_connections: aggregate.total_count,
            successful_connections: aggregate.success_count,
            failed_connections: aggregate.fail_count,
            fail_percent: aggregate.fail_percent(),
            handshakes_per_sec: aggregate.handshakes_per_sec().map(|r| r.round() as u64),
            wall_clock_duration_us: aggregate.wall_clock_duration_micros,
            reported_duration_us: aggregate.reported_duration_micros,
            started_at_us: aggregate.started_at_micros,
            ended_at_us: aggregate.ended_at_micros,
            pre_init_min_us: aggregate.pre_init_min,
            pre_init_max_us: aggregate.pre_init_max,
        }
    }
}

/// Statistics for one timestamp series; `stats` is `None` when it was empty
#[derive(Debug, Clone, Serialize)]
pub struct SampleReport {
    pub name: &'static str,
    pub stats: Option<StatsSummary>,
}

impl SampleReport {
    fn build(name: &'static str, values: Vec<u64>, quantiles: &[Quantile]) -> Self {
        let stats = match Sample::new(values) {
            Ok(sample) => Some(sample.summarize(quantiles)),
            Err(err) => {
                warn!("No {} statistics: {}", name, err);
                None
            }
        };
        Self { name, stats }
    }
}

/// Complete analysis of a set of result files
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub version: String,
    pub generated_at: chrono::DateTime<chrono::Utc>,
    pub files: usize,
    pub run: RunSummary,
    pub open_latency: SampleReport,
    pub close_latency: Option<SampleReport>,
}

impl Report {
    /// Summarize an aggregate, consuming its timestamp series
    pub fn build(
        mut aggregate: AggregateResult,
        files: usize,
        quantiles: &[Quantile],
        include_close: bool,
    ) -> Self {
        let run = RunSummary::from_aggregate(&aggregate);
        let open_latency = SampleReport::build(
            "open latency",
            std::mem::take(&mut aggregate.open_timestamps),
            quantiles,
        );
        let close_latency = include_close.then(|| {
            SampleReport::build(
                "close latency",
                std::mem::take(&mut aggregate.close_timestamps),
                quantiles,
            )
        });

        Self {
            version: crate::VERSION.to_string(),
            generated_at: chrono::Utc::now(),
            files,
            run,
            open_latency,
            close_latency,
        }
    }

    /// Write the report as pretty-printed JSON
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let file = File::create(path).map_err(|source| AnalyzeError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self).map_err(|e| AnalyzeError::Output(e.into()))?;
        writer.flush()?;

        info!("JSON report written to: {:?}", path);
        Ok(())
    }
}

/// Renders a [`Report`] as the fixed-width text block
pub struct ReportFormatter<W> {
    out: W,
}

impl<W: Write> ReportFormatter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn write(&mut self, report: &Report) -> io::Result<()> {
        let run = &report.run;

        writeln!(self.out)?;
        writeln!(self.out, "{}", TITLE)?;
        writeln!(self.out)?;
        self.field("Duration", millis(run.wall_clock_duration_us))?;
        self.field("Reported duration", millis(run.reported_duration_us))?;
        self.field("Started", format_epoch_micros(run.started_at_us))?;
        self.field("Ended", format_epoch_micros(run.ended_at_us))?;
        self.field("Total", format!("{:>9}", run.total_connections))?;
        self.field("Success", format!("{:>9}", run.successful_connections))?;
        self.field("Fail", format!("{:>9}", run.failed_connections))?;
        self.field("Fail %", or_undefined(run.fail_percent.map(|p| format!("{:>9.2}", p))))?;
        self.field(
            "Handshakes/sec",
            or_undefined(run.handshakes_per_sec.map(|r| format!("{:>9}", r))),
        )?;
        self.field("Pre-init min", or_undefined(run.pre_init_min_us.map(millis)))?;
        self.field("Pre-init max", or_undefined(run.pre_init_max_us.map(millis)))?;

        self.sample(&report.open_latency)?;
        if let Some(close) = &report.close_latency {
            self.sample(close)?;
        }
        writeln!(self.out)?;
        self.out.flush()
    }

    fn field(&mut self, label: &str, value: impl Display) -> io::Result<()> {
        writeln!(self.out, "{:>18}: {}", label, value)
    }

    fn stat(&mut self, label: &str, value: impl Display) -> io::Result<()> {
        writeln!(self.out, "{:>8}: {}", label, value)
    }

    fn sample(&mut self, sample: &SampleReport) -> io::Result<()> {
        writeln!(self.out)?;
        let stats = match &sample.stats {
            Some(stats) => stats,
            None => return writeln!(self.out, "  {}: no data", sample.name),
        };

        writeln!(self.out, "  {} ({} samples)", sample.name, stats.total_samples)?;
        self.stat("Min", millis(stats.min_us))?;
        self.stat("SD", or_undefined(stats.std_dev_us.map(millis_f64)))?;
        self.stat("Avg", millis_f64(stats.mean_us))?;
        self.stat("Median", millis(stats.median_us))?;
        for p in &stats.percentiles {
            self.stat(&format!("q{}", p.percentile), millis(p.value_us))?;
        }
        self.stat("Max", millis(stats.max_us))
    }
}

/// Render `report` as text into `out`
pub fn write_report<W: Write>(out: W, report: &Report) -> io::Result<()> {
    ReportFormatter::new(out).write(report)
}

fn millis(us: u64) -> String {
    format!("{:>9.1} ms", micros_to_millis(us))
}

fn millis_f64(us: f64) -> String {
    format!("{:>9.1} ms", us / 1_000.0)
}

fn or_undefined(value: Option<String>) -> String {
    value.unwrap_or_else(|| format!("{:>9}", UNDEFINED))
}
