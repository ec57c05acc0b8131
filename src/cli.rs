use crate::error::{AnalyzeError, Result};
use crate::metrics::Quantile;
use clap::Parser;
use std::path::PathBuf;

/// wsperf-analyze - aggregate statistics over WebSocket handshake load-test results
#[derive(Parser, Debug)]
#[clap(version, about, long_about = None)]
pub struct Args {
    /// wsperf result files to analyze (merged into one report)
    #[clap(required = true, num_args = 1..)]
    pub files: Vec<PathBuf>,

    /// Percentiles to report for connection latencies (comma-separated or repeated)
    #[clap(short = 'q', long, value_parser = parse_percentile, value_delimiter = ',', default_values_t = crate::defaults::QUANTILES.to_vec())]
    pub percentiles: Vec<f64>,

    /// Also report statistics over connection close timestamps
    #[clap(long, default_value_t = false)]
    pub close_stats: bool,

    /// Load result files in parallel
    #[clap(short = 'j', long, default_value_t = false)]
    pub parallel: bool,

    /// Also write the report as JSON to this file
    #[clap(long)]
    pub output_json: Option<PathBuf>,

    /// Verbose output
    #[clap(short = 'v', long, default_value_t = false)]
    pub verbose: bool,
}

/// Configuration for one analysis run
#[derive(Clone, Debug)]
pub struct AnalyzerConfig {
    pub files: Vec<PathBuf>,
    pub quantiles: Vec<Quantile>,
    pub close_stats: bool,
    pub parallel: bool,
    pub output_json: Option<PathBuf>,
}

impl AnalyzerConfig {
    /// Sequential analysis of `files` with the default percentiles
    pub fn new(files: Vec<PathBuf>) -> Result<Self> {
        Ok(Self {
            files,
            quantiles: quantiles(crate::defaults::QUANTILES)?,
            close_stats: false,
            parallel: false,
            output_json: None,
        })
    }
}

impl TryFrom<&Args> for AnalyzerConfig {
    type Error = AnalyzeError;

    fn try_from(args: &Args) -> Result<Self> {
        Ok(Self {
            files: args.files.clone(),
            quantiles: quantiles(&args.percentiles)?,
            close_stats: args.close_stats,
            parallel: args.parallel,
            output_json: args.output_json.clone(),
        })
    }
}

fn quantiles(percents: &[f64]) -> Result<Vec<Quantile>> {
    percents.iter().map(|&p| Quantile::new(p)).collect()
}

/// Parse a percentile such as "99.9"
fn parse_percentile(s: &str) -> Result<f64, String> {
    let value: f64 = s
        .trim()
        .parse()
        .map_err(|_| format!("Invalid percentile: {}", s))?;
    if !value.is_finite() || !(0.0..=100.0).contains(&value) {
        return Err(format!("Percentile must be within [0, 100]: {}", s));
    }
    Ok(value)
}
