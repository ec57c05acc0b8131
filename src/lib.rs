//! # wsperf Result Analyzer Library
//!
//! Aggregate statistics over the JSON result files written by the wsperf
//! WebSocket handshake load tester: success and failure counts, throughput,
//! and the latency distribution of connection opens.
//!
//! ## Architecture Overview
//!
//! The library is organized into a streaming pipeline:
//!
//! - `stream`: event-driven JSON walker emitting `(path, event)` tokens
//! - `loader`: folds one file's tokens into a `RunResult`
//! - `results`: the per-run data model and the multi-run merge
//! - `metrics`: rank-based percentile statistics over a sample
//! - `report`: text and JSON rendering of the aggregate
//! - `analyzer`: drives load, merge and summarize for a set of files
//! - `cli`: command-line parsing and configuration
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use wsperf_analyze::{Analyzer, AnalyzerConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = AnalyzerConfig::new(vec!["run-1.json".into(), "run-2.json".into()])?;
//!     let report = Analyzer::new(config).run(&mut std::io::stdout())?;
//!
//!     wsperf_analyze::report::write_report(std::io::stdout(), &report)?;
//!     Ok(())
//! }
//! ```
//!
//! ## Memory Characteristics
//!
//! Result files hold one entry per simulated connection. Files are parsed
//! as a token stream, so memory grows with the number of successful
//! connections (two timestamps each) and never with the document size.

/// Orchestration of a complete analysis
pub mod analyzer;

/// Command-line interface and configuration
///
/// Argument parsing using clap and conversion into the validated
/// `AnalyzerConfig` used by the library.
pub mod cli;

/// Error taxonomy shared by every stage
pub mod error;

/// wsperf result file loading
pub mod loader;

/// Colorized tracing output
pub mod logging;

/// Percentile and summary statistics
///
/// Exact integer rank selection: the percentile at `q` is the element at
/// sorted index `n - floor(n * (100 - q) / 100)`, clamped to the last
/// element, rather than an interpolated value.
pub mod metrics;

/// Text and JSON report rendering
pub mod report;

/// Per-run result model and multi-run merge
pub mod results;

/// Streaming JSON tokenizer
pub mod stream;

pub mod utils;

pub use analyzer::Analyzer;
pub use cli::{AnalyzerConfig, Args};
pub use error::AnalyzeError;
pub use loader::{load_file, load_reader, RunAccumulator};
pub use metrics::{Quantile, Sample, StatsSummary};
pub use report::{write_report, Report, ReportFormatter};
pub use results::{merge_results, AggregateResult, RunResult};

/// The current version of the analyzer
///
/// Populated from Cargo.toml and recorded in JSON reports.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default configuration values
pub mod defaults {
    /// Percentiles reported when none are given on the command line
    ///
    /// Tail-heavy on purpose: handshake latency problems show up in the last
    /// per-mille, and q99.99 is only distinct from the maximum once a run has
    /// at least 10,000 successful connections.
    pub const QUANTILES: &[f64] = &[90.0, 95.0, 99.0, 99.9, 99.99];
}
