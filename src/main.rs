//! # wsperf-analyze - Main Entry Point
//!
//! Loads one or more wsperf result files, merges them and prints the
//! aggregate handshake report.
//!
//! ## Architecture Overview
//!
//! The main function performs these key operations:
//! 1. **Parse arguments**: Processes command-line configuration
//! 2. **Initialize logging**: Diagnostics to stderr, level from `RUST_LOG` or `-v`
//! 3. **Analyze**: Loads every file, merges and summarizes
//! 4. **Report**: Writes the text report to stdout and optionally a JSON file
//!
//! ## Error Handling
//!
//! Any file that fails to load aborts the run with a non-zero exit status;
//! no report is printed for a partial set of inputs.

use anyhow::{Context, Result};
use clap::Parser;
use std::io::{self, Write};
use tracing::{debug, info};
use wsperf_analyze::{
    analyzer::Analyzer,
    cli::{AnalyzerConfig, Args},
    logging,
    report::write_report,
};

fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(args.verbose);

    info!("Starting wsperf-analyze {}", wsperf_analyze::VERSION);
    debug!("Configuration: {:?}", args);

    let config = AnalyzerConfig::try_from(&args).context("invalid configuration")?;
    let analyzer = Analyzer::new(config);

    let stdout = io::stdout();
    let mut out = stdout.lock();

    let report = analyzer.run(&mut out).context("analysis failed")?;
    write_report(&mut out, &report).context("failed to write report")?;

    if let Some(ref json_file) = analyzer.config().output_json {
        report
            .write_json(json_file)
            .with_context(|| format!("failed to write JSON report to {}", json_file.display()))?;
    }

    writeln!(out, "Analyze done.")?;
    Ok(())
}
