//! # Analysis Runner
//!
//! Drives one analysis: load every result file, merge, summarize.
//!
//! ## Lifecycle
//!
//! 1. **Loading**: each file is streamed through its own accumulator
//! 2. **Merging**: per-file results are reduced in input order
//! 3. **Summarizing**: timestamp series become a [`Report`]
//!
//! Files share no state while loading, so `parallel` mode hands them to the
//! rayon pool and merges afterwards. Any failing file aborts the whole run;
//! a report over a subset of the inputs would misstate the totals.

use crate::{
    cli::AnalyzerConfig,
    error::Result,
    loader,
    report::Report,
    results::{merge_results, RunResult},
};
use rayon::prelude::*;
use std::io::Write;
use std::path::Path;
use tracing::info;

/// Runs the load/merge/summarize pipeline for one configuration
pub struct Analyzer {
    config: AnalyzerConfig,
}

impl Analyzer {
    pub fn new(config: AnalyzerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Load and merge all inputs, announcing each file on `progress`
    pub fn run<W: Write>(&self, progress: &mut W) -> Result<Report> {
        let runs = self.load_all(progress)?;
        let files = runs.len();
        let aggregate = merge_results(runs)?;

        info!(
            "Aggregated {} files: {} connections, {} failed",
            files, aggregate.total_count, aggregate.fail_count
        );

        Ok(Report::build(
            aggregate,
            files,
            &self.config.quantiles,
            self.config.close_stats,
        ))
    }

    fn load_all<W: Write>(&self, progress: &mut W) -> Result<Vec<RunResult>> {
        if !self.config.parallel {
            let mut runs = Vec::with_capacity(self.config.files.len());
            for path in &self.config.files {
                announce(progress, path)?;
                runs.push(loader::load_file(path)?);
            }
            return Ok(runs);
        }

        for path in &self.config.files {
            announce(progress, path)?;
        }
        info!("Loading {} files in parallel", self.config.files.len());
        self.config
            .files
            .par_iter()
            .map(|path| loader::load_file(path))
            .collect()
    }
}

fn announce<W: Write>(progress: &mut W, path: &Path) -> Result<()> {
    writeln!(progress, "Loading wsperf result file {} ..", path.display())?;
    Ok(())
}
