//! Error taxonomy for loading, merging and summarizing wsperf results.
//!
//! Every error is fatal to the file or run that raised it. Nothing in the
//! library substitutes a default value for missing data; callers decide
//! whether to abort or skip.

use std::path::PathBuf;
use thiserror::Error;

/// Result alias used throughout the library
pub type Result<T, E = AnalyzeError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum AnalyzeError {
    /// Malformed JSON in an input document
    #[error("malformed JSON at line {line}, column {column}: {message}")]
    Parse {
        line: usize,
        column: usize,
        message: String,
    },

    /// The result file could not be opened or read
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The input stream failed while a document was being read from it
    #[error("failed to read input: {0}")]
    Read(#[source] std::io::Error),

    /// Loading a specific result file failed
    #[error("failed to load {}", .path.display())]
    Load {
        path: PathBuf,
        #[source]
        source: Box<AnalyzeError>,
    },

    /// The report could not be written to its sink
    #[error("failed to write report: {0}")]
    Output(#[from] std::io::Error),

    /// A run-level field is missing or carries an unusable value
    #[error("malformed result: {0}")]
    MalformedResult(String),

    /// A successful connection item ended without defining a required field
    #[error("connection item {index} is missing required field `{field}`")]
    IncompleteRecord { index: usize, field: &'static str },

    /// Nothing to work on: no files, or an empty sample
    #[error("empty input: {0}")]
    EmptyInput(&'static str),

    /// A statistic needs more samples than were provided
    #[error("insufficient sample: {statistic} needs at least {required} values, got {actual}")]
    InsufficientSample {
        statistic: &'static str,
        required: usize,
        actual: usize,
    },

    /// A quantile outside of [0, 100] or not a finite number
    #[error("invalid quantile {0}: must be within [0, 100]")]
    InvalidQuantile(f64),
}

impl From<serde_json::Error> for AnalyzeError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_io() {
            return AnalyzeError::Read(err.into());
        }
        AnalyzeError::Parse {
            line: err.line(),
            column: err.column(),
            message: err.to_string(),
        }
    }
}
