//! # wsperf Result File Loader
//!
//! Folds the token stream of one wsperf result file into a [`RunResult`].
//!
//! ## Input Shape
//!
//! ```text
//! {
//!   "started": <epoch us>, "ended": <epoch us>, "total_duration": <us>,
//!   "connection_stats": [
//!     {"tcp_pre_init": <us>, "open": <us>, "close": <us>, "failed": <bool>, ...},
//!     ...
//!   ],
//!   ...
//! }
//! ```
//!
//! Only the paths listed in [`RecognizedPath`] are looked at. Unknown fields,
//! wherever they occur, are skipped so newer wsperf builds that add fields
//! still load.
//!
//! ## Connection Items
//!
//! Each `connection_stats` element opens a fresh [`ConnectionRecord`] that is
//! filled in whatever order its fields arrive and consumed once at the
//! element's closing brace. A successful connection must define `open`,
//! `close` and `tcp_pre_init`; a failed one only contributes to the counters.

use crate::error::{AnalyzeError, Result};
use crate::results::RunResult;
use crate::stream::{self, Event, JsonPath, PathSegment, ScalarValue, TokenSink};
use serde_json::Number;
use std::io::Read;
use std::path::Path;
use tracing::{debug, trace, warn};

const CONNECTION_STATS: &str = "connection_stats";

/// Document locations the loader reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecognizedPath {
    TotalDuration,
    Started,
    Ended,
    ConnectionItem,
    PreInit,
    Failed,
    Open,
    Close,
}

impl RecognizedPath {
    pub fn classify(path: &JsonPath) -> Option<Self> {
        match path.segments() {
            [PathSegment::Key(key)] => match key.as_str() {
                "total_duration" => Some(Self::TotalDuration),
                "started" => Some(Self::Started),
                "ended" => Some(Self::Ended),
                _ => None,
            },
            [PathSegment::Key(array), PathSegment::Item] if array == CONNECTION_STATS => {
                Some(Self::ConnectionItem)
            }
            [PathSegment::Key(array), PathSegment::Item, PathSegment::Key(field)]
                if array == CONNECTION_STATS =>
            {
                match field.as_str() {
                    "tcp_pre_init" => Some(Self::PreInit),
                    "failed" => Some(Self::Failed),
                    "open" => Some(Self::Open),
                    "close" => Some(Self::Close),
                    _ => None,
                }
            }
            _ => None,
        }
    }

    fn field_name(self) -> &'static str {
        match self {
            Self::TotalDuration => "total_duration",
            Self::Started => "started",
            Self::Ended => "ended",
            Self::ConnectionItem => "connection_stats.item",
            Self::PreInit => "tcp_pre_init",
            Self::Failed => "failed",
            Self::Open => "open",
            Self::Close => "close",
        }
    }
}

/// In-progress state of one `connection_stats` element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionRecord {
    index: usize,
    pre_init: Option<u64>,
    failed: Option<bool>,
    open: Option<u64>,
    close: Option<u64>,
}

/// What a finished connection contributes to its run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Success { pre_init: u64, open: u64, close: u64 },
    Failed,
}

impl ConnectionRecord {
    fn new(index: usize) -> Self {
        Self {
            index,
            pre_init: None,
            failed: None,
            open: None,
            close: None,
        }
    }

    fn finish(self) -> Result<Outcome> {
        // An item without a `failed` member is a success.
        if self.failed.unwrap_or(false) {
            return Ok(Outcome::Failed);
        }
        let require = |value: Option<u64>, field: &'static str| {
            value.ok_or(AnalyzeError::IncompleteRecord {
                index: self.index,
                field,
            })
        };
        Ok(Outcome::Success {
            pre_init: require(self.pre_init, "tcp_pre_init")?,
            open: require(self.open, "open")?,
            close: require(self.close, "close")?,
        })
    }
}

/// Token sink that builds the [`RunResult`] of a single file
#[derive(Debug, Default)]
pub struct RunAccumulator {
    result: RunResult,
    reported_duration: Option<u64>,
    started: Option<u64>,
    ended: Option<u64>,
    current: Option<ConnectionRecord>,
    items_seen: usize,
}

impl RunAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate run-level fields and produce the run
    pub fn finish(self) -> Result<RunResult> {
        let missing =
            |field: &str| AnalyzeError::MalformedResult(format!("missing run-level field `{}`", field));

        let reported_duration = self.reported_duration.ok_or_else(|| missing("total_duration"))?;
        let started = self.started.ok_or_else(|| missing("started"))?;
        let ended = self.ended.ok_or_else(|| missing("ended"))?;

        // wsperf writes `ended: 0` for runs it did not finish cleanly.
        if ended < started {
            warn!(
                "Run ended ({}) before it started ({}); wall-clock duration is zero",
                ended, started
            );
        }

        let mut result = self.result;
        result.reported_duration_micros = reported_duration;
        result.started_at_micros = started;
        result.ended_at_micros = ended;
        result.wall_clock_duration_micros = ended.saturating_sub(started);
        result.total_count = result.success_count + result.fail_count;
        Ok(result)
    }

    fn on_scalar(&mut self, target: RecognizedPath, value: &ScalarValue) -> Result<()> {
        match target {
            RecognizedPath::TotalDuration => self.reported_duration = Some(micros(target, value)?),
            RecognizedPath::Started => self.started = Some(micros(target, value)?),
            RecognizedPath::Ended => self.ended = Some(micros(target, value)?),
            RecognizedPath::ConnectionItem => {}
            RecognizedPath::PreInit => self.record_mut(target)?.pre_init = Some(micros(target, value)?),
            RecognizedPath::Open => self.record_mut(target)?.open = Some(micros(target, value)?),
            RecognizedPath::Close => self.record_mut(target)?.close = Some(micros(target, value)?),
            RecognizedPath::Failed => {
                let failed = match value {
                    ScalarValue::Boolean(b) => *b,
                    other => return Err(unexpected(target, "a boolean", other)),
                };
                self.record_mut(target)?.failed = Some(failed);
            }
        }
        Ok(())
    }

    fn record_mut(&mut self, target: RecognizedPath) -> Result<&mut ConnectionRecord> {
        self.current.as_mut().ok_or_else(|| {
            AnalyzeError::MalformedResult(format!(
                "`{}` found outside of a connection_stats object",
                target.field_name()
            ))
        })
    }

    fn start_item(&mut self) {
        self.current = Some(ConnectionRecord::new(self.items_seen));
        self.items_seen += 1;
    }

    fn end_item(&mut self) -> Result<()> {
        let record = match self.current.take() {
            Some(record) => record,
            None => return Ok(()),
        };
        let index = record.index;
        match record.finish()? {
            Outcome::Success {
                pre_init,
                open,
                close,
            } => self.result.record_success(pre_init, open, close),
            Outcome::Failed => {
                trace!("Connection {} failed", index);
                self.result.record_failure();
            }
        }
        Ok(())
    }
}

impl TokenSink for RunAccumulator {
    fn token(&mut self, path: &JsonPath, event: Event) -> Result<()> {
        let target = match RecognizedPath::classify(path) {
            Some(target) => target,
            None => return Ok(()),
        };
        match (target, event) {
            (RecognizedPath::ConnectionItem, Event::StartMap) => self.start_item(),
            (RecognizedPath::ConnectionItem, Event::EndMap) => self.end_item()?,
            (_, Event::Scalar(value)) => self.on_scalar(target, &value)?,
            _ => {}
        }
        Ok(())
    }
}

/// Non-negative integer microseconds; integral floats are accepted
fn micros(target: RecognizedPath, value: &ScalarValue) -> Result<u64> {
    match value {
        ScalarValue::Number(n) => number_to_u64(n).ok_or_else(|| {
            AnalyzeError::MalformedResult(format!(
                "`{}` must be a non-negative integer, got {}",
                target.field_name(),
                n
            ))
        }),
        other => Err(unexpected(target, "a number", other)),
    }
}

fn number_to_u64(n: &Number) -> Option<u64> {
    if let Some(v) = n.as_u64() {
        return Some(v);
    }
    match n.as_f64() {
        Some(f) if f >= 0.0 && f.fract() == 0.0 && f <= u64::MAX as f64 => Some(f as u64),
        _ => None,
    }
}

fn unexpected(target: RecognizedPath, expected: &str, got: &ScalarValue) -> AnalyzeError {
    AnalyzeError::MalformedResult(format!(
        "`{}` must be {}, got {:?}",
        target.field_name(),
        expected,
        got
    ))
}

/// Load one result document from a reader
pub fn load_reader<R: Read>(reader: R) -> Result<RunResult> {
    let mut accumulator = RunAccumulator::new();
    stream::parse_reader(reader, &mut accumulator)?;
    accumulator.finish()
}

/// Load one result file from disk
///
/// Errors are wrapped with the offending path; I/O errors already carry it.
pub fn load_file(path: &Path) -> Result<RunResult> {
    let mut accumulator = RunAccumulator::new();
    let result = stream::parse_file(path, &mut accumulator)
        .and_then(|()| accumulator.finish())
        .map_err(|err| match err {
            err @ AnalyzeError::Io { .. } => err,
            err => AnalyzeError::Load {
                path: path.to_path_buf(),
                source: Box::new(err),
            },
        })?;

    debug!(
        "Loaded {}: {} connections ({} failed), {} us wall clock",
        path.display(),
        result.total_count,
        result.fail_count,
        result.wall_clock_duration_micros
    );
    Ok(result)
}
