use crate::error::{AnalyzeError, Result};
use serde::{Deserialize, Serialize};

/// Parts-per-million resolution of a quantile's tail fraction
const TAIL_SCALE: u128 = 1_000_000;

/// Percentile threshold such as 99.9
///
/// The tail fraction `(100 - q) / 100` is stored as an integer number of
/// parts per million so rank selection is exact integer arithmetic: 99.9 and
/// 99.99 do not drift through floating point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quantile {
    percent: f64,
    tail_ppm: u64,
}

impl Quantile {
    pub fn new(percent: f64) -> Result<Self> {
        if !percent.is_finite() || !(0.0..=100.0).contains(&percent) {
            return Err(AnalyzeError::InvalidQuantile(percent));
        }
        let tail_ppm = ((100.0 - percent) * 10_000.0).round() as u64;
        Ok(Self { percent, tail_ppm })
    }

    pub fn percent(&self) -> f64 {
        self.percent
    }

    /// Sorted-order index selected for a sample of `len` values
    ///
    /// `len - floor(len * tail)`, clamped to the last element. With a sample
    /// smaller than the quantile's resolution (e.g. q99.99 with fewer than
    /// 10000 values) the floored tail count is zero and the maximum is picked.
    pub fn rank(&self, len: usize) -> usize {
        let tail = (len as u128 * self.tail_ppm as u128 / TAIL_SCALE) as usize;
        len.saturating_sub(tail).min(len.saturating_sub(1))
    }
}

/// Percentile value pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PercentileValue {
    pub percentile: f64,
    pub value_us: u64,
}

/// Summary statistics over one sample, in the sample's unit (microseconds)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsSummary {
    pub total_samples: usize,
    pub min_us: u64,
    pub max_us: u64,
    pub mean_us: f64,
    /// `None` when the sample holds a single value
    pub std_dev_us: Option<f64>,
    pub median_us: u64,
    pub percentiles: Vec<PercentileValue>,
}

/// A non-empty, ascending-sorted sample
#[derive(Debug, Clone)]
pub struct Sample {
    sorted: Vec<u64>,
}

impl Sample {
    pub fn new(mut values: Vec<u64>) -> Result<Self> {
        if values.is_empty() {
            return Err(AnalyzeError::EmptyInput("no samples to summarize"));
        }
        values.sort_unstable();
        Ok(Self { sorted: values })
    }

    pub fn min(&self) -> u64 {
        self.sorted[0]
    }

    pub fn max(&self) -> u64 {
        self.sorted[self.sorted.len() - 1]
    }

    pub fn mean(&self) -> f64 {
        let sum: u128 = self.sorted.iter().map(|&v| v as u128).sum();
        sum as f64 / self.sorted.len() as f64
    }

    /// Sample standard deviation (divisor `n - 1`)
    pub fn std_dev(&self) -> Result<f64> {
        let n = self.sorted.len();
        if n < 2 {
            return Err(AnalyzeError::InsufficientSample {
                statistic: "standard deviation",
                required: 2,
                actual: n,
            });
        }
        let mean = self.mean();
        let squares: f64 = self
            .sorted
            .iter()
            .map(|&v| {
                let d = v as f64 - mean;
                d * d
            })
            .sum();
        Ok((squares / (n - 1) as f64).sqrt())
    }

    /// Value at rank `floor(n / 2)`: the upper median for even sizes
    pub fn median(&self) -> u64 {
        self.sorted[self.sorted.len() / 2]
    }

    pub fn percentile(&self, quantile: Quantile) -> u64 {
        self.sorted[quantile.rank(self.sorted.len())]
    }

    pub fn summarize(&self, quantiles: &[Quantile]) -> StatsSummary {
        StatsSummary {
            total_samples: self.sorted.len(),
            min_us: self.min(),
            max_us: self.max(),
            mean_us: self.mean(),
            std_dev_us: self.std_dev().ok(),
            median_us: self.median(),
            percentiles: quantiles
                .iter()
                .map(|&q| PercentileValue {
                    percentile: q.percent(),
                    value_us: self.percentile(q),
                })
                .collect(),
        }
    }
}
