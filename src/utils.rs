//! # Utility Functions and Helper Module
//!
//! Small numeric and formatting helpers shared by the result model and the
//! report renderer.
//!
//! ## Key Functionality Categories
//!
//! - **Guarded arithmetic**: ratios that turn a zero denominator into `None`
//! - **Unit conversion**: microsecond values rendered as milliseconds
//! - **Timestamps**: epoch microseconds rendered as RFC 3339 UTC
//!
//! ## Usage Examples
//!
//! ```rust
//! use wsperf_analyze::utils::*;
//!
//! assert_eq!(ratio(1.0, 4.0), Some(0.25));
//! assert_eq!(ratio(1.0, 0.0), None);
//! assert_eq!(micros_to_millis(1500), 1.5);
//! assert_eq!(format_epoch_micros(0), "unknown");
//! ```

use chrono::{DateTime, SecondsFormat, Utc};

/// Divide `numerator` by `denominator`, or `None` when the result is undefined
///
/// ## Returns
/// - `Some(numerator / denominator)` for a non-zero, finite quotient input
/// - `None` when the denominator is zero or the quotient is not finite
///
/// ## Usage
///
/// Report rates (fail percentage, handshakes per second) are printed as
/// "undefined" instead of `NaN` or `inf` when a run has no connections or a
/// zero-length wall clock.
pub fn ratio(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator == 0.0 {
        return None;
    }
    let value = numerator / denominator;
    value.is_finite().then_some(value)
}

/// Convert microseconds to fractional milliseconds
pub fn micros_to_millis(us: u64) -> f64 {
    us as f64 / 1_000.0
}

/// Render an epoch-microsecond timestamp as an RFC 3339 UTC string
///
/// A zero timestamp means the source file did not carry a usable start or
/// end time and is shown as `unknown`, as are values outside chrono's range.
///
/// ## Examples
///
/// ```rust
/// # use wsperf_analyze::utils::format_epoch_micros;
/// assert_eq!(
///     format_epoch_micros(1_700_000_000_123_456),
///     "2023-11-14T22:13:20.123456Z"
/// );
/// ```
pub fn format_epoch_micros(us: u64) -> String {
    if us == 0 {
        return "unknown".to_string();
    }
    i64::try_from(us)
        .ok()
        .and_then(DateTime::<Utc>::from_timestamp_micros)
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Micros, true))
        .unwrap_or_else(|| "unknown".to_string())
}
