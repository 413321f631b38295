use std::ops::RangeInclusive;

use thiserror::Error;

/// Valid forecast horizon in days.
pub const FORECAST_DAYS: RangeInclusive<u32> = 1..=90;
/// Valid backtest validation window in days.
pub const BACKTEST_DAYS: RangeInclusive<u32> = 7..=90;
/// Valid forecast horizon when a forecast feeds the signal analyzer.
pub const SIGNAL_PREDICTION_DAYS: RangeInclusive<u32> = 1..=30;
/// Valid replay window for signal history.
pub const SIGNAL_HISTORY_DAYS: RangeInclusive<u32> = 7..=90;

/// Unsupported request configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParameterError {
    #[error("Unsupported model type: {0} (expected linear, random_forest or lstm)")]
    UnknownModel(String),
    #[error("Unsupported training period: {0} (expected 1mo, 3mo, 6mo, 1y, 2y, 5y or max)")]
    UnknownPeriod(String),
    #[error("{name} must be between {min} and {max}, got {value}")]
    OutOfRange {
        name: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },
    #[error("Invalid date range: {0}")]
    InvalidDateRange(String),
}

/// Check that `value` lies within `range`.
pub fn ensure_in_range(
    name: &'static str,
    value: u32,
    range: &RangeInclusive<u32>,
) -> Result<u32, ParameterError> {
    if range.contains(&value) {
        Ok(value)
    } else {
        Err(ParameterError::OutOfRange {
            name,
            value: value as i64,
            min: *range.start() as i64,
            max: *range.end() as i64,
        })
    }
}
