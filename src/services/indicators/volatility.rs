//! Volatility indicators: true range, ATR and Bollinger bands.

use super::rolling::{from_values, rolling_mean, rolling_std, zip_with, Series};

pub const ATR_PERIOD: usize = 14;
pub const BOLLINGER_PERIOD: usize = 20;
pub const BOLLINGER_STD: f64 = 2.0;

/// True range. The first row has no previous close and uses `high − low`.
pub fn true_range(high: &[f64], low: &[f64], close: &[f64]) -> Series {
    (0..close.len())
        .map(|i| {
            let hl = high[i] - low[i];
            if i == 0 {
                return Some(hl);
            }
            let prev = close[i - 1];
            Some(hl.max((high[i] - prev).abs()).max((low[i] - prev).abs()))
        })
        .collect()
}

pub fn atr(high: &[f64], low: &[f64], close: &[f64]) -> Series {
    rolling_mean(&true_range(high, low, close), ATR_PERIOD)
}

pub struct BollingerColumns {
    pub upper: Series,
    pub middle: Series,
    pub lower: Series,
    /// `(upper − lower) / middle`.
    pub width: Series,
}

pub fn bollinger(close: &[f64]) -> BollingerColumns {
    let close = from_values(close);
    let middle = rolling_mean(&close, BOLLINGER_PERIOD);
    let std = rolling_std(&close, BOLLINGER_PERIOD);
    let upper = zip_with(&middle, &std, |m, s| m + BOLLINGER_STD * s);
    let lower = zip_with(&middle, &std, |m, s| m - BOLLINGER_STD * s);
    let spread = zip_with(&upper, &lower, |u, l| u - l);
    let width = zip_with(&spread, &middle, |s, m| s / m);
    BollingerColumns {
        upper,
        middle,
        lower,
        width,
    }
}
