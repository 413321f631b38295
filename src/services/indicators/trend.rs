//! Trend indicators: moving averages, MACD, DMI/ADX and a simplified SAR.

use super::rolling::{
    alpha_from_span, ewm, from_values, rolling_mean, rolling_min, zip_with, Series, EPSILON,
};

pub const MACD_FAST: usize = 12;
pub const MACD_SLOW: usize = 26;
pub const MACD_SIGNAL: usize = 9;
pub const DMI_PERIOD: usize = 14;
pub const SAR_WINDOW: usize = 5;

/// Simple moving average of the close.
pub fn sma(close: &[f64], window: usize) -> Series {
    rolling_mean(&from_values(close), window)
}

pub struct MacdColumns {
    pub macd: Series,
    pub signal: Series,
    pub hist: Series,
}

/// EMA(12) − EMA(26), its EMA(9) signal line and the histogram.
pub fn macd(close: &[f64]) -> MacdColumns {
    let close = from_values(close);
    let fast = ewm(&close, alpha_from_span(MACD_FAST));
    let slow = ewm(&close, alpha_from_span(MACD_SLOW));
    let macd = zip_with(&fast, &slow, |f, s| f - s);
    let signal = ewm(&macd, alpha_from_span(MACD_SIGNAL));
    let hist = zip_with(&macd, &signal, |m, s| m - s);
    MacdColumns { macd, signal, hist }
}

pub struct DmiColumns {
    pub plus: Series,
    pub minus: Series,
    pub adx: Series,
}

/// Directional movement normalised by ATR, and ADX as the rolling mean of
/// the directional index.
///
/// Upward and downward movement are both kept when positive on the same row.
pub fn dmi(high: &[f64], low: &[f64], atr: &[Option<f64>]) -> DmiColumns {
    let plus_dm: Series = (0..high.len())
        .map(|i| (i > 0).then(|| (high[i] - high[i - 1]).max(0.0)))
        .collect();
    let minus_dm: Series = (0..low.len())
        .map(|i| (i > 0).then(|| (low[i - 1] - low[i]).max(0.0)))
        .collect();

    let plus = zip_with(&rolling_mean(&plus_dm, DMI_PERIOD), atr, |dm, atr| {
        100.0 * dm / (atr + EPSILON)
    });
    let minus = zip_with(&rolling_mean(&minus_dm, DMI_PERIOD), atr, |dm, atr| {
        100.0 * dm / (atr + EPSILON)
    });
    let dx = zip_with(&plus, &minus, |p, m| 100.0 * (p - m).abs() / (p + m + EPSILON));
    let adx = rolling_mean(&dx, DMI_PERIOD);

    DmiColumns { plus, minus, adx }
}

/// Stop-and-reverse approximated by the 5-day low of the close.
pub fn sar(close: &[f64]) -> Series {
    rolling_min(&from_values(close), SAR_WINDOW)
}
