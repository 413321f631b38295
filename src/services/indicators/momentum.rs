//! Oscillators: RSI, KDJ, CCI, Williams %R and plain rate of change.

use super::rolling::{
    alpha_from_com, ewm, from_values, pct_change, rolling_mad, rolling_max, rolling_mean,
    rolling_min, zip_with, Series, EPSILON,
};

pub const RSI_PERIOD: usize = 14;
pub const KDJ_WINDOW: usize = 9;
pub const KDJ_COM: f64 = 2.0;
pub const CCI_PERIOD: usize = 20;
pub const WILLIAMS_WINDOW: usize = 9;

/// RSI over a simple rolling mean of gains and losses.
///
/// The first row has no delta and counts as an unchanged session. When both
/// averages fall under [`EPSILON`] the market is flat and RSI reads 50; when
/// only the loss average does, RSI reads 100.
pub fn rsi(close: &[f64]) -> Series {
    let deltas: Vec<f64> = (0..close.len())
        .map(|i| if i == 0 { 0.0 } else { close[i] - close[i - 1] })
        .collect();
    let gains: Series = deltas.iter().map(|d| Some(d.max(0.0))).collect();
    let losses: Series = deltas.iter().map(|d| Some((-d).max(0.0))).collect();

    zip_with(
        &rolling_mean(&gains, RSI_PERIOD),
        &rolling_mean(&losses, RSI_PERIOD),
        |gain, loss| {
            if loss < EPSILON {
                if gain < EPSILON {
                    50.0
                } else {
                    100.0
                }
            } else {
                100.0 - 100.0 / (1.0 + gain / loss)
            }
        },
    )
}

pub struct KdjColumns {
    pub k: Series,
    pub d: Series,
    pub j: Series,
}

/// Stochastic KDJ: RSV over 9 sessions smoothed twice with `com = 2`.
pub fn kdj(high: &[f64], low: &[f64], close: &[f64]) -> KdjColumns {
    let low_n = rolling_min(&from_values(low), KDJ_WINDOW);
    let high_n = rolling_max(&from_values(high), KDJ_WINDOW);
    let range = zip_with(&high_n, &low_n, |h, l| h - l + EPSILON);
    let above_low = zip_with(&from_values(close), &low_n, |c, l| c - l);
    let rsv = zip_with(&above_low, &range, |num, den| num / den * 100.0);

    let alpha = alpha_from_com(KDJ_COM);
    let k = ewm(&rsv, alpha);
    let d = ewm(&k, alpha);
    let j = zip_with(&k, &d, |k, d| 3.0 * k - 2.0 * d);
    KdjColumns { k, d, j }
}

/// Commodity channel index on the typical price.
pub fn cci(high: &[f64], low: &[f64], close: &[f64]) -> Series {
    let typical: Series = (0..close.len())
        .map(|i| Some((high[i] + low[i] + close[i]) / 3.0))
        .collect();
    let sma = rolling_mean(&typical, CCI_PERIOD);
    let mad = rolling_mad(&typical, CCI_PERIOD);
    let deviation = zip_with(&typical, &sma, |tp, m| tp - m);
    zip_with(&deviation, &mad, |dev, mad| dev / (0.015 * mad + EPSILON))
}

/// Williams %R in [−100, 0].
pub fn williams_r(high: &[f64], low: &[f64], close: &[f64]) -> Series {
    let high_n = rolling_max(&from_values(high), WILLIAMS_WINDOW);
    let low_n = rolling_min(&from_values(low), WILLIAMS_WINDOW);
    let range = zip_with(&high_n, &low_n, |h, l| h - l + EPSILON);
    let below_high = zip_with(&high_n, &from_values(close), |h, c| h - c);
    zip_with(&below_high, &range, |num, den| -100.0 * num / den)
}

/// Fractional change of the close over `periods` sessions.
pub fn rate_of_change(close: &[f64], periods: usize) -> Series {
    pct_change(close, periods)
}
