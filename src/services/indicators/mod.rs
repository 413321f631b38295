//! Indicator engine.
//!
//! Turns an ascending OHLCV series into [`IndicatorRow`]s carrying every
//! technical indicator. The output has the same length and order as the
//! input. Leading rows hold `None` for indicators whose look-back window is
//! longer than the row's position; the longest window is 60 sessions.
//!
//! Callers must reject an empty series before computing indicators.

pub mod momentum;
pub mod rolling;
pub mod trend;
pub mod volatility;
pub mod volume;

use crate::types::{IndicatorRow, IndicatorValues, OhlcvBar};

/// Index of the first row that can be complete.
pub const WARMUP_ROWS: usize = 59;

/// Compute every indicator over `bars`.
pub fn compute_indicators(bars: &[OhlcvBar]) -> Vec<IndicatorRow> {
    let high: Vec<f64> = bars.iter().map(|b| b.high).collect();
    let low: Vec<f64> = bars.iter().map(|b| b.low).collect();
    let close: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let vol: Vec<f64> = bars.iter().map(|b| b.volume).collect();

    let ma5 = trend::sma(&close, 5);
    let ma10 = trend::sma(&close, 10);
    let ma20 = trend::sma(&close, 20);
    let ma60 = trend::sma(&close, 60);
    let macd = trend::macd(&close);
    let sar = trend::sar(&close);

    let rsi = momentum::rsi(&close);
    let kdj = momentum::kdj(&high, &low, &close);
    let cci = momentum::cci(&high, &low, &close);
    let williams = momentum::williams_r(&high, &low, &close);
    let change_1d = momentum::rate_of_change(&close, 1);
    let change_5d = momentum::rate_of_change(&close, 5);
    let change_20d = momentum::rate_of_change(&close, 20);

    let atr = volatility::atr(&high, &low, &close);
    let bb = volatility::bollinger(&close);
    let dmi = trend::dmi(&high, &low, &atr);

    let obv = volume::obv(&close, &vol);
    let vol_change = volume::volume_change(&vol);
    let vol_ma5 = volume::volume_ma(&vol, volume::VOLUME_SHORT);
    let vol_ma20 = volume::volume_ma(&vol, volume::VOLUME_LONG);

    bars.iter()
        .enumerate()
        .map(|(i, bar)| IndicatorRow {
            bar: *bar,
            indicators: IndicatorValues {
                ma5: ma5[i],
                ma10: ma10[i],
                ma20: ma20[i],
                ma60: ma60[i],
                rsi: rsi[i],
                macd: macd.macd[i],
                macd_signal: macd.signal[i],
                macd_hist: macd.hist[i],
                kdj_k: kdj.k[i],
                kdj_d: kdj.d[i],
                kdj_j: kdj.j[i],
                obv: obv[i],
                atr: atr[i],
                cci: cci[i],
                sar: sar[i],
                bb_upper: bb.upper[i],
                bb_middle: bb.middle[i],
                bb_lower: bb.lower[i],
                bb_width: bb.width[i],
                volume_change: vol_change[i],
                volume_ma5: vol_ma5[i],
                volume_ma20: vol_ma20[i],
                price_change: change_1d[i],
                price_change_5d: change_5d[i],
                price_change_20d: change_20d[i],
                williams_r: williams[i],
                dmi_plus: dmi.plus[i],
                dmi_minus: dmi.minus[i],
                adx: dmi.adx[i],
            },
        })
        .collect()
}

/// Drop every row with a missing indicator.
pub fn clean_rows(rows: &[IndicatorRow]) -> Vec<IndicatorRow> {
    rows.iter().filter(|r| r.is_complete()).copied().collect()
}

/// Compute indicators and keep only complete rows.
pub fn compute_clean(bars: &[OhlcvBar]) -> Vec<IndicatorRow> {
    clean_rows(&compute_indicators(bars))
}

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::{Duration, NaiveDate};

    use crate::types::OhlcvBar;

    pub fn start_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 1, 2).unwrap()
    }

    /// Linear trend with a ±1% daily range and constant volume.
    pub fn trending_bars(count: usize, start: f64, step: f64) -> Vec<OhlcvBar> {
        (0..count)
            .map(|i| {
                let close = start + step * i as f64;
                OhlcvBar {
                    date: start_date() + Duration::days(i as i64),
                    open: close - step / 2.0,
                    high: close * 1.01,
                    low: close * 0.99,
                    close,
                    volume: 1_000_000.0,
                }
            })
            .collect()
    }

    /// Identical OHLC every session.
    pub fn flat_bars(count: usize, price: f64) -> Vec<OhlcvBar> {
        (0..count)
            .map(|i| OhlcvBar {
                date: start_date() + Duration::days(i as i64),
                open: price,
                high: price,
                low: price,
                close: price,
                volume: 1_000_000.0,
            })
            .collect()
    }

    /// Deterministic oscillating series around a drift.
    pub fn wavy_bars(count: usize) -> Vec<OhlcvBar> {
        (0..count)
            .map(|i| {
                let t = i as f64;
                let close = 100.0 + 0.1 * t + 5.0 * (t / 7.0).sin() + 2.0 * (t / 3.0).cos();
                OhlcvBar {
                    date: start_date() + Duration::days(i as i64),
                    open: close - 0.3 * (t / 5.0).sin(),
                    high: close + 1.0 + 0.5 * (t / 4.0).sin().abs(),
                    low: close - 1.0 - 0.5 * (t / 6.0).cos().abs(),
                    close,
                    volume: 1_000_000.0 + 200_000.0 * (t / 9.0).sin(),
                }
            })
            .collect()
    }
}
