use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::OhlcvBar;

/// An OHLCV bar extended with every technical indicator.
///
/// A field is `None` while the row does not yet have enough look-back
/// history for that indicator, or when the value would not be finite.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct IndicatorValues {
    pub ma5: Option<f64>,
    pub ma10: Option<f64>,
    pub ma20: Option<f64>,
    pub ma60: Option<f64>,
    pub rsi: Option<f64>,
    pub macd: Option<f64>,
    pub macd_signal: Option<f64>,
    pub macd_hist: Option<f64>,
    pub kdj_k: Option<f64>,
    pub kdj_d: Option<f64>,
    pub kdj_j: Option<f64>,
    pub obv: Option<f64>,
    pub atr: Option<f64>,
    pub cci: Option<f64>,
    /// Simplified stop-and-reverse level: 5-day low of the close.
    pub sar: Option<f64>,
    pub bb_upper: Option<f64>,
    pub bb_middle: Option<f64>,
    pub bb_lower: Option<f64>,
    pub bb_width: Option<f64>,
    pub volume_change: Option<f64>,
    pub volume_ma5: Option<f64>,
    pub volume_ma20: Option<f64>,
    pub price_change: Option<f64>,
    pub price_change_5d: Option<f64>,
    pub price_change_20d: Option<f64>,
    pub williams_r: Option<f64>,
    pub dmi_plus: Option<f64>,
    pub dmi_minus: Option<f64>,
    pub adx: Option<f64>,
}

impl IndicatorValues {
    fn all(&self) -> [Option<f64>; 29] {
        [
            self.ma5,
            self.ma10,
            self.ma20,
            self.ma60,
            self.rsi,
            self.macd,
            self.macd_signal,
            self.macd_hist,
            self.kdj_k,
            self.kdj_d,
            self.kdj_j,
            self.obv,
            self.atr,
            self.cci,
            self.sar,
            self.bb_upper,
            self.bb_middle,
            self.bb_lower,
            self.bb_width,
            self.volume_change,
            self.volume_ma5,
            self.volume_ma20,
            self.price_change,
            self.price_change_5d,
            self.price_change_20d,
            self.williams_r,
            self.dmi_plus,
            self.dmi_minus,
            self.adx,
        ]
    }

    /// True when every indicator has a value.
    pub fn is_complete(&self) -> bool {
        self.all().iter().all(Option::is_some)
    }
}

/// One row of the indicator table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndicatorRow {
    #[serde(flatten)]
    pub bar: OhlcvBar,
    #[serde(flatten)]
    pub indicators: IndicatorValues,
}

impl IndicatorRow {
    pub fn date(&self) -> NaiveDate {
        self.bar.date
    }

    pub fn close(&self) -> f64 {
        self.bar.close
    }

    pub fn is_complete(&self) -> bool {
        self.indicators.is_complete()
    }
}

/// Chart projection of an indicator row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalPoint {
    pub date: NaiveDate,
    pub actual_price: f64,
    pub ma5: Option<f64>,
    pub ma10: Option<f64>,
    pub ma20: Option<f64>,
}

impl From<&IndicatorRow> for HistoricalPoint {
    fn from(row: &IndicatorRow) -> Self {
        Self {
            date: row.bar.date,
            actual_price: row.bar.close,
            ma5: row.indicators.ma5,
            ma10: row.indicators.ma10,
            ma20: row.indicators.ma20,
        }
    }
}
