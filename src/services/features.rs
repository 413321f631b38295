//! Feature extraction and scaling.
//!
//! Every model reads the same 27 indicator columns in a fixed order. The
//! sequence model additionally prepends the close as column zero, which is
//! also its target.

use ndarray::{Array1, Array2, Axis, Zip};

use crate::services::indicators::rolling::last_valid;
use crate::types::{IndicatorRow, IndicatorValues};

pub const FEATURE_COUNT: usize = 27;

pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "MA5",
    "MA10",
    "MA20",
    "MA60",
    "RSI",
    "KDJ_K",
    "KDJ_D",
    "KDJ_J",
    "CCI",
    "Williams_R",
    "MACD",
    "MACD_Signal",
    "MACD_Hist",
    "DMI_Plus",
    "DMI_Minus",
    "ADX",
    "ATR",
    "BB_Upper",
    "BB_Lower",
    "BB_Width",
    "Volume_Change",
    "Volume_MA5",
    "Volume_MA20",
    "OBV",
    "Price_Change",
    "Price_Change_5d",
    "Price_Change_20d",
];

/// The 27 feature values of one row, in [`FEATURE_NAMES`] order.
pub fn raw_features(v: &IndicatorValues) -> [Option<f64>; FEATURE_COUNT] {
    [
        v.ma5,
        v.ma10,
        v.ma20,
        v.ma60,
        v.rsi,
        v.kdj_k,
        v.kdj_d,
        v.kdj_j,
        v.cci,
        v.williams_r,
        v.macd,
        v.macd_signal,
        v.macd_hist,
        v.dmi_plus,
        v.dmi_minus,
        v.adx,
        v.atr,
        v.bb_upper,
        v.bb_lower,
        v.bb_width,
        v.volume_change,
        v.volume_ma5,
        v.volume_ma20,
        v.obv,
        v.price_change,
        v.price_change_5d,
        v.price_change_20d,
    ]
}

/// Feature values of one row with missing entries replaced by zero.
pub fn feature_array(v: &IndicatorValues) -> [f64; FEATURE_COUNT] {
    raw_features(v).map(|x| x.unwrap_or(0.0))
}

/// Features of every clean row but the last, paired with the close of the
/// session that follows it.
pub fn training_set(rows: &[IndicatorRow]) -> (Array2<f64>, Array1<f64>) {
    let samples = rows.len().saturating_sub(1);
    let features: Vec<[f64; FEATURE_COUNT]> = rows[..samples]
        .iter()
        .map(|r| feature_array(&r.indicators))
        .collect();
    let x = Array2::from_shape_fn((samples, FEATURE_COUNT), |(i, j)| features[i][j]);
    let y = rows.iter().skip(1).map(IndicatorRow::close).collect();
    (x, y)
}

/// Features of the last row, where each missing value falls back to the
/// latest earlier value of the same column, then to zero.
pub fn latest_features_filled(rows: &[IndicatorRow]) -> Array1<f64> {
    let Some(last) = rows.len().checked_sub(1) else {
        return Array1::zeros(FEATURE_COUNT);
    };
    let columns: Vec<[Option<f64>; FEATURE_COUNT]> =
        rows.iter().map(|r| raw_features(&r.indicators)).collect();

    (0..FEATURE_COUNT)
        .map(|col| {
            let column: Vec<Option<f64>> = columns.iter().map(|c| c[col]).collect();
            last_valid(&column, last).unwrap_or(0.0)
        })
        .collect()
}

/// Close followed by the 27 features for every row, for the sequence model.
pub fn sequence_matrix(rows: &[IndicatorRow]) -> Array2<f64> {
    let features: Vec<[f64; FEATURE_COUNT]> =
        rows.iter().map(|r| feature_array(&r.indicators)).collect();
    Array2::from_shape_fn((rows.len(), FEATURE_COUNT + 1), |(i, j)| match j {
        0 => rows[i].close(),
        _ => features[i][j - 1],
    })
}

// =============================================================================
// Scalers
// =============================================================================

/// Columns whose spread is below this fraction of their magnitude are
/// treated as constant. Float noise on a saturated indicator stays under it.
const NEGLIGIBLE_SPREAD: f64 = 1e-8;

/// Zero-mean, unit-variance scaling fitted per column.
#[derive(Debug, Clone, PartialEq)]
pub struct StandardScaler {
    mean: Array1<f64>,
    scale: Array1<f64>,
}

impl StandardScaler {
    /// Fit on a sample matrix. Constant columns keep a scale of 1.
    pub fn fit(x: &Array2<f64>) -> Self {
        let mean = x
            .mean_axis(Axis(0))
            .unwrap_or_else(|| Array1::zeros(x.ncols()));
        let std = x.std_axis(Axis(0), 0.0);
        let scale = Zip::from(&std).and(&mean).map_collect(|&s, &m| {
            if s > NEGLIGIBLE_SPREAD * m.abs().max(1.0) {
                s
            } else {
                1.0
            }
        });
        Self { mean, scale }
    }

    pub fn transform(&self, x: &Array2<f64>) -> Array2<f64> {
        (x - &self.mean) / &self.scale
    }

    pub fn transform_row(&self, row: &Array1<f64>) -> Array1<f64> {
        (row - &self.mean) / &self.scale
    }
}

/// Per-column scaling to [0, 1].
#[derive(Debug, Clone, PartialEq)]
pub struct MinMaxScaler {
    min: Array1<f64>,
    range: Array1<f64>,
}

impl MinMaxScaler {
    /// Fit on a sample matrix. Constant columns keep a range of 1.
    pub fn fit(x: &Array2<f64>) -> Self {
        let min = x.fold_axis(Axis(0), f64::INFINITY, |acc, &v| acc.min(v));
        let max = x.fold_axis(Axis(0), f64::NEG_INFINITY, |acc, &v| acc.max(v));
        let range = Zip::from(&max)
            .and(&min)
            .map_collect(|&hi, &lo| if hi - lo > 0.0 { hi - lo } else { 1.0 });
        Self { min, range }
    }

    pub fn transform(&self, x: &Array2<f64>) -> Array2<f64> {
        (x - &self.min) / &self.range
    }

    /// Map a scaled value of column `col` back to its original units.
    pub fn inverse(&self, col: usize, scaled: f64) -> f64 {
        match (self.min.get(col), self.range.get(col)) {
            (Some(lo), Some(r)) => scaled * r + lo,
            _ => scaled,
        }
    }
}
