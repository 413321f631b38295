//! Point-forecast models.
//!
//! Three interchangeable strategies share the [`Forecaster`] contract:
//! train on an OHLCV series, forecast the next N sessions one step at a
//! time, and report in-sample fit quality. Each instance owns its fitted
//! state and lives for a single request.

pub mod catalog;
pub mod confidence;
pub mod ensemble;
pub mod linear;
pub mod rollout;
#[cfg(feature = "sequence-model")]
pub mod sequence;

pub use catalog::{EnsembleSettings, ModelCatalog, SequenceSettings};
pub use ensemble::EnsembleForecaster;
pub use linear::LinearForecaster;
#[cfg(feature = "sequence-model")]
pub use sequence::SequenceForecaster;

use ndarray::Array1;
use smartcore::metrics::r2;
use thiserror::Error;

use crate::services::indicators::compute_clean;
use crate::types::{
    FailureKind, FailureRecord, ForecastPoint, IndicatorRow, ModelKind, ModelMetrics, OhlcvBar,
};

/// Fewest raw bars the regression models accept.
pub const MIN_RAW_ROWS: usize = 30;
/// Fewest complete indicator rows the regression models accept.
pub const MIN_CLEAN_ROWS: usize = 20;

/// Forecast model errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ForecastError {
    #[error("Insufficient raw data: need at least {required} rows, got {actual}")]
    InsufficientRawData { required: usize, actual: usize },
    #[error("Insufficient clean rows after indicator computation: need at least {required}, got {actual}")]
    InsufficientCleanRows { required: usize, actual: usize },
    #[error("Model {0} is not available")]
    CapabilityUnavailable(ModelKind),
    #[error("Model has not been trained")]
    NotTrained,
    #[error("Model fit failed: {0}")]
    Fit(String),
}

impl ForecastError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::InsufficientRawData { .. } | Self::InsufficientCleanRows { .. } => {
                FailureKind::InsufficientData
            }
            Self::CapabilityUnavailable(_) => FailureKind::CapabilityUnavailable,
            Self::NotTrained => FailureKind::Internal,
            Self::Fit(_) => FailureKind::ModelFailure,
        }
    }
}

impl From<&ForecastError> for FailureRecord {
    fn from(err: &ForecastError) -> Self {
        FailureRecord::new(err.kind(), err.to_string())
    }
}

/// Row counts of a successful training run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrainingSummary {
    pub raw_rows: usize,
    pub clean_rows: usize,
    /// Samples actually fed to the regressor.
    pub samples: usize,
}

/// Common contract of every forecast model.
pub trait Forecaster: Send {
    fn kind(&self) -> ModelKind;

    /// Fit on an ascending OHLCV series.
    fn train(&mut self, bars: &[OhlcvBar]) -> Result<TrainingSummary, ForecastError>;

    /// Forecast the next `days` sessions, one step at a time.
    fn predict_next_days(&self, days: usize) -> Result<Vec<ForecastPoint>, ForecastError>;

    /// In-sample fit quality of the last training run.
    fn metrics(&self) -> Result<ModelMetrics, ForecastError>;

    /// Complete indicator rows of the last training run.
    fn training_rows(&self) -> &[IndicatorRow];
}

/// Run the indicator engine and enforce the regression-model minimums.
pub(crate) fn clean_training_rows(bars: &[OhlcvBar]) -> Result<Vec<IndicatorRow>, ForecastError> {
    if bars.len() < MIN_RAW_ROWS {
        return Err(ForecastError::InsufficientRawData {
            required: MIN_RAW_ROWS,
            actual: bars.len(),
        });
    }
    let rows = compute_clean(bars);
    if rows.len() < MIN_CLEAN_ROWS {
        return Err(ForecastError::InsufficientCleanRows {
            required: MIN_CLEAN_ROWS,
            actual: rows.len(),
        });
    }
    Ok(rows)
}

/// In-sample coefficient of determination. A constant target scores 1 when
/// matched exactly and 0 otherwise.
pub fn r2_score(actual: &Array1<f64>, predicted: &Array1<f64>) -> f64 {
    if actual.is_empty() || actual.len() != predicted.len() {
        return 0.0;
    }
    if actual.iter().all(|y| *y == actual[0]) {
        return if actual == predicted { 1.0 } else { 0.0 };
    }
    r2(actual, predicted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::indicators::test_support::wavy_bars;
    use ndarray::array;

    #[test]
    fn test_r2_perfect_and_mean() {
        let y = array![1.0, 2.0, 3.0, 4.0];
        assert_eq!(r2_score(&y, &y), 1.0);
        assert_eq!(r2_score(&y, &Array1::from_elem(4, 2.5)), 0.0);
        assert_eq!(r2_score(&Array1::zeros(0), &Array1::zeros(0)), 0.0);
    }

    #[test]
    fn test_r2_constant_target() {
        let y = Array1::from_elem(3, 7.0);
        assert_eq!(r2_score(&y, &y), 1.0);
        assert_eq!(r2_score(&y, &array![7.0, 7.5, 7.0]), 0.0);
    }

    #[test]
    fn test_clean_training_rows_raw_minimum() {
        let err = clean_training_rows(&wavy_bars(29)).unwrap_err();
        assert_eq!(
            err,
            ForecastError::InsufficientRawData {
                required: 30,
                actual: 29
            }
        );
        assert_eq!(err.kind(), FailureKind::InsufficientData);
    }

    #[test]
    fn test_clean_training_rows_clean_minimum() {
        // 59 bars survive the raw check but leave no complete rows.
        let err = clean_training_rows(&wavy_bars(59)).unwrap_err();
        assert!(matches!(
            err,
            ForecastError::InsufficientCleanRows { actual: 0, .. }
        ));
        let err = clean_training_rows(&wavy_bars(78)).unwrap_err();
        assert!(matches!(
            err,
            ForecastError::InsufficientCleanRows { actual: 19, .. }
        ));
        assert_eq!(clean_training_rows(&wavy_bars(79)).unwrap().len(), 20);
    }

    #[test]
    fn test_error_kinds_are_distinct() {
        let capability = ForecastError::CapabilityUnavailable(ModelKind::Sequence);
        let fit = ForecastError::Fit("singular".to_string());
        assert_eq!(capability.kind(), FailureKind::CapabilityUnavailable);
        assert_eq!(fit.kind(), FailureKind::ModelFailure);
        let record = FailureRecord::from(&capability);
        assert_eq!(record.kind, FailureKind::CapabilityUnavailable);
        assert!(record.message.contains("lstm"));
    }
}
