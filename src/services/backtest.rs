//! Walk-forward backtesting.
//!
//! The fetched history is cut at `len - N`: the model trains on the head
//! only and forecasts N sessions, which are paired positionally with the
//! held-out tail.

use thiserror::Error;
use tracing::{debug, info};

use crate::services::forecast::{ForecastError, ModelCatalog};
use crate::services::signals::round2;
use crate::types::{
    BacktestMetrics, BacktestResult, BestBacktestModel, ComparisonPoint, FailureKind,
    FailureRecord, ForecastPoint, ModelKind, ModelRun, OhlcvBar, TrainingPeriod,
};

/// Fewest fetched rows, and fewest rows left for training after the split.
pub const MIN_BACKTEST_ROWS: usize = 60;
/// A forecast within this many percent of the actual price counts as a win.
pub const WIN_THRESHOLD_PCT: f64 = 5.0;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum BacktestError {
    #[error("Insufficient history for a backtest: need at least {required} rows, got {actual}")]
    InsufficientHistory { required: usize, actual: usize },
    #[error("Insufficient training data: need at least {required} rows before the split, got {actual}")]
    InsufficientTrainingRows { required: usize, actual: usize },
    #[error("Model produced no forecast")]
    EmptyForecast,
    #[error(transparent)]
    Forecast(#[from] ForecastError),
}

impl BacktestError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::InsufficientHistory { .. } | Self::InsufficientTrainingRows { .. } => {
                FailureKind::InsufficientData
            }
            Self::EmptyForecast => FailureKind::ModelFailure,
            Self::Forecast(e) => e.kind(),
        }
    }
}

impl From<&BacktestError> for FailureRecord {
    fn from(err: &BacktestError) -> Self {
        FailureRecord::new(err.kind(), err.to_string())
    }
}

/// Split `bars` into training head and validation tail of `validation_days`.
pub fn split_history(
    bars: &[OhlcvBar],
    validation_days: usize,
) -> Result<(&[OhlcvBar], &[OhlcvBar]), BacktestError> {
    if bars.len() < MIN_BACKTEST_ROWS {
        return Err(BacktestError::InsufficientHistory {
            required: MIN_BACKTEST_ROWS,
            actual: bars.len(),
        });
    }
    let split = bars.len().saturating_sub(validation_days);
    if split < MIN_BACKTEST_ROWS {
        return Err(BacktestError::InsufficientTrainingRows {
            required: MIN_BACKTEST_ROWS,
            actual: split,
        });
    }
    Ok(bars.split_at(split))
}

/// Backtest one model over an already fetched history.
pub fn run_backtest(
    catalog: &ModelCatalog,
    ticker: &str,
    model: ModelKind,
    bars: &[OhlcvBar],
    backtest_days: usize,
    training_period: TrainingPeriod,
) -> Result<BacktestResult, BacktestError> {
    let (training, validation) = split_history(bars, backtest_days)?;
    // split_history guarantees a non-empty head.
    let last_training = training[training.len() - 1];

    debug!(
        ticker,
        model = model.tag(),
        total = bars.len(),
        training = training.len(),
        validation = validation.len(),
        split_date = %last_training.date,
        "Backtest split"
    );

    let mut forecaster = catalog.create(model)?;
    forecaster.train(training)?;
    let forecast = forecaster.predict_next_days(validation.len())?;
    if forecast.is_empty() {
        return Err(BacktestError::EmptyForecast);
    }

    let comparison_data = pair_with_actuals(&forecast, validation);
    let metrics = backtest_metrics(&comparison_data, last_training.close);

    info!(
        ticker,
        model = model.tag(),
        mape = metrics.mape,
        direction = metrics.direction_accuracy,
        "Backtest complete"
    );

    Ok(BacktestResult {
        ticker: ticker.to_string(),
        model_type: model,
        backtest_days: comparison_data.len(),
        training_period,
        total_rows: bars.len(),
        training_rows: training.len(),
        validation_rows: validation.len(),
        split_date: last_training.date,
        comparison_data,
        metrics,
        training_end_price: last_training.close,
        model_metrics: forecaster.metrics()?,
    })
}

fn pair_with_actuals(forecast: &[ForecastPoint], actual: &[OhlcvBar]) -> Vec<ComparisonPoint> {
    forecast
        .iter()
        .zip(actual)
        .map(|(p, bar)| {
            let error = p.predicted_price - bar.close;
            ComparisonPoint {
                date: p.date,
                predicted_price: p.predicted_price,
                actual_price: bar.close,
                error,
                error_percentage: error / bar.close * 100.0,
                confidence: p.confidence,
            }
        })
        .collect()
}

/// Aggregate accuracy of paired points against the training end price.
pub fn backtest_metrics(points: &[ComparisonPoint], base_price: f64) -> BacktestMetrics {
    let Some(last) = points.last() else {
        return BacktestMetrics::default();
    };
    let n = points.len() as f64;
    let abs_errors: Vec<f64> = points.iter().map(|p| p.error.abs()).collect();
    let abs_pct: Vec<f64> = points.iter().map(|p| p.error_percentage.abs()).collect();

    let mape = abs_pct.iter().sum::<f64>() / n;
    let mae = abs_errors.iter().sum::<f64>() / n;
    let rmse = (abs_errors.iter().map(|e| e * e).sum::<f64>() / n).sqrt();

    let direction_accuracy = if points.len() > 1 {
        let hits = points
            .windows(2)
            .filter(|w| {
                let actual_up = w[1].actual_price > w[0].actual_price;
                let predicted_up = w[1].predicted_price > w[0].predicted_price;
                actual_up == predicted_up
            })
            .count();
        hits as f64 / (points.len() - 1) as f64 * 100.0
    } else {
        0.0
    };

    let wins = abs_pct.iter().filter(|e| **e <= WIN_THRESHOLD_PCT).count();
    let win_rate = wins as f64 / n * 100.0;

    let predicted_change = (last.predicted_price - base_price) / base_price * 100.0;
    let actual_change = (last.actual_price - base_price) / base_price * 100.0;

    BacktestMetrics {
        mape: round2(mape),
        rmse: round2(rmse),
        mae: round2(mae),
        direction_accuracy: round2(direction_accuracy),
        win_rate: round2(win_rate),
        predicted_change: round2(predicted_change),
        actual_change: round2(actual_change),
        total_predictions: points.len(),
        max_error: round2(abs_errors.iter().copied().fold(f64::NEG_INFINITY, f64::max)),
        min_error: round2(abs_errors.iter().copied().fold(f64::INFINITY, f64::min)),
    }
}

/// First model with the highest key among successful runs.
fn best_by<F>(runs: &[ModelRun<BacktestResult>], key: F) -> Option<ModelKind>
where
    F: Fn(&BacktestMetrics) -> f64,
{
    let mut best: Option<(ModelKind, f64)> = None;
    for run in runs {
        let Some(result) = run.result.as_ref() else {
            continue;
        };
        let value = key(&result.metrics);
        if best.map_or(true, |(_, b)| value > b) {
            best = Some((run.model, value));
        }
    }
    best.map(|(model, _)| model)
}

/// Rank successful backtests by direction, MAPE, win rate and the
/// weighted composite.
pub fn rank_backtests(runs: &[ModelRun<BacktestResult>]) -> BestBacktestModel {
    BestBacktestModel {
        by_direction: best_by(runs, |m| m.direction_accuracy),
        by_accuracy: best_by(runs, |m| -m.mape),
        by_winrate: best_by(runs, |m| m.win_rate),
        by_overall: best_by(runs, BacktestMetrics::overall_score),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::forecast::{EnsembleSettings, SequenceSettings};
    use crate::services::indicators::test_support::{start_date, trending_bars, wavy_bars};
    use chrono::Duration;

    fn point(day: i64, predicted: f64, actual: f64) -> ComparisonPoint {
        let error = predicted - actual;
        ComparisonPoint {
            date: start_date() + Duration::days(day),
            predicted_price: predicted,
            actual_price: actual,
            error,
            error_percentage: error / actual * 100.0,
            confidence: 0.8,
        }
    }

    fn small_catalog() -> ModelCatalog {
        ModelCatalog::new(
            EnsembleSettings {
                n_trees: 10,
                max_depth: 6,
                ..EnsembleSettings::default()
            },
            SequenceSettings::default(),
            false,
        )
    }

    // =========================================================================
    // Split
    // =========================================================================

    #[test]
    fn test_split_partitions_history() {
        let bars = wavy_bars(200);
        for days in [7, 30, 90] {
            let (training, validation) = split_history(&bars, days).unwrap();
            assert_eq!(training.len() + validation.len(), bars.len());
            assert_eq!(validation.len(), days);
            assert_eq!(validation[0].date, training[training.len() - 1].date + Duration::days(1));
        }
    }

    #[test]
    fn test_split_rejects_short_history() {
        assert_eq!(
            split_history(&wavy_bars(59), 7).unwrap_err(),
            BacktestError::InsufficientHistory {
                required: 60,
                actual: 59
            }
        );
        assert_eq!(
            split_history(&wavy_bars(100), 41).unwrap_err(),
            BacktestError::InsufficientTrainingRows {
                required: 60,
                actual: 59
            }
        );
        assert!(split_history(&wavy_bars(100), 40).is_ok());
    }

    // =========================================================================
    // Metrics
    // =========================================================================

    #[test]
    fn test_metrics_on_known_points() {
        let points = vec![
            point(1, 102.0, 100.0),
            point(2, 104.0, 110.0),
            point(3, 103.0, 105.0),
        ];
        let m = backtest_metrics(&points, 100.0);
        // |%err| = 2, 5.4545..., 1.9047...
        assert_eq!(m.mape, 3.12);
        assert_eq!(m.mae, 3.33);
        assert_eq!(m.rmse, 3.83);
        // Up/up then down/down.
        assert_eq!(m.direction_accuracy, 100.0);
        assert_eq!(m.win_rate, 66.67);
        assert_eq!(m.predicted_change, 3.0);
        assert_eq!(m.actual_change, 5.0);
        assert_eq!(m.total_predictions, 3);
        assert_eq!(m.max_error, 6.0);
        assert_eq!(m.min_error, 2.0);
    }

    #[test]
    fn test_single_point_has_no_direction() {
        let m = backtest_metrics(&[point(1, 99.0, 100.0)], 100.0);
        assert_eq!(m.direction_accuracy, 0.0);
        assert_eq!(m.win_rate, 100.0);
    }

    #[test]
    fn test_empty_metrics_are_default() {
        assert_eq!(backtest_metrics(&[], 100.0), BacktestMetrics::default());
    }

    // =========================================================================
    // Runs
    // =========================================================================

    #[test]
    fn test_linear_backtest_on_trend() {
        let bars = trending_bars(250, 100.0, 0.5);
        let result = run_backtest(
            &small_catalog(),
            "UP",
            ModelKind::Linear,
            &bars,
            20,
            TrainingPeriod::OneYear,
        )
        .unwrap();

        assert_eq!(result.total_rows, 250);
        assert_eq!(result.training_rows, 230);
        assert_eq!(result.validation_rows, 20);
        assert_eq!(result.backtest_days, 20);
        assert_eq!(result.comparison_data.len(), 20);
        assert_eq!(result.split_date, bars[229].date);
        assert_eq!(result.training_end_price, bars[229].close);
        assert_eq!(result.metrics.total_predictions, 20);
        for (p, bar) in result.comparison_data.iter().zip(&bars[230..]) {
            assert_eq!(p.actual_price, bar.close);
        }
    }

    #[test]
    fn test_unavailable_model_fails_with_capability_kind() {
        let err = run_backtest(
            &small_catalog(),
            "UP",
            ModelKind::Sequence,
            &trending_bars(250, 100.0, 0.5),
            20,
            TrainingPeriod::OneYear,
        )
        .unwrap_err();
        assert_eq!(err.kind(), FailureKind::CapabilityUnavailable);
    }

    // =========================================================================
    // Ranking
    // =========================================================================

    fn run_with(model: ModelKind, mape: f64, direction: f64, win_rate: f64) -> ModelRun<BacktestResult> {
        let metrics = BacktestMetrics {
            mape,
            direction_accuracy: direction,
            win_rate,
            ..Default::default()
        };
        let result = BacktestResult {
            ticker: "T".to_string(),
            model_type: model,
            backtest_days: 10,
            training_period: TrainingPeriod::OneYear,
            total_rows: 100,
            training_rows: 90,
            validation_rows: 10,
            split_date: start_date(),
            comparison_data: Vec::new(),
            metrics,
            training_end_price: 100.0,
            model_metrics: crate::types::ModelMetrics {
                r2_score: 0.9,
                training_samples: 31,
                model_type: model.display_name().to_string(),
                model_description: String::new(),
                n_estimators: None,
                lookback: None,
                layers: None,
            },
        };
        ModelRun::succeeded(model, result, 0.1)
    }

    #[test]
    fn test_rank_backtests() {
        let runs = vec![
            run_with(ModelKind::Linear, 2.0, 40.0, 90.0),
            run_with(ModelKind::Ensemble, 4.0, 70.0, 60.0),
            ModelRun::failed(
                ModelKind::Sequence,
                FailureRecord::new(FailureKind::CapabilityUnavailable, "off"),
                0.0,
            ),
        ];
        let best = rank_backtests(&runs);
        assert_eq!(best.by_direction, Some(ModelKind::Ensemble));
        assert_eq!(best.by_accuracy, Some(ModelKind::Linear));
        assert_eq!(best.by_winrate, Some(ModelKind::Linear));
        // Linear 16 + 28.8 + 27 = 71.8, ensemble 28 + 27.6 + 18 = 73.6.
        assert_eq!(best.by_overall, Some(ModelKind::Ensemble));
    }

    #[test]
    fn test_rank_with_no_success_is_empty() {
        let runs: Vec<ModelRun<BacktestResult>> = vec![ModelRun::failed(
            ModelKind::Linear,
            FailureRecord::new(FailureKind::InsufficientData, "short"),
            0.0,
        )];
        assert_eq!(rank_backtests(&runs), BestBacktestModel::default());
    }
}
