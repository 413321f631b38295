//! End-to-end runs of the analysis pipeline through the library API.

mod common;

use tickerscope::services::backtest::{run_backtest, split_history, BacktestError};
use tickerscope::services::indicators::compute_clean;
use tickerscope::services::signals;
use tickerscope::{FailureKind, ModelKind, SignalType, TrainingPeriod};

// ============================================================================
// Forecasting
// ============================================================================

#[test]
fn test_linear_model_on_uptrend() {
    let bars = common::uptrend(300, 100.0, 0.5);
    let catalog = common::catalog(false);

    let mut model = catalog.create(ModelKind::Linear).unwrap();
    let summary = model.train(&bars).unwrap();
    assert_eq!(summary.raw_rows, 300);

    let points = model.predict_next_days(5).unwrap();
    assert_eq!(points.len(), 5);
    assert!((points[0].confidence - 0.83).abs() < 1e-9);
    assert!((points[4].confidence - 0.75).abs() < 1e-9);
    for pair in points.windows(2) {
        assert!(pair[1].confidence < pair[0].confidence);
        assert!(pair[1].date > pair[0].date);
    }
    assert!(points[0].date > bars[bars.len() - 1].date);

    let prices: Vec<f64> = points.iter().map(|p| p.predicted_price).collect();
    assert!(prices.iter().all(|p| p.is_finite()), "{:?}", prices);
    for pair in prices.windows(2) {
        assert!(pair[1] > pair[0], "not rising: {:?}", prices);
    }
    let last_close = bars[bars.len() - 1].close;
    assert!((prices[0] - last_close).abs() < 5.0, "{:?}", prices);
}

#[tokio::test]
async fn test_prediction_report_tracks_latest_session() {
    let report = common::service(false)
        .predict("up", ModelKind::Linear, 10, TrainingPeriod::OneYear)
        .await
        .unwrap();
    let bars = common::uptrend(300, 100.0, 0.5);
    let last = bars[bars.len() - 1];

    assert_eq!(report.ticker, "UP");
    assert_eq!(report.current_price, last.close);
    assert_eq!(report.last_update, last.date);
    assert_eq!(report.predictions.len(), 10);
    assert_eq!(report.historical_data.len(), 60);
    assert!(report.metrics.r2_score > 0.9);
}

// ============================================================================
// Signals
// ============================================================================

#[test]
fn test_flat_series_holds() {
    let rows = compute_clean(&common::flat(100, 25.0));
    let report = signals::analyze("FLAT", &rows, None);

    assert_eq!(report.signal, SignalType::Hold);
    assert!((35.0..=65.0).contains(&report.score), "score {}", report.score);
    assert_eq!(report.risk_reward_ratio, 0.0);
    let levels = report.key_levels.unwrap();
    assert_eq!(levels.stop_loss, levels.current_price);
    assert_eq!(levels.take_profit, levels.current_price);
}

#[tokio::test]
async fn test_signal_history_statistics_are_consistent() {
    let history = common::service(false)
        .signal_history("WAVE", 60)
        .await
        .unwrap();
    let stats = &history.statistics;

    assert_eq!(history.history.len(), 59);
    assert_eq!(
        stats.buy_signals + stats.sell_signals + stats.hold_signals,
        history.history.len()
    );
    assert!(stats.correct_signals <= stats.total_signals);
    assert!(stats.total_signals <= stats.buy_signals + stats.sell_signals);
    for pair in history.history.windows(2) {
        assert!(pair[0].date < pair[1].date);
    }
}

// ============================================================================
// Backtesting
// ============================================================================

#[test]
fn test_split_keeps_validation_after_training() {
    let bars = common::wave(250);
    for days in [7, 30, 90] {
        let (training, validation) = split_history(&bars, days).unwrap();
        assert_eq!(training.len() + validation.len(), bars.len());
        assert_eq!(validation.len(), days);
        assert!(training[training.len() - 1].date < validation[0].date);
    }

    assert!(matches!(
        split_history(&bars[..100], 50),
        Err(BacktestError::InsufficientTrainingRows {
            required: 60,
            actual: 50
        })
    ));
}

#[test]
fn test_backtest_result_pairs_every_validation_row() {
    let bars = common::wave(300);
    let result = run_backtest(
        &common::catalog(false),
        "WAVE",
        ModelKind::Ensemble,
        &bars,
        30,
        TrainingPeriod::OneYear,
    )
    .unwrap();

    assert_eq!(result.validation_rows, 30);
    assert_eq!(result.training_rows, 270);
    assert_eq!(result.comparison_data.len(), 30);
    assert_eq!(result.split_date, bars[269].date);
    assert_eq!(result.training_end_price, bars[269].close);
    assert!((0.0..=100.0).contains(&result.metrics.direction_accuracy));
    assert!((0.0..=100.0).contains(&result.metrics.win_rate));
    for (point, bar) in result.comparison_data.iter().zip(&bars[270..]) {
        assert_eq!(point.actual_price, bar.close);
    }
}

// ============================================================================
// Comparison
// ============================================================================

#[tokio::test]
async fn test_comparison_reports_unavailable_sequence_model() {
    let comparison = common::service(false)
        .compare_predictions("WAVE", &ModelKind::ALL, 5, TrainingPeriod::OneYear)
        .await
        .unwrap();

    assert_eq!(comparison.total_models, 3);
    let by_model = |kind: ModelKind| {
        comparison
            .comparisons
            .iter()
            .find(|run| run.model == kind)
            .unwrap()
    };

    assert!(by_model(ModelKind::Linear).success);
    assert!(by_model(ModelKind::Ensemble).success);
    let sequence = by_model(ModelKind::Sequence);
    assert!(!sequence.success);
    assert_eq!(
        sequence.failure.as_ref().unwrap().kind,
        FailureKind::CapabilityUnavailable
    );

    let best = comparison.best_model;
    assert!(matches!(
        best.by_overall,
        Some(ModelKind::Linear) | Some(ModelKind::Ensemble)
    ));
    assert_ne!(best.by_accuracy, Some(ModelKind::Sequence));
}

#[tokio::test]
async fn test_backtest_needs_training_rows_after_split() {
    // Three months of training extends to six months of history: 126 bars,
    // which leaves 36 ahead of a 90 session validation window.
    let err = common::service(false)
        .backtest("FLAT", ModelKind::Linear, 90, TrainingPeriod::ThreeMonths)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), FailureKind::InsufficientData);
}
