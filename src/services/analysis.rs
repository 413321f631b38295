//! Request orchestration.
//!
//! Every operation fetches fresh history from the provider, then runs the
//! CPU-bound indicator, model and analyzer work on the blocking pool.
//! Nothing is kept between requests apart from the read-only catalog.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{info, warn};

use crate::services::backtest::{rank_backtests, run_backtest, BacktestError};
use crate::services::comparison::{rank_predictions, run_per_model, summarize_runs};
use crate::services::forecast::{ForecastError, ModelCatalog};
use crate::services::indicators::compute_clean;
use crate::services::signals::{self, replay_history, ForecastView};
use crate::sources::{MarketDataProvider, ProviderError};
use crate::types::{
    ensure_in_range, BacktestComparison, BacktestResult, FailureKind, FailureRecord,
    HistoricalPoint, HistoryPeriod, HistoryRequest, MarketInfo, ModelInfo, ModelKind, OhlcvBar,
    ParameterError, PredictionComparison, PredictionReport, SignalAnalysis, SignalHistory,
    StockHistory, TrainingPeriod, BACKTEST_DAYS, FORECAST_DAYS, SIGNAL_HISTORY_DAYS,
    SIGNAL_PREDICTION_DAYS,
};

/// Clean rows required before a live signal is produced.
pub const MIN_SIGNAL_ROWS: usize = 20;
/// Extra sessions fetched ahead of a signal history window for warm-up.
pub const SIGNAL_HISTORY_WARMUP: usize = 90;
/// Chart rows attached to a prediction report.
pub const HISTORICAL_POINTS: usize = 60;
/// Model whose forecast feeds the live signal.
pub const SIGNAL_MODEL: ModelKind = ModelKind::Ensemble;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error(transparent)]
    Parameter(#[from] ParameterError),
    #[error(transparent)]
    Forecast(#[from] ForecastError),
    #[error(transparent)]
    Backtest(#[from] BacktestError),
    #[error("Insufficient history for signal analysis: need at least {required} complete rows, got {actual}")]
    InsufficientSignalRows { required: usize, actual: usize },
    #[error("Background worker failed: {0}")]
    Worker(String),
}

impl AnalysisError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Provider(e) => e.kind(),
            Self::Parameter(_) => FailureKind::UnsupportedConfiguration,
            Self::Forecast(e) => e.kind(),
            Self::Backtest(e) => e.kind(),
            Self::InsufficientSignalRows { .. } => FailureKind::InsufficientData,
            Self::Worker(_) => FailureKind::Internal,
        }
    }
}

type Result<T> = std::result::Result<T, AnalysisError>;

/// Run CPU-bound work off the async runtime.
async fn blocking<T, F>(work: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| AnalysisError::Worker(e.to_string()))?
}

/// Train `model` on `bars` and forecast `days` sessions.
pub fn prediction_report(
    catalog: &ModelCatalog,
    ticker: &str,
    model: ModelKind,
    training_period: TrainingPeriod,
    bars: &[OhlcvBar],
    days: usize,
) -> std::result::Result<PredictionReport, ForecastError> {
    let mut forecaster = catalog.create(model)?;
    forecaster.train(bars)?;
    let predictions = forecaster.predict_next_days(days)?;
    let metrics = forecaster.metrics()?;

    let rows = forecaster.training_rows();
    let last = rows.last().ok_or(ForecastError::NotTrained)?;
    let historical_data = rows[rows.len().saturating_sub(HISTORICAL_POINTS)..]
        .iter()
        .map(HistoricalPoint::from)
        .collect();

    Ok(PredictionReport {
        ticker: ticker.to_string(),
        model_type: model,
        training_period,
        predictions,
        historical_data,
        metrics,
        current_price: last.close(),
        last_update: last.date(),
    })
}

/// Stock analysis operations over a market data provider.
pub struct AnalysisService<P> {
    provider: Arc<P>,
    catalog: Arc<ModelCatalog>,
    fetch_timeout: Duration,
}

impl<P> Clone for AnalysisService<P> {
    fn clone(&self) -> Self {
        Self {
            provider: Arc::clone(&self.provider),
            catalog: Arc::clone(&self.catalog),
            fetch_timeout: self.fetch_timeout,
        }
    }
}

impl<P: MarketDataProvider> AnalysisService<P> {
    pub fn new(provider: Arc<P>, catalog: ModelCatalog, fetch_timeout: Duration) -> Self {
        Self {
            provider,
            catalog: Arc::new(catalog),
            fetch_timeout,
        }
    }

    pub fn catalog(&self) -> &ModelCatalog {
        &self.catalog
    }

    /// Model listing with availability.
    pub fn available_models(&self) -> Vec<ModelInfo> {
        self.catalog.models()
    }

    async fn fetch(&self, ticker: &str, request: HistoryRequest) -> Result<StockHistory> {
        let history = tokio::time::timeout(self.fetch_timeout, self.provider.fetch_history(ticker, request))
            .await
            .map_err(|_| ProviderError::Timeout)??;
        info!(ticker = %history.ticker, bars = history.prices.len(), "Fetched history");
        Ok(history)
    }

    /// Raw daily history by period or inclusive date range.
    pub async fn stock_history(&self, ticker: &str, request: HistoryRequest) -> Result<StockHistory> {
        if let HistoryRequest::Range { start, end } = request {
            if start > end {
                return Err(ParameterError::InvalidDateRange(format!(
                    "start {} is after end {}",
                    start, end
                ))
                .into());
            }
        }
        self.fetch(ticker, request).await
    }

    /// Train one model on the training period and forecast `days` sessions.
    pub async fn predict(
        &self,
        ticker: &str,
        model: ModelKind,
        days: u32,
        training_period: TrainingPeriod,
    ) -> Result<PredictionReport> {
        let days = ensure_in_range("days", days, &FORECAST_DAYS)?;
        if !self.catalog.is_available(model) {
            return Err(ForecastError::CapabilityUnavailable(model).into());
        }
        let history = self
            .fetch(ticker, HistoryRequest::Period(training_period.history_period()))
            .await?;

        let catalog = Arc::clone(&self.catalog);
        blocking(move || {
            let report = prediction_report(
                &catalog,
                &history.ticker,
                model,
                training_period,
                &history.prices,
                days as usize,
            )?;
            info!(
                ticker = %report.ticker,
                model = model.tag(),
                r2 = report.metrics.r2_score,
                "Prediction complete"
            );
            Ok(report)
        })
        .await
    }

    /// Run several models on the same history and rank them.
    pub async fn compare_predictions(
        &self,
        ticker: &str,
        models: &[ModelKind],
        days: u32,
        training_period: TrainingPeriod,
    ) -> Result<PredictionComparison> {
        let days = ensure_in_range("days", days, &FORECAST_DAYS)?;
        let models = if models.is_empty() {
            ModelKind::ALL.to_vec()
        } else {
            models.to_vec()
        };
        let history = self
            .fetch(ticker, HistoryRequest::Period(training_period.history_period()))
            .await?;

        let catalog = Arc::clone(&self.catalog);
        let symbol = history.ticker.clone();
        let bars = Arc::new(history.prices);
        let runs = run_per_model(&models, move |model| {
            prediction_report(&catalog, &symbol, model, training_period, &bars, days as usize)
                .map_err(|e| FailureRecord::from(&e))
        })
        .await;

        let comparisons = summarize_runs(runs);
        let best_model = rank_predictions(&comparisons);
        Ok(PredictionComparison {
            ticker: history.ticker,
            days,
            training_period,
            total_models: comparisons.len(),
            comparisons,
            best_model,
        })
    }

    /// Live trading signal over the last six months.
    ///
    /// A failing forecast is logged and the signal is produced without it.
    pub async fn signal(
        &self,
        ticker: &str,
        include_prediction: bool,
        prediction_days: u32,
    ) -> Result<SignalAnalysis> {
        let prediction_days = ensure_in_range("prediction_days", prediction_days, &SIGNAL_PREDICTION_DAYS)?;
        let history = self
            .fetch(ticker, HistoryRequest::Period(HistoryPeriod::SixMonths))
            .await?;

        let catalog = Arc::clone(&self.catalog);
        blocking(move || {
            let rows = compute_clean(&history.prices);
            if rows.len() < MIN_SIGNAL_ROWS {
                return Err(AnalysisError::InsufficientSignalRows {
                    required: MIN_SIGNAL_ROWS,
                    actual: rows.len(),
                });
            }

            let forecast = if include_prediction {
                match prediction_report(
                    &catalog,
                    &history.ticker,
                    SIGNAL_MODEL,
                    TrainingPeriod::SixMonths,
                    &history.prices,
                    prediction_days as usize,
                ) {
                    Ok(report) => Some(report),
                    Err(e) => {
                        warn!(ticker = %history.ticker, "Forecast for signal failed: {}", e);
                        None
                    }
                }
            } else {
                None
            };
            let view = forecast.as_ref().map(|r| ForecastView {
                current_price: r.current_price,
                points: &r.predictions,
            });

            let report = signals::analyze(&history.ticker, &rows, view);
            let latest = rows[rows.len() - 1];
            let market_info = MarketInfo {
                latest_close: latest.bar.close,
                latest_volume: latest.bar.volume,
                price_change_1d: latest.indicators.price_change,
                price_change_5d: latest.indicators.price_change_5d,
                price_change_20d: latest.indicators.price_change_20d,
                volume_change: latest.indicators.volume_change,
            };
            info!(
                ticker = %report.ticker,
                signal = report.signal.label(),
                score = report.score,
                "Signal computed"
            );
            Ok(SignalAnalysis {
                report,
                market_info,
            })
        })
        .await
    }

    /// Replayed signals over the last `days` sessions.
    pub async fn signal_history(&self, ticker: &str, days: u32) -> Result<SignalHistory> {
        let days = ensure_in_range("days", days, &SIGNAL_HISTORY_DAYS)?;
        let history = self
            .fetch(
                ticker,
                HistoryRequest::TradingDays(days as usize + SIGNAL_HISTORY_WARMUP),
            )
            .await?;

        blocking(move || {
            let rows = compute_clean(&history.prices);
            Ok(replay_history(&history.ticker, &rows, days))
        })
        .await
    }

    /// Walk-forward backtest of one model.
    pub async fn backtest(
        &self,
        ticker: &str,
        model: ModelKind,
        backtest_days: u32,
        training_period: TrainingPeriod,
    ) -> Result<BacktestResult> {
        let backtest_days = ensure_in_range("backtest_days", backtest_days, &BACKTEST_DAYS)?;
        if !self.catalog.is_available(model) {
            return Err(ForecastError::CapabilityUnavailable(model).into());
        }
        let history = self
            .fetch(ticker, HistoryRequest::Period(training_period.backtest_period()))
            .await?;

        let catalog = Arc::clone(&self.catalog);
        blocking(move || {
            Ok(run_backtest(
                &catalog,
                &history.ticker,
                model,
                &history.prices,
                backtest_days as usize,
                training_period,
            )?)
        })
        .await
    }

    /// Backtest several models on the same history and rank them.
    pub async fn compare_backtests(
        &self,
        ticker: &str,
        models: &[ModelKind],
        backtest_days: u32,
        training_period: TrainingPeriod,
    ) -> Result<BacktestComparison> {
        let backtest_days = ensure_in_range("backtest_days", backtest_days, &BACKTEST_DAYS)?;
        let models = if models.is_empty() {
            ModelKind::ALL.to_vec()
        } else {
            models.to_vec()
        };
        let history = self
            .fetch(ticker, HistoryRequest::Period(training_period.backtest_period()))
            .await?;

        let catalog = Arc::clone(&self.catalog);
        let symbol = history.ticker.clone();
        let bars = Arc::new(history.prices);
        let results = run_per_model(&models, move |model| {
            run_backtest(
                &catalog,
                &symbol,
                model,
                &bars,
                backtest_days as usize,
                training_period,
            )
            .map_err(|e| FailureRecord::from(&e))
        })
        .await;

        let best_model = rank_backtests(&results);
        Ok(BacktestComparison {
            ticker: history.ticker,
            backtest_days,
            training_period,
            results,
            best_model,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::forecast::{EnsembleSettings, SequenceSettings};
    use crate::services::indicators::test_support::{flat_bars, wavy_bars};
    use crate::sources::InMemoryProvider;

    fn service(sequence_enabled: bool) -> AnalysisService<InMemoryProvider> {
        let provider = InMemoryProvider::new()
            .with_series("WAVE", wavy_bars(400))
            .with_series("FLAT", flat_bars(300, 20.0))
            .with_series("TINY", wavy_bars(70));
        let catalog = ModelCatalog::new(
            EnsembleSettings {
                n_trees: 8,
                max_depth: 5,
                ..EnsembleSettings::default()
            },
            SequenceSettings {
                lookback: 10,
                hidden_size: 4,
                epochs: 2,
                batch_size: 32,
                ..SequenceSettings::default()
            },
            sequence_enabled,
        );
        AnalysisService::new(Arc::new(provider), catalog, Duration::from_secs(5))
    }

    #[tokio::test]
    async fn test_predict_report_shape() {
        let report = service(false)
            .predict("wave", ModelKind::Linear, 5, TrainingPeriod::OneYear)
            .await
            .unwrap();
        assert_eq!(report.ticker, "WAVE");
        assert_eq!(report.predictions.len(), 5);
        assert_eq!(report.historical_data.len(), HISTORICAL_POINTS);
        assert_eq!(
            report.historical_data.last().unwrap().date,
            report.last_update
        );
    }

    #[tokio::test]
    async fn test_predict_validates_parameters_first() {
        let svc = service(false);
        let err = svc
            .predict("WAVE", ModelKind::Linear, 0, TrainingPeriod::OneYear)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), FailureKind::UnsupportedConfiguration);

        let err = svc
            .predict("WAVE", ModelKind::Sequence, 5, TrainingPeriod::OneYear)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), FailureKind::CapabilityUnavailable);

        let err = svc
            .predict("NOPE", ModelKind::Linear, 5, TrainingPeriod::OneYear)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), FailureKind::DataUnavailable);
    }

    #[tokio::test]
    async fn test_signal_without_prediction() {
        let analysis = service(false).signal("FLAT", false, 7).await.unwrap();
        assert_eq!(analysis.report.signal, crate::types::SignalType::Hold);
        assert_eq!(analysis.report.risk_reward_ratio, 0.0);
        assert_eq!(analysis.market_info.latest_close, 20.0);
        assert_eq!(analysis.market_info.price_change_1d, Some(0.0));
    }

    #[tokio::test]
    async fn test_signal_with_prediction_scores_ai_category() {
        let analysis = service(false).signal("WAVE", true, 3).await.unwrap();
        let ai = &analysis.report.detailed_signals.ai;
        assert_eq!(ai.len(), 1);
        assert_ne!(ai[0].signal, "unavailable");
    }

    #[tokio::test]
    async fn test_signal_needs_twenty_clean_rows() {
        // 70 bars leave 11 complete rows.
        let err = service(false).signal("TINY", false, 7).await.unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::InsufficientSignalRows {
                required: 20,
                actual: 11
            }
        ));
        assert_eq!(err.kind(), FailureKind::InsufficientData);
    }

    #[tokio::test]
    async fn test_signal_history_window() {
        let history = service(false).signal_history("WAVE", 30).await.unwrap();
        assert_eq!(history.history.len(), 29);
    }

    #[tokio::test]
    async fn test_backtest_comparison_isolates_failures() {
        let comparison = service(false)
            .compare_backtests("WAVE", &[], 20, TrainingPeriod::OneYear)
            .await
            .unwrap();
        assert_eq!(comparison.results.len(), 3);
        assert!(comparison.results[0].success);
        assert!(comparison.results[1].success);
        let sequence = &comparison.results[2];
        assert_eq!(
            sequence.failure.as_ref().unwrap().kind,
            FailureKind::CapabilityUnavailable
        );
        assert!(comparison.best_model.by_overall.is_some());
    }

    #[tokio::test]
    async fn test_stock_history_rejects_inverted_range() {
        let start = chrono::NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        let end = chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let err = service(false)
            .stock_history("WAVE", HistoryRequest::Range { start, end })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), FailureKind::UnsupportedConfiguration);
    }
}
