use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{FailureRecord, ModelKind, ModelMetrics, TrainingPeriod};

/// One forecast paired with the price that actually printed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComparisonPoint {
    pub date: NaiveDate,
    pub predicted_price: f64,
    pub actual_price: f64,
    /// Signed error, predicted minus actual.
    pub error: f64,
    /// Signed error as a percentage of the actual price.
    pub error_percentage: f64,
    pub confidence: f64,
}

/// Aggregate accuracy of a backtest.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BacktestMetrics {
    pub mape: f64,
    pub rmse: f64,
    pub mae: f64,
    /// Percentage of consecutive pairs whose predicted move matched the actual move.
    pub direction_accuracy: f64,
    /// Percentage of points within 5% of the actual price.
    pub win_rate: f64,
    /// Net change from the training end price to the last forecast, in percent.
    pub predicted_change: f64,
    /// Net change from the training end price to the last actual price, in percent.
    pub actual_change: f64,
    pub total_predictions: usize,
    pub max_error: f64,
    pub min_error: f64,
}

impl BacktestMetrics {
    /// `0.4 × direction + 0.3 × max(0, 100 − 2 × MAPE) + 0.3 × win rate`.
    pub fn overall_score(&self) -> f64 {
        let mape_score = (100.0 - self.mape * 2.0).max(0.0);
        self.direction_accuracy * 0.4 + mape_score * 0.3 + self.win_rate * 0.3
    }
}

/// Walk-forward backtest of one model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestResult {
    pub ticker: String,
    pub model_type: ModelKind,
    pub backtest_days: usize,
    pub training_period: TrainingPeriod,
    pub total_rows: usize,
    pub training_rows: usize,
    pub validation_rows: usize,
    pub split_date: NaiveDate,
    pub comparison_data: Vec<ComparisonPoint>,
    pub metrics: BacktestMetrics,
    pub training_end_price: f64,
    pub model_metrics: ModelMetrics,
}

/// Outcome of one model inside a batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelRun<T> {
    pub model: ModelKind,
    pub success: bool,
    pub elapsed_time: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureRecord>,
}

impl<T> ModelRun<T> {
    pub fn succeeded(model: ModelKind, result: T, elapsed_time: f64) -> Self {
        Self {
            model,
            success: true,
            elapsed_time,
            result: Some(result),
            failure: None,
        }
    }

    pub fn failed(model: ModelKind, failure: FailureRecord, elapsed_time: f64) -> Self {
        Self {
            model,
            success: false,
            elapsed_time,
            result: None,
            failure: Some(failure),
        }
    }
}

/// Winners of a backtest comparison.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BestBacktestModel {
    pub by_direction: Option<ModelKind>,
    pub by_accuracy: Option<ModelKind>,
    pub by_winrate: Option<ModelKind>,
    pub by_overall: Option<ModelKind>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestComparison {
    pub ticker: String,
    pub backtest_days: u32,
    pub training_period: TrainingPeriod,
    pub results: Vec<ModelRun<BacktestResult>>,
    pub best_model: BestBacktestModel,
}

/// Live forecast summary of one model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionSummary {
    pub r2_score: f64,
    pub elapsed_time: f64,
    pub predicted_change: f64,
    pub predicted_price: f64,
    pub current_price: f64,
    pub model_description: String,
    pub training_samples: usize,
}

/// Winners of a live comparison.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BestPredictionModel {
    pub by_accuracy: Option<ModelKind>,
    pub by_speed: Option<ModelKind>,
    pub by_overall: Option<ModelKind>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionComparison {
    pub ticker: String,
    pub days: u32,
    pub training_period: TrainingPeriod,
    pub comparisons: Vec<ModelRun<PredictionSummary>>,
    pub best_model: BestPredictionModel,
    pub total_models: usize,
}
