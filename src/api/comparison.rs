//! Multi-model comparison endpoints.

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use super::backtest::DEFAULT_BACKTEST_DAYS;
use super::stock::{training_period, DEFAULT_DAYS};
use super::{query, ApiResponse};
use crate::error::Result;
use crate::sources::MarketDataProvider;
use crate::types::{BacktestComparison, ModelKind, ParameterError, PredictionComparison};
use crate::AppState;

/// Query parameters for the live comparison.
#[derive(Debug, Default, Deserialize)]
pub struct ComparePredictionsQuery {
    pub days: Option<u32>,
    pub period: Option<String>,
    /// Comma separated model tags; every model when absent
    pub models: Option<String>,
}

/// Query parameters for the backtest comparison.
#[derive(Debug, Default, Deserialize)]
pub struct CompareBacktestsQuery {
    pub backtest_days: Option<u32>,
    pub training_period: Option<String>,
    /// Comma separated model tags; every model when absent
    pub models: Option<String>,
}

fn model_list(tags: Option<&str>) -> std::result::Result<Vec<ModelKind>, ParameterError> {
    match tags {
        Some(tags) => ModelKind::parse_list(tags),
        None => Ok(ModelKind::ALL.to_vec()),
    }
}

/// Create the comparison router.
pub fn router<P: MarketDataProvider>() -> Router<AppState<P>> {
    Router::new()
        .route("/:ticker/predict/compare", get(compare_predictions::<P>))
        .route("/:ticker/backtest/compare", get(compare_backtests::<P>))
}

async fn compare_predictions<P: MarketDataProvider>(
    State(state): State<AppState<P>>,
    Path(ticker): Path<String>,
    params: std::result::Result<Query<ComparePredictionsQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<PredictionComparison>>> {
    let params = query(params)?;
    let models = model_list(params.models.as_deref())?;
    let period = training_period(params.period.as_deref())?;
    let days = params.days.unwrap_or(DEFAULT_DAYS);

    let comparison = state
        .service
        .compare_predictions(&ticker, &models, days, period)
        .await?;
    Ok(Json(ApiResponse::new(comparison)))
}

async fn compare_backtests<P: MarketDataProvider>(
    State(state): State<AppState<P>>,
    Path(ticker): Path<String>,
    params: std::result::Result<Query<CompareBacktestsQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<BacktestComparison>>> {
    let params = query(params)?;
    let models = model_list(params.models.as_deref())?;
    let period = training_period(params.training_period.as_deref())?;
    let days = params.backtest_days.unwrap_or(DEFAULT_BACKTEST_DAYS);

    let comparison = state
        .service
        .compare_backtests(&ticker, &models, days, period)
        .await?;
    Ok(Json(ApiResponse::new(comparison)))
}
