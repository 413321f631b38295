//! Walk-forward backtest endpoint.

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use super::stock::{model_kind, training_period};
use super::{query, ApiResponse};
use crate::error::Result;
use crate::sources::MarketDataProvider;
use crate::types::BacktestResult;
use crate::AppState;

/// Default validation window.
pub const DEFAULT_BACKTEST_DAYS: u32 = 30;

/// Query parameters for the backtest endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct BacktestQuery {
    pub model: Option<String>,
    pub backtest_days: Option<u32>,
    pub training_period: Option<String>,
}

/// Create the backtest router.
pub fn router<P: MarketDataProvider>() -> Router<AppState<P>> {
    Router::new().route("/:ticker/backtest", get(run_backtest::<P>))
}

/// Backtest one model against the most recent sessions.
async fn run_backtest<P: MarketDataProvider>(
    State(state): State<AppState<P>>,
    Path(ticker): Path<String>,
    params: std::result::Result<Query<BacktestQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<BacktestResult>>> {
    let params = query(params)?;
    let model = model_kind(params.model.as_deref())?;
    let period = training_period(params.training_period.as_deref())?;
    let days = params.backtest_days.unwrap_or(DEFAULT_BACKTEST_DAYS);

    let result = state.service.backtest(&ticker, model, days, period).await?;
    Ok(Json(ApiResponse::new(result)))
}
