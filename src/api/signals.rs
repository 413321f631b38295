//! Signal API endpoints.

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use super::{query, ApiResponse};
use crate::error::Result;
use crate::sources::MarketDataProvider;
use crate::types::{SignalAnalysis, SignalHistory};
use crate::AppState;

/// Query parameters for the signal endpoint.
#[derive(Debug, Deserialize)]
pub struct SignalQuery {
    /// Feed a random forest forecast into the AI category
    #[serde(default = "default_include_prediction")]
    pub include_prediction: bool,
    #[serde(default = "default_prediction_days")]
    pub prediction_days: u32,
}

fn default_include_prediction() -> bool {
    true
}

fn default_prediction_days() -> u32 {
    7
}

/// Query parameters for the signal history endpoint.
#[derive(Debug, Deserialize)]
pub struct SignalHistoryQuery {
    #[serde(default = "default_history_days")]
    pub days: u32,
}

fn default_history_days() -> u32 {
    30
}

/// Create the signals router.
pub fn router<P: MarketDataProvider>() -> Router<AppState<P>> {
    Router::new()
        .route("/:ticker/signal", get(get_signal::<P>))
        .route("/:ticker/signal/history", get(get_signal_history::<P>))
}

/// Current trading signal for a ticker.
async fn get_signal<P: MarketDataProvider>(
    State(state): State<AppState<P>>,
    Path(ticker): Path<String>,
    params: std::result::Result<Query<SignalQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<SignalAnalysis>>> {
    let params = query(params)?;
    let analysis = state
        .service
        .signal(&ticker, params.include_prediction, params.prediction_days)
        .await?;
    Ok(Json(ApiResponse::new(analysis)))
}

/// Replayed signals and their next-day accuracy.
async fn get_signal_history<P: MarketDataProvider>(
    State(state): State<AppState<P>>,
    Path(ticker): Path<String>,
    params: std::result::Result<Query<SignalHistoryQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<SignalHistory>>> {
    let params = query(params)?;
    let history = state.service.signal_history(&ticker, params.days).await?;
    Ok(Json(ApiResponse::new(history)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_query_defaults() {
        let params: SignalQuery = serde_urlencoded::from_str("").unwrap();
        assert!(params.include_prediction);
        assert_eq!(params.prediction_days, 7);

        let params: SignalQuery =
            serde_urlencoded::from_str("include_prediction=false&prediction_days=14").unwrap();
        assert!(!params.include_prediction);
        assert_eq!(params.prediction_days, 14);
    }

    #[test]
    fn test_history_query_defaults() {
        let params: SignalHistoryQuery = serde_urlencoded::from_str("").unwrap();
        assert_eq!(params.days, 30);
    }
}
