//! Stock history, single-model prediction and model listing endpoints.

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    routing::get,
    Json, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;

use super::{query, ApiResponse};
use crate::error::Result;
use crate::sources::MarketDataProvider;
use crate::types::{
    HistoryPeriod, HistoryRequest, ModelInfo, ModelKind, ParameterError, PredictionReport,
    StockHistory, TrainingPeriod,
};
use crate::AppState;

/// Default forecast horizon.
pub const DEFAULT_DAYS: u32 = 30;

/// Query parameters for the history endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    /// Range label such as `1mo` or `1y`
    pub period: Option<String>,
    /// Start date (YYYY-MM-DD)
    pub start: Option<String>,
    /// End date (YYYY-MM-DD), inclusive
    pub end: Option<String>,
}

impl HistoryQuery {
    /// A date range wins over a period; neither means one month.
    pub fn to_request(&self) -> std::result::Result<HistoryRequest, ParameterError> {
        match (self.start.as_deref(), self.end.as_deref()) {
            (Some(start), Some(end)) => Ok(HistoryRequest::Range {
                start: parse_date(start)?,
                end: parse_date(end)?,
            }),
            (None, None) => {
                let period = match self.period.as_deref() {
                    Some(label) => HistoryPeriod::parse(label)?,
                    None => HistoryPeriod::OneMonth,
                };
                Ok(HistoryRequest::Period(period))
            }
            _ => Err(ParameterError::InvalidDateRange(
                "start and end must be given together".to_string(),
            )),
        }
    }
}

fn parse_date(value: &str) -> std::result::Result<NaiveDate, ParameterError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| ParameterError::InvalidDateRange(format!("{} is not a YYYY-MM-DD date", value)))
}

/// Query parameters for the prediction endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct PredictQuery {
    pub days: Option<u32>,
    pub period: Option<String>,
    pub model: Option<String>,
}

/// Parse an optional training period, defaulting to one year.
pub(crate) fn training_period(label: Option<&str>) -> std::result::Result<TrainingPeriod, ParameterError> {
    label.map(TrainingPeriod::parse).transpose().map(Option::unwrap_or_default)
}

/// Parse an optional model tag, defaulting to the random forest.
pub(crate) fn model_kind(tag: Option<&str>) -> std::result::Result<ModelKind, ParameterError> {
    tag.map(ModelKind::parse)
        .transpose()
        .map(|m| m.unwrap_or(ModelKind::Ensemble))
}

/// Create the stock router.
pub fn router<P: MarketDataProvider>() -> Router<AppState<P>> {
    Router::new()
        .route("/models/available", get(available_models::<P>))
        .route("/:ticker", get(get_history::<P>))
        .route("/:ticker/predict", get(predict::<P>))
}

/// Daily OHLCV history.
async fn get_history<P: MarketDataProvider>(
    State(state): State<AppState<P>>,
    Path(ticker): Path<String>,
    params: std::result::Result<Query<HistoryQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<StockHistory>>> {
    let request = query(params)?.to_request()?;
    let history = state.service.stock_history(&ticker, request).await?;
    Ok(Json(ApiResponse::new(history)))
}

/// Train one model and forecast.
async fn predict<P: MarketDataProvider>(
    State(state): State<AppState<P>>,
    Path(ticker): Path<String>,
    params: std::result::Result<Query<PredictQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<PredictionReport>>> {
    let params = query(params)?;
    let model = model_kind(params.model.as_deref())?;
    let period = training_period(params.period.as_deref())?;
    let days = params.days.unwrap_or(DEFAULT_DAYS);

    let report = state.service.predict(&ticker, model, days, period).await?;
    Ok(Json(ApiResponse::new(report)))
}

/// Every model family with its availability.
async fn available_models<P: MarketDataProvider>(
    State(state): State<AppState<P>>,
) -> Json<ApiResponse<Vec<ModelInfo>>> {
    Json(ApiResponse::new(state.service.available_models()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history_query(raw: &str) -> HistoryQuery {
        serde_urlencoded::from_str(raw).unwrap()
    }

    // =========================================================================
    // Query parsing
    // =========================================================================

    #[test]
    fn test_history_query_defaults_to_one_month() {
        assert_eq!(
            history_query("").to_request().unwrap(),
            HistoryRequest::Period(HistoryPeriod::OneMonth)
        );
        assert_eq!(
            history_query("period=3y").to_request().unwrap(),
            HistoryRequest::Period(HistoryPeriod::ThreeYears)
        );
    }

    #[test]
    fn test_history_query_date_range() {
        let request = history_query("start=2024-01-02&end=2024-03-01&period=1y")
            .to_request()
            .unwrap();
        assert_eq!(
            request,
            HistoryRequest::Range {
                start: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
                end: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            }
        );
    }

    #[test]
    fn test_history_query_rejects_half_range() {
        assert!(matches!(
            history_query("start=2024-01-02").to_request(),
            Err(ParameterError::InvalidDateRange(_))
        ));
        assert!(matches!(
            history_query("start=2024-01-02&end=March").to_request(),
            Err(ParameterError::InvalidDateRange(_))
        ));
    }

    #[test]
    fn test_predict_defaults() {
        let params: PredictQuery = serde_urlencoded::from_str("").unwrap();
        assert_eq!(model_kind(params.model.as_deref()).unwrap(), ModelKind::Ensemble);
        assert_eq!(
            training_period(params.period.as_deref()).unwrap(),
            TrainingPeriod::OneYear
        );
        assert!(model_kind(Some("svm")).is_err());
        assert!(training_period(Some("10y")).is_err());
    }
}
