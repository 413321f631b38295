pub mod backtest;
pub mod comparison;
pub mod health;
pub mod signals;
pub mod stock;

use axum::extract::rejection::QueryRejection;
use axum::extract::Query;
use axum::http::HeaderValue;
use axum::Router;
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::error::AppError;
use crate::sources::MarketDataProvider;
use crate::AppState;

/// Success envelope shared by every endpoint.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Unwrap query parameters, turning malformed ones into a JSON 400.
pub(crate) fn query<T>(query: Result<Query<T>, QueryRejection>) -> Result<T, AppError> {
    query
        .map(|Query(q)| q)
        .map_err(|e| AppError::BadRequest(e.body_text()))
}

/// Create the API router.
pub fn router<P: MarketDataProvider>() -> Router<AppState<P>> {
    Router::new()
        .merge(health::router())
        .nest(
            "/api/stock",
            stock::router()
                .merge(signals::router())
                .merge(backtest::router())
                .merge(comparison::router()),
        )
}

/// Full application with CORS and request tracing.
pub fn app<P: MarketDataProvider>(state: AppState<P>) -> anyhow::Result<Router> {
    let cors = match state.config.cors_origin.as_deref() {
        Some(origin) => CorsLayer::new().allow_origin(HeaderValue::from_str(origin)?),
        None => CorsLayer::new().allow_origin(Any),
    }
    .allow_methods(Any)
    .allow_headers(Any);

    Ok(router()
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}
