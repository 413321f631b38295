use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::sources::MarketDataProvider;
use crate::types::ModelKind;
use crate::AppState;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    /// Tags of the models this process can run.
    models: Vec<&'static str>,
}

async fn health<P: MarketDataProvider>(State(state): State<AppState<P>>) -> Json<HealthResponse> {
    let catalog = state.service.catalog();
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        models: ModelKind::ALL
            .into_iter()
            .filter(|&kind| catalog.is_available(kind))
            .map(|kind| kind.tag())
            .collect(),
    })
}

pub fn router<P: MarketDataProvider>() -> Router<AppState<P>> {
    Router::new().route("/api/health", get(health::<P>))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use crate::config::Config;
    use crate::services::forecast::{EnsembleSettings, SequenceSettings};
    use crate::services::{AnalysisService, ModelCatalog};
    use crate::sources::InMemoryProvider;

    fn state(sequence_enabled: bool) -> AppState<InMemoryProvider> {
        let catalog = ModelCatalog::new(
            EnsembleSettings::default(),
            SequenceSettings::default(),
            sequence_enabled,
        );
        let service = AnalysisService::new(
            Arc::new(InMemoryProvider::new()),
            catalog,
            Duration::from_secs(1),
        );
        AppState::new(Config::default(), service)
    }

    #[test]
    fn test_health_response_serialization() {
        let response = HealthResponse {
            status: "ok",
            version: "1.0.0",
            models: vec!["linear"],
        };

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"status\":\"ok\""));
        assert!(json.contains("\"version\":\"1.0.0\""));
        assert!(json.contains("\"models\":[\"linear\"]"));
    }

    #[tokio::test]
    async fn test_health_lists_available_models() {
        let Json(response) = health(State(state(false))).await;
        assert_eq!(response.status, "ok");
        assert_eq!(response.version, env!("CARGO_PKG_VERSION"));
        assert_eq!(response.models, vec!["linear", "random_forest"]);
    }
}
