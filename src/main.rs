use std::sync::Arc;

use tickerscope::api;
use tickerscope::config::Config;
use tickerscope::services::{AnalysisService, ModelCatalog};
use tickerscope::sources::YahooFinanceClient;
use tickerscope::AppState;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tickerscope=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env();
    info!("Starting TickerScope server on {}", config.bind_address());

    let provider = YahooFinanceClient::new(config.provider_timeout())?;
    let catalog = ModelCatalog::from_config(&config);
    for model in catalog.models() {
        info!(
            model = model.model.tag(),
            available = model.available,
            "Registered {}",
            model.name
        );
    }

    let service = AnalysisService::new(Arc::new(provider), catalog, config.provider_timeout());
    let addr = config.bind_address();
    let app = api::app(AppState::new(config, service))?;

    // Start the server
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("TickerScope server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
