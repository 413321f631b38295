//! TickerScope - stock forecasting, trading signals and backtesting server

pub mod api;
pub mod config;
pub mod error;
pub mod services;
pub mod sources;
pub mod types;

use std::sync::Arc;

use config::Config;
use services::AnalysisService;

pub use error::{AppError, Result};
pub use types::*;

/// Shared application state.
pub struct AppState<P> {
    pub config: Arc<Config>,
    pub service: Arc<AnalysisService<P>>,
}

impl<P> AppState<P> {
    pub fn new(config: Config, service: AnalysisService<P>) -> Self {
        Self {
            config: Arc::new(config),
            service: Arc::new(service),
        }
    }
}

impl<P> Clone for AppState<P> {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
            service: Arc::clone(&self.service),
        }
    }
}
