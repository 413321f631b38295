//! Market data providers.

pub mod memory;
pub mod yahoo;

pub use memory::InMemoryProvider;
pub use yahoo::YahooFinanceClient;

use std::future::Future;

use thiserror::Error;

use crate::types::{FailureKind, HistoryRequest, StockHistory};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProviderError {
    #[error("No data found for ticker {0}")]
    NoData(String),
    #[error("Market data provider unavailable: {0}")]
    Unavailable(String),
    #[error("Market data provider timed out")]
    Timeout,
    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),
}

impl ProviderError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::NoData(_) => FailureKind::DataUnavailable,
            Self::Unavailable(_) | Self::Timeout | Self::InvalidResponse(_) => {
                FailureKind::ProviderUnavailable
            }
        }
    }
}

/// Source of daily OHLCV history.
///
/// Implementations return bars in strictly ascending date order and report
/// an unknown ticker or an empty range as [`ProviderError::NoData`].
pub trait MarketDataProvider: Send + Sync + 'static {
    fn fetch_history(
        &self,
        ticker: &str,
        request: HistoryRequest,
    ) -> impl Future<Output = Result<StockHistory, ProviderError>> + Send;
}

/// Normalize a ticker for lookups: trimmed, upper case, share-class dots
/// as hyphens (`BRK.B` becomes `BRK-B`).
pub fn normalize_ticker(ticker: &str) -> String {
    ticker.trim().to_uppercase().replace('.', "-")
}
