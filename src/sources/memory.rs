//! In-memory market data, for tests and offline runs.

use dashmap::DashMap;

use super::{normalize_ticker, MarketDataProvider, ProviderError};
use crate::types::{HistoryRequest, OhlcvBar, StockHistory};

/// Provider backed by preloaded bar series.
#[derive(Debug, Default)]
pub struct InMemoryProvider {
    series: DashMap<String, Vec<OhlcvBar>>,
}

impl InMemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the full history of a ticker.
    pub fn insert(&self, ticker: &str, mut bars: Vec<OhlcvBar>) {
        bars.sort_by_key(|b| b.date);
        bars.dedup_by_key(|b| b.date);
        self.series.insert(normalize_ticker(ticker), bars);
    }

    pub fn with_series(self, ticker: &str, bars: Vec<OhlcvBar>) -> Self {
        self.insert(ticker, bars);
        self
    }

    fn select(bars: &[OhlcvBar], request: HistoryRequest) -> Vec<OhlcvBar> {
        let tail = |n: usize| bars[bars.len().saturating_sub(n)..].to_vec();
        match request {
            HistoryRequest::Period(period) => match period.trading_days() {
                Some(n) => tail(n),
                None => bars.to_vec(),
            },
            HistoryRequest::TradingDays(n) => tail(n),
            HistoryRequest::Range { start, end } => bars
                .iter()
                .filter(|b| b.date >= start && b.date <= end)
                .copied()
                .collect(),
        }
    }
}

impl MarketDataProvider for InMemoryProvider {
    async fn fetch_history(&self, ticker: &str, request: HistoryRequest) -> Result<StockHistory, ProviderError> {
        let symbol = normalize_ticker(ticker);
        let prices = self
            .series
            .get(&symbol)
            .map(|bars| Self::select(bars.value(), request))
            .unwrap_or_default();
        if prices.is_empty() {
            return Err(ProviderError::NoData(symbol));
        }
        Ok(StockHistory {
            ticker: symbol,
            prices,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::indicators::test_support::{start_date, wavy_bars};
    use crate::types::HistoryPeriod;
    use chrono::Duration;

    fn provider() -> InMemoryProvider {
        InMemoryProvider::new().with_series("aapl", wavy_bars(300))
    }

    #[tokio::test]
    async fn test_period_returns_trailing_sessions() {
        let history = provider()
            .fetch_history("AAPL", HistoryRequest::Period(HistoryPeriod::SixMonths))
            .await
            .unwrap();
        assert_eq!(history.ticker, "AAPL");
        assert_eq!(history.prices.len(), 126);
        assert_eq!(history.prices.last().unwrap().date, start_date() + Duration::days(299));

        let all = provider()
            .fetch_history("aapl", HistoryRequest::Period(HistoryPeriod::Max))
            .await
            .unwrap();
        assert_eq!(all.prices.len(), 300);
    }

    #[tokio::test]
    async fn test_range_is_inclusive() {
        let start = start_date() + Duration::days(10);
        let end = start_date() + Duration::days(19);
        let history = provider()
            .fetch_history("AAPL", HistoryRequest::Range { start, end })
            .await
            .unwrap();
        assert_eq!(history.prices.len(), 10);
        assert_eq!(history.prices[0].date, start);
        assert_eq!(history.prices[9].date, end);
    }

    #[test]
    fn test_unknown_ticker_is_no_data() {
        let err = tokio_test::block_on(provider().fetch_history("MSFT", HistoryRequest::TradingDays(30)))
            .unwrap_err();
        assert_eq!(err, ProviderError::NoData("MSFT".to_string()));
    }
}
