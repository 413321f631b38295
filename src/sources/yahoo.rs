//! Yahoo Finance chart API client for daily stock history.
//!
//! Uses the unofficial v8 chart endpoint, which needs no API key.

use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::debug;

use super::{normalize_ticker, MarketDataProvider, ProviderError};
use crate::types::{HistoryRequest, OhlcvBar, StockHistory};

const CHART_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Yahoo Finance chart response.
#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<Quote>,
}

#[derive(Debug, Default, Deserialize)]
struct Quote {
    open: Option<Vec<Option<f64>>>,
    high: Option<Vec<Option<f64>>>,
    low: Option<Vec<Option<f64>>>,
    close: Option<Vec<Option<f64>>>,
    volume: Option<Vec<Option<f64>>>,
}

/// Yahoo Finance API client.
pub struct YahooFinanceClient {
    client: Client,
    base_url: String,
}

impl YahooFinanceClient {
    /// Create a client whose requests give up after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, ProviderError> {
        Self::with_base_url(CHART_URL, timeout)
    }

    /// Create a client against a different chart endpoint.
    pub fn with_base_url(base_url: &str, timeout: Duration) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ProviderError::Unavailable(format!("HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn query(request: &HistoryRequest) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("interval", "1d".to_string()),
            ("includePrePost", "false".to_string()),
        ];
        match request {
            HistoryRequest::Period(period) => params.push(("range", period.label().to_string())),
            HistoryRequest::TradingDays(days) => {
                // Roughly 5 sessions per 7 calendar days, plus holidays.
                let calendar_days = (*days as i64) * 7 / 5 + 10;
                let end = Utc::now();
                let start = end - chrono::Duration::days(calendar_days);
                params.push(("period1", start.timestamp().to_string()));
                params.push(("period2", end.timestamp().to_string()));
            }
            HistoryRequest::Range { start, end } => {
                params.push(("period1", day_start(*start).to_string()));
                // period2 is exclusive.
                params.push(("period2", day_start(*end + chrono::Duration::days(1)).to_string()));
            }
        }
        params
    }

    async fn fetch_chart(&self, symbol: &str, request: &HistoryRequest) -> Result<Vec<OhlcvBar>, ProviderError> {
        let url = format!("{}/{}", self.base_url, symbol);
        debug!("Fetching Yahoo Finance chart: {} {:?}", url, request);

        let response = self
            .client
            .get(&url)
            .query(&Self::query(request))
            .send()
            .await
            .map_err(request_error)?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(ProviderError::NoData(symbol.to_string()));
        }
        if !status.is_success() {
            return Err(ProviderError::Unavailable(format!("API error: {}", status)));
        }

        let data: ChartResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(format!("Parse error: {}", e)))?;
        parse_chart(symbol, data)
    }
}

impl MarketDataProvider for YahooFinanceClient {
    async fn fetch_history(&self, ticker: &str, request: HistoryRequest) -> Result<StockHistory, ProviderError> {
        let symbol = normalize_ticker(ticker);
        let mut prices = self.fetch_chart(&symbol, &request).await?;
        if let HistoryRequest::TradingDays(days) = request {
            let skip = prices.len().saturating_sub(days);
            prices.drain(..skip);
        }
        if prices.is_empty() {
            return Err(ProviderError::NoData(symbol));
        }
        debug!(ticker = %symbol, bars = prices.len(), "Fetched history");
        Ok(StockHistory {
            ticker: symbol,
            prices,
        })
    }
}

fn request_error(e: reqwest::Error) -> ProviderError {
    if e.is_timeout() {
        ProviderError::Timeout
    } else {
        ProviderError::Unavailable(format!("Request failed: {}", e))
    }
}

fn day_start(date: NaiveDate) -> i64 {
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp())
        .unwrap_or_default()
}

/// Turn a chart payload into ascending daily bars.
///
/// Sessions with any missing price are skipped; a missing volume reads as
/// zero. Duplicate dates keep the last bar.
fn parse_chart(symbol: &str, data: ChartResponse) -> Result<Vec<OhlcvBar>, ProviderError> {
    if let Some(error) = data.chart.error {
        return if error.code.eq_ignore_ascii_case("Not Found") {
            Err(ProviderError::NoData(symbol.to_string()))
        } else {
            Err(ProviderError::InvalidResponse(format!(
                "Yahoo API error: {} - {}",
                error.code, error.description
            )))
        };
    }

    let Some(result) = data.chart.result.and_then(|r| r.into_iter().next()) else {
        return Err(ProviderError::NoData(symbol.to_string()));
    };
    let timestamps = result.timestamp.unwrap_or_default();
    let quote = result.indicators.quote.into_iter().next().unwrap_or_default();

    let opens = quote.open.unwrap_or_default();
    let highs = quote.high.unwrap_or_default();
    let lows = quote.low.unwrap_or_default();
    let closes = quote.close.unwrap_or_default();
    let volumes = quote.volume.unwrap_or_default();
    let at = |column: &[Option<f64>], i: usize| column.get(i).copied().flatten();

    let mut bars: Vec<OhlcvBar> = Vec::with_capacity(timestamps.len());
    for (i, &ts) in timestamps.iter().enumerate() {
        let (Some(open), Some(high), Some(low), Some(close)) =
            (at(&opens, i), at(&highs, i), at(&lows, i), at(&closes, i))
        else {
            continue;
        };
        if close <= 0.0 {
            continue;
        }
        let Some(date) = DateTime::from_timestamp(ts, 0).map(|dt| dt.date_naive()) else {
            continue;
        };
        let bar = OhlcvBar {
            date,
            open,
            high,
            low,
            close,
            volume: at(&volumes, i).unwrap_or(0.0),
        };
        match bars.last().map(|b| b.date) {
            Some(previous) if previous > date => {
                return Err(ProviderError::InvalidResponse(
                    "timestamps out of order".to_string(),
                ))
            }
            Some(previous) if previous == date => {
                bars.pop();
                bars.push(bar);
            }
            _ => bars.push(bar),
        }
    }
    Ok(bars)
}
