use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::ParameterError;

/// One daily OHLCV bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OhlcvBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl OhlcvBar {
    /// Placeholder bar appended during iterated forecasting.
    ///
    /// Open and close sit on the predicted price, the range is a flat ±1%
    /// and volume is carried over from the previous session.
    pub fn synthetic(date: NaiveDate, price: f64, volume: f64) -> Self {
        Self {
            date,
            open: price,
            high: price * 1.01,
            low: price * 0.99,
            close: price,
            volume,
        }
    }
}

/// Daily history as returned by a market data provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockHistory {
    pub ticker: String,
    pub prices: Vec<OhlcvBar>,
}

/// Provider look-back ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HistoryPeriod {
    #[serde(rename = "1mo")]
    OneMonth,
    #[serde(rename = "3mo")]
    ThreeMonths,
    #[serde(rename = "6mo")]
    SixMonths,
    #[serde(rename = "1y")]
    OneYear,
    #[serde(rename = "2y")]
    TwoYears,
    #[serde(rename = "3y")]
    ThreeYears,
    #[serde(rename = "5y")]
    FiveYears,
    #[serde(rename = "max")]
    Max,
}

impl HistoryPeriod {
    /// Parse a range label such as `"6mo"`.
    pub fn parse(s: &str) -> Result<Self, ParameterError> {
        match s.trim().to_lowercase().as_str() {
            "1mo" => Ok(Self::OneMonth),
            "3mo" => Ok(Self::ThreeMonths),
            "6mo" => Ok(Self::SixMonths),
            "1y" => Ok(Self::OneYear),
            "2y" => Ok(Self::TwoYears),
            "3y" => Ok(Self::ThreeYears),
            "5y" => Ok(Self::FiveYears),
            "max" => Ok(Self::Max),
            other => Err(ParameterError::UnknownPeriod(other.to_string())),
        }
    }

    /// Range label understood by the chart API.
    pub fn label(&self) -> &'static str {
        match self {
            Self::OneMonth => "1mo",
            Self::ThreeMonths => "3mo",
            Self::SixMonths => "6mo",
            Self::OneYear => "1y",
            Self::TwoYears => "2y",
            Self::ThreeYears => "3y",
            Self::FiveYears => "5y",
            Self::Max => "max",
        }
    }

    /// Approximate number of trading sessions in the range, `None` for max.
    pub fn trading_days(&self) -> Option<usize> {
        match self {
            Self::OneMonth => Some(21),
            Self::ThreeMonths => Some(63),
            Self::SixMonths => Some(126),
            Self::OneYear => Some(252),
            Self::TwoYears => Some(504),
            Self::ThreeYears => Some(756),
            Self::FiveYears => Some(1260),
            Self::Max => None,
        }
    }
}

/// What slice of history to ask the provider for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryRequest {
    Period(HistoryPeriod),
    /// The most recent N trading sessions.
    TradingDays(usize),
    /// Inclusive calendar date range.
    Range { start: NaiveDate, end: NaiveDate },
}

/// Training window labels accepted by forecast and backtest requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum TrainingPeriod {
    #[serde(rename = "1mo")]
    OneMonth,
    #[serde(rename = "3mo")]
    ThreeMonths,
    #[serde(rename = "6mo")]
    SixMonths,
    #[default]
    #[serde(rename = "1y")]
    OneYear,
    #[serde(rename = "2y")]
    TwoYears,
    #[serde(rename = "5y")]
    FiveYears,
    #[serde(rename = "max")]
    Max,
}

impl TrainingPeriod {
    pub const ALL: [TrainingPeriod; 7] = [
        Self::OneMonth,
        Self::ThreeMonths,
        Self::SixMonths,
        Self::OneYear,
        Self::TwoYears,
        Self::FiveYears,
        Self::Max,
    ];

    /// Parse a period label such as `"1y"`.
    pub fn parse(s: &str) -> Result<Self, ParameterError> {
        match s.trim().to_lowercase().as_str() {
            "1mo" => Ok(Self::OneMonth),
            "3mo" => Ok(Self::ThreeMonths),
            "6mo" => Ok(Self::SixMonths),
            "1y" => Ok(Self::OneYear),
            "2y" => Ok(Self::TwoYears),
            "5y" => Ok(Self::FiveYears),
            "max" => Ok(Self::Max),
            other => Err(ParameterError::UnknownPeriod(other.to_string())),
        }
    }

    pub fn label(&self) -> &'static str {
        self.history_period().label()
    }

    /// History range used for training.
    pub fn history_period(&self) -> HistoryPeriod {
        match self {
            Self::OneMonth => HistoryPeriod::OneMonth,
            Self::ThreeMonths => HistoryPeriod::ThreeMonths,
            Self::SixMonths => HistoryPeriod::SixMonths,
            Self::OneYear => HistoryPeriod::OneYear,
            Self::TwoYears => HistoryPeriod::TwoYears,
            Self::FiveYears => HistoryPeriod::FiveYears,
            Self::Max => HistoryPeriod::Max,
        }
    }

    /// Extended range fetched for a backtest so that the training window
    /// survives after the validation tail is cut off.
    pub fn backtest_period(&self) -> HistoryPeriod {
        match self {
            Self::ThreeMonths => HistoryPeriod::SixMonths,
            Self::SixMonths => HistoryPeriod::OneYear,
            Self::TwoYears => HistoryPeriod::ThreeYears,
            Self::FiveYears => HistoryPeriod::Max,
            // Anything without its own extension falls back to two years.
            Self::OneMonth | Self::OneYear | Self::Max => HistoryPeriod::TwoYears,
        }
    }
}

impl std::fmt::Display for TrainingPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_training_period_parse() {
        assert_eq!(TrainingPeriod::parse("1y").unwrap(), TrainingPeriod::OneYear);
        assert_eq!(TrainingPeriod::parse(" 6MO ").unwrap(), TrainingPeriod::SixMonths);
        assert_eq!(TrainingPeriod::parse("max").unwrap(), TrainingPeriod::Max);
        assert!(matches!(
            TrainingPeriod::parse("10y"),
            Err(ParameterError::UnknownPeriod(_))
        ));
    }

    #[test]
    fn test_training_period_labels_round_trip() {
        for period in TrainingPeriod::ALL {
            assert_eq!(TrainingPeriod::parse(period.label()).unwrap(), period);
        }
    }

    #[test]
    fn test_backtest_extension_covers_training_window() {
        assert_eq!(TrainingPeriod::OneYear.backtest_period(), HistoryPeriod::TwoYears);
        assert_eq!(TrainingPeriod::TwoYears.backtest_period(), HistoryPeriod::ThreeYears);
        assert_eq!(TrainingPeriod::FiveYears.backtest_period(), HistoryPeriod::Max);
        assert_eq!(TrainingPeriod::OneMonth.backtest_period(), HistoryPeriod::TwoYears);
        assert_eq!(TrainingPeriod::Max.backtest_period(), HistoryPeriod::TwoYears);

        // Unbounded training history is the one label the fallback cannot cover.
        for period in TrainingPeriod::ALL.into_iter().filter(|p| *p != TrainingPeriod::Max) {
            let training = period.history_period().trading_days().unwrap_or(usize::MAX);
            let extended = period.backtest_period().trading_days().unwrap_or(usize::MAX);
            assert!(extended >= training, "{} does not extend", period);
        }
    }

    #[test]
    fn test_history_period_parse() {
        assert_eq!(HistoryPeriod::parse("3y").unwrap(), HistoryPeriod::ThreeYears);
        assert_eq!(HistoryPeriod::parse("MAX").unwrap(), HistoryPeriod::Max);
        assert!(HistoryPeriod::parse("1d").is_err());
    }

    #[test]
    fn test_synthetic_bar() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let bar = OhlcvBar::synthetic(date, 100.0, 5000.0);
        assert_eq!(bar.open, 100.0);
        assert_eq!(bar.close, 100.0);
        assert!((bar.high - 101.0).abs() < 1e-9);
        assert!((bar.low - 99.0).abs() < 1e-9);
        assert_eq!(bar.volume, 5000.0);
    }

    #[test]
    fn test_training_period_serde_labels() {
        let json = serde_json::to_string(&TrainingPeriod::ThreeMonths).unwrap();
        assert_eq!(json, "\"3mo\"");
        let parsed: TrainingPeriod = serde_json::from_str("\"2y\"").unwrap();
        assert_eq!(parsed, TrainingPeriod::TwoYears);
    }
}
