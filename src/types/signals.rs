use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Discrete trading signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalType {
    StrongBuy,
    Buy,
    Hold,
    Sell,
    StrongSell,
}

impl SignalType {
    /// Classify a composite score in [0, 100].
    ///
    /// Thresholds are inclusive lower bounds checked from the top.
    pub fn from_score(score: f64) -> Self {
        if score >= 75.0 {
            Self::StrongBuy
        } else if score >= 60.0 {
            Self::Buy
        } else if score >= 40.0 {
            Self::Hold
        } else if score >= 25.0 {
            Self::Sell
        } else {
            Self::StrongSell
        }
    }

    pub fn is_buy_side(&self) -> bool {
        matches!(self, Self::StrongBuy | Self::Buy)
    }

    pub fn is_sell_side(&self) -> bool {
        matches!(self, Self::StrongSell | Self::Sell)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::StrongBuy => "Strong Buy",
            Self::Buy => "Buy",
            Self::Hold => "Hold",
            Self::Sell => "Sell",
            Self::StrongSell => "Strong Sell",
        }
    }
}

/// Scoring category of the analyzer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalCategory {
    Trend,
    Momentum,
    Volume,
    Volatility,
    AiPrediction,
}

impl SignalCategory {
    pub const ALL: [SignalCategory; 5] = [
        Self::Trend,
        Self::Momentum,
        Self::Volume,
        Self::Volatility,
        Self::AiPrediction,
    ];

    /// Fixed composite weight. The five weights sum to 1.
    pub fn weight(&self) -> f64 {
        match self {
            Self::Trend => 0.30,
            Self::Momentum => 0.25,
            Self::Volume => 0.20,
            Self::Volatility => 0.15,
            Self::AiPrediction => 0.10,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Trend => "Trend",
            Self::Momentum => "Momentum",
            Self::Volume => "Volume",
            Self::Volatility => "Volatility",
            Self::AiPrediction => "AI Prediction",
        }
    }
}

/// How strongly a single reading argues for its direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalStrength {
    Strong,
    Medium,
    Weak,
}

/// One detected indicator condition and its score adjustment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalDetail {
    pub indicator: String,
    pub signal: String,
    pub description: String,
    pub strength: SignalStrength,
    pub impact: i32,
}

impl SignalDetail {
    pub fn new(
        indicator: &str,
        signal: &str,
        description: impl Into<String>,
        strength: SignalStrength,
        impact: i32,
    ) -> Self {
        Self {
            indicator: indicator.to_string(),
            signal: signal.to_string(),
            description: description.into(),
            strength,
            impact,
        }
    }
}

/// Per-category scores, each clamped to [0, 100].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CategoryScores {
    pub trend: f64,
    pub momentum: f64,
    pub volume: f64,
    pub volatility: f64,
    pub ai_prediction: f64,
}

impl CategoryScores {
    pub fn get(&self, category: SignalCategory) -> f64 {
        match category {
            SignalCategory::Trend => self.trend,
            SignalCategory::Momentum => self.momentum,
            SignalCategory::Volume => self.volume,
            SignalCategory::Volatility => self.volatility,
            SignalCategory::AiPrediction => self.ai_prediction,
        }
    }

    pub fn as_array(&self) -> [f64; 5] {
        [
            self.trend,
            self.momentum,
            self.volume,
            self.volatility,
            self.ai_prediction,
        ]
    }
}

/// Detail signals grouped by category.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetailedSignals {
    pub trend: Vec<SignalDetail>,
    pub momentum: Vec<SignalDetail>,
    pub volume: Vec<SignalDetail>,
    pub volatility: Vec<SignalDetail>,
    pub ai: Vec<SignalDetail>,
}

impl DetailedSignals {
    pub fn is_empty(&self) -> bool {
        self.trend.is_empty()
            && self.momentum.is_empty()
            && self.volume.is_empty()
            && self.volatility.is_empty()
            && self.ai.is_empty()
    }
}

/// Price levels derived from recent range and ATR.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KeyLevels {
    pub current_price: f64,
    pub support: f64,
    pub resistance: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
}

/// Full analyzer output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalReport {
    pub ticker: String,
    pub timestamp: DateTime<Utc>,
    pub signal: SignalType,
    /// Weighted composite in [0, 100].
    pub score: f64,
    /// Cross-category agreement in [0.3, 1], or 0 for the empty report.
    pub confidence: f64,
    pub recommendation: String,
    pub category_scores: Option<CategoryScores>,
    pub detailed_signals: DetailedSignals,
    pub key_levels: Option<KeyLevels>,
    pub risk_reward_ratio: f64,
}

/// Latest session figures attached to a live signal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarketInfo {
    pub latest_close: f64,
    pub latest_volume: f64,
    pub price_change_1d: Option<f64>,
    pub price_change_5d: Option<f64>,
    pub price_change_20d: Option<f64>,
    pub volume_change: Option<f64>,
}

/// Signal report plus market context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalAnalysis {
    #[serde(flatten)]
    pub report: SignalReport,
    pub market_info: MarketInfo,
}

/// Replayed signal for one past session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalHistoryEntry {
    pub date: NaiveDate,
    pub signal: SignalType,
    pub score: f64,
    pub confidence: f64,
    pub price: f64,
    pub volume: f64,
}

/// Next-session hit rate of replayed signals.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SignalHistoryStats {
    pub total_signals: usize,
    pub correct_signals: usize,
    /// Percentage of scored signals that called the next move correctly.
    pub accuracy: f64,
    pub buy_signals: usize,
    pub sell_signals: usize,
    pub hold_signals: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalHistory {
    pub ticker: String,
    pub days: u32,
    pub history: Vec<SignalHistoryEntry>,
    pub statistics: SignalHistoryStats,
}
