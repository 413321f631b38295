//! Trading signal analyzer.
//!
//! Scores the latest indicator row against the previous one in five
//! categories, blends them with fixed weights into a composite in
//! [0, 100] and classifies the composite into a [`SignalType`]. Pure
//! function of its inputs; nothing is cached between calls.

pub mod history;
pub mod levels;
mod momentum;
mod prediction;
mod trend;
mod volatility;
mod volume;

pub use history::replay_history;
pub use levels::key_levels;

use chrono::Utc;

use crate::types::{
    CategoryScores, DetailedSignals, ForecastPoint, IndicatorRow, SignalCategory, SignalDetail,
    SignalReport, SignalStrength, SignalType,
};

/// Neutral starting score of every category.
pub const BASELINE_SCORE: f64 = 50.0;
/// Confidence floor once at least two rows are available.
pub const MIN_CONFIDENCE: f64 = 0.3;
/// Strong detail signals quoted in the recommendation text.
const MAX_REASONS: usize = 2;

/// Forecast handed to the AI prediction category.
#[derive(Debug, Clone, Copy)]
pub struct ForecastView<'a> {
    /// Close the forecast was made from.
    pub current_price: f64,
    pub points: &'a [ForecastPoint],
}

/// Indicator row flattened to plain floats.
///
/// Missing indicators become NaN so every comparison against them is
/// false and no rule fires on incomplete data.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Reading {
    pub close: f64,
    pub volume: f64,
    pub ma5: f64,
    pub ma10: f64,
    pub ma20: f64,
    pub ma60: f64,
    pub rsi: f64,
    pub macd: f64,
    pub macd_signal: f64,
    pub macd_hist: f64,
    pub kdj_k: f64,
    pub kdj_d: f64,
    pub kdj_j: f64,
    pub obv: f64,
    pub atr: f64,
    pub cci: f64,
    pub bb_upper: f64,
    pub bb_lower: f64,
    pub bb_width: f64,
    pub volume_change: f64,
    pub volume_ma5: f64,
    pub volume_ma20: f64,
    pub williams_r: f64,
    pub dmi_plus: f64,
    pub dmi_minus: f64,
    pub adx: f64,
}

impl From<&IndicatorRow> for Reading {
    fn from(row: &IndicatorRow) -> Self {
        let v = |x: Option<f64>| x.unwrap_or(f64::NAN);
        let i = &row.indicators;
        Self {
            close: row.bar.close,
            volume: row.bar.volume,
            ma5: v(i.ma5),
            ma10: v(i.ma10),
            ma20: v(i.ma20),
            ma60: v(i.ma60),
            rsi: v(i.rsi),
            macd: v(i.macd),
            macd_signal: v(i.macd_signal),
            macd_hist: v(i.macd_hist),
            kdj_k: v(i.kdj_k),
            kdj_d: v(i.kdj_d),
            kdj_j: v(i.kdj_j),
            obv: v(i.obv),
            atr: v(i.atr),
            cci: v(i.cci),
            bb_upper: v(i.bb_upper),
            bb_lower: v(i.bb_lower),
            bb_width: v(i.bb_width),
            volume_change: v(i.volume_change),
            volume_ma5: v(i.volume_ma5),
            volume_ma20: v(i.volume_ma20),
            williams_r: v(i.williams_r),
            dmi_plus: v(i.dmi_plus),
            dmi_minus: v(i.dmi_minus),
            adx: v(i.adx),
        }
    }
}

/// Running score of one category.
pub(crate) struct Scorecard {
    score: f64,
    details: Vec<SignalDetail>,
}

impl Scorecard {
    pub fn new() -> Self {
        Self {
            score: BASELINE_SCORE,
            details: Vec::new(),
        }
    }

    /// Record a detected condition and apply its impact.
    pub fn push(
        &mut self,
        indicator: &str,
        signal: &str,
        description: impl Into<String>,
        strength: SignalStrength,
        impact: i32,
    ) {
        self.score += impact as f64;
        self.details
            .push(SignalDetail::new(indicator, signal, description, strength, impact));
    }

    /// Clamped score and the collected details.
    pub fn finish(self) -> (f64, Vec<SignalDetail>) {
        (self.score.clamp(0.0, 100.0), self.details)
    }
}

/// Analyze the trailing rows of an indicator table.
///
/// Uses the last row as the current session and the one before it for
/// crosses and changes. Fewer than two rows yields the empty report.
pub fn analyze(ticker: &str, rows: &[IndicatorRow], forecast: Option<ForecastView<'_>>) -> SignalReport {
    let (previous_row, latest_row) = match rows {
        [.., previous, latest] => (previous, latest),
        _ => return empty_report(ticker),
    };
    let latest = Reading::from(latest_row);
    let previous = Reading::from(previous_row);

    let (trend, trend_details) = trend::score(&latest, &previous);
    let (momentum, momentum_details) = momentum::score(&latest, &previous);
    let (volume, volume_details) = volume::score(&latest, &previous);
    let (volatility, volatility_details) = volatility::score(&latest);
    let (ai_prediction, ai_details) = prediction::score(forecast);

    let scores = CategoryScores {
        trend,
        momentum,
        volume,
        volatility,
        ai_prediction,
    };
    let total = composite_score(&scores);
    let signal = SignalType::from_score(total);
    let confidence = agreement(&scores);

    let details = DetailedSignals {
        trend: trend_details,
        momentum: momentum_details,
        volume: volume_details,
        volatility: volatility_details,
        ai: ai_details,
    };
    let recommendation = recommendation(signal, total, confidence, &details);
    let levels = key_levels(rows, signal);

    SignalReport {
        ticker: ticker.to_string(),
        timestamp: Utc::now(),
        signal,
        score: round2(total),
        confidence: round2(confidence),
        recommendation,
        category_scores: Some(CategoryScores {
            trend: round2(trend),
            momentum: round2(momentum),
            volume: round2(volume),
            volatility: round2(volatility),
            ai_prediction: round2(ai_prediction),
        }),
        detailed_signals: details,
        key_levels: Some(levels),
        risk_reward_ratio: levels::risk_reward(&levels),
    }
}

/// Weighted sum of the category scores.
pub fn composite_score(scores: &CategoryScores) -> f64 {
    SignalCategory::ALL
        .iter()
        .map(|c| scores.get(*c) * c.weight())
        .sum()
}

/// `1 - std/50` over the five category scores, clamped to [0.3, 1].
pub fn agreement(scores: &CategoryScores) -> f64 {
    let values = scores.as_array();
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (1.0 - variance.sqrt() / 50.0).clamp(MIN_CONFIDENCE, 1.0)
}

fn recommendation(signal: SignalType, score: f64, confidence: f64, details: &DetailedSignals) -> String {
    let advice = match signal {
        SignalType::StrongBuy => "Strong buy",
        SignalType::Buy => "Buy",
        SignalType::Hold => "Hold or wait",
        SignalType::Sell => "Sell",
        SignalType::StrongSell => "Strong sell",
    };
    let base = format!(
        "{} (score: {:.0}/100, confidence: {:.0}%)",
        advice,
        score,
        confidence * 100.0
    );

    let reasons: Vec<&str> = details
        .trend
        .iter()
        .chain(&details.momentum)
        .chain(&details.volume)
        .filter(|d| d.strength == SignalStrength::Strong)
        .take(MAX_REASONS)
        .map(|d| d.description.as_str())
        .collect();

    if reasons.is_empty() {
        base
    } else {
        format!("{}\nKey reasons: {}", base, reasons.join(", "))
    }
}

/// Report returned when there is not enough data to compare two sessions.
pub fn empty_report(ticker: &str) -> SignalReport {
    SignalReport {
        ticker: ticker.to_string(),
        timestamp: Utc::now(),
        signal: SignalType::Hold,
        score: BASELINE_SCORE,
        confidence: 0.0,
        recommendation: "Insufficient data to generate a signal".to_string(),
        category_scores: None,
        detailed_signals: DetailedSignals::default(),
        key_levels: None,
        risk_reward_ratio: 0.0,
    }
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
