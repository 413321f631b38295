//! AI prediction category: the single point where a model forecast feeds
//! into the signal.

use super::{ForecastView, Scorecard};
use crate::types::{SignalDetail, SignalStrength};

pub(super) fn score(forecast: Option<ForecastView<'_>>) -> (f64, Vec<SignalDetail>) {
    let mut card = Scorecard::new();

    let Some(forecast) = forecast else {
        card.push(
            "AI_Prediction",
            "unavailable",
            "No model forecast available",
            SignalStrength::Weak,
            0,
        );
        return card.finish();
    };
    let Some(first) = forecast.points.first() else {
        return card.finish();
    };
    if forecast.current_price <= 0.0 {
        return card.finish();
    }

    let change_pct = (first.predicted_price - forecast.current_price) / forecast.current_price * 100.0;
    let horizon = format!("for {}", first.date);
    if change_pct > 5.0 {
        card.push(
            "AI_Prediction",
            "strong_bullish",
            format!("Model forecasts a {:.1}% rise {}", change_pct, horizon),
            SignalStrength::Strong,
            30,
        );
    } else if change_pct > 2.0 {
        card.push(
            "AI_Prediction",
            "bullish",
            format!("Model forecasts a {:.1}% rise {}", change_pct, horizon),
            SignalStrength::Medium,
            20,
        );
    } else if change_pct < -5.0 {
        card.push(
            "AI_Prediction",
            "strong_bearish",
            format!("Model forecasts a {:.1}% drop {}", change_pct.abs(), horizon),
            SignalStrength::Strong,
            -30,
        );
    } else if change_pct < -2.0 {
        card.push(
            "AI_Prediction",
            "bearish",
            format!("Model forecasts a {:.1}% drop {}", change_pct.abs(), horizon),
            SignalStrength::Medium,
            -20,
        );
    } else {
        card.push(
            "AI_Prediction",
            "neutral",
            format!("Model forecasts a {:+.1}% change {}", change_pct, horizon),
            SignalStrength::Weak,
            0,
        );
    }

    card.finish()
}
