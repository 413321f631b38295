//! Volatility category: ATR relative to price and Bollinger band
//! position and width.

use super::{Reading, Scorecard};
use crate::types::{SignalDetail, SignalStrength};

/// Close position inside the Bollinger band, 0 at the lower band and 1 at
/// the upper. A collapsed band reads as the middle.
fn band_position(r: &Reading) -> f64 {
    let range = r.bb_upper - r.bb_lower;
    if range == 0.0 {
        return 0.5;
    }
    ((r.close - r.bb_lower) / range).clamp(0.0, 1.0)
}

/// Distance between the bands as a percentage of the close.
fn band_width_pct(r: &Reading) -> f64 {
    (r.bb_upper - r.bb_lower) / r.close * 100.0
}

pub(super) fn score(latest: &Reading) -> (f64, Vec<SignalDetail>) {
    let mut card = Scorecard::new();

    let atr_pct = latest.atr / latest.close * 100.0;
    if atr_pct > 3.0 {
        let strength = if atr_pct > 5.0 {
            SignalStrength::Strong
        } else {
            SignalStrength::Medium
        };
        card.push(
            "ATR",
            "high_volatility",
            format!("ATR {:.2}% of price, elevated risk", atr_pct),
            strength,
            -15,
        );
    } else if atr_pct < 1.5 {
        card.push(
            "ATR",
            "low_volatility",
            format!("ATR {:.2}% of price, relatively calm", atr_pct),
            SignalStrength::Medium,
            10,
        );
    } else {
        card.push(
            "ATR",
            "normal",
            format!("ATR {:.2}% of price, normal volatility", atr_pct),
            SignalStrength::Weak,
            0,
        );
    }

    let position = band_position(latest);
    if position > 0.8 {
        card.push(
            "Bollinger_Bands",
            "upper_band",
            "Price near the upper Bollinger band",
            SignalStrength::Medium,
            -15,
        );
    } else if position < 0.2 {
        card.push(
            "Bollinger_Bands",
            "lower_band",
            "Price near the lower Bollinger band",
            SignalStrength::Medium,
            15,
        );
    }

    let width_pct = band_width_pct(latest);
    if width_pct < 2.0 {
        card.push(
            "BB_Width",
            "squeeze",
            format!("Bollinger width {:.2}%, squeeze before a move", width_pct),
            SignalStrength::Weak,
            5,
        );
    } else if width_pct > 6.0 {
        card.push(
            "BB_Width",
            "expansion",
            format!("Bollinger width {:.2}%, volatility expanding", width_pct),
            SignalStrength::Weak,
            -5,
        );
    }

    card.finish()
}
