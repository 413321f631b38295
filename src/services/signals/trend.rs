//! Trend category: MACD, ADX/DMI and moving-average structure.

use super::{Reading, Scorecard};
use crate::types::{SignalDetail, SignalStrength};

/// ADX above this marks a trending market.
const ADX_TRENDING: f64 = 25.0;
const ADX_STRONG: f64 = 40.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Alignment {
    Bullish,
    Bearish,
    Mixed,
}

fn ma_alignment(r: &Reading) -> Alignment {
    if r.ma5 > r.ma10 && r.ma10 > r.ma20 && r.ma20 > r.ma60 {
        Alignment::Bullish
    } else if r.ma5 < r.ma10 && r.ma10 < r.ma20 && r.ma20 < r.ma60 {
        Alignment::Bearish
    } else {
        Alignment::Mixed
    }
}

pub(super) fn score(latest: &Reading, previous: &Reading) -> (f64, Vec<SignalDetail>) {
    let mut card = Scorecard::new();

    if latest.macd > latest.macd_signal {
        if previous.macd <= previous.macd_signal {
            card.push(
                "MACD",
                "golden_cross",
                "MACD golden cross, strong buy signal",
                SignalStrength::Strong,
                25,
            );
        } else {
            card.push(
                "MACD",
                "bullish",
                "MACD holding above its signal line",
                SignalStrength::Medium,
                15,
            );
        }
    } else if previous.macd >= previous.macd_signal {
        card.push(
            "MACD",
            "death_cross",
            "MACD death cross, strong sell signal",
            SignalStrength::Strong,
            -25,
        );
    } else {
        card.push(
            "MACD",
            "bearish",
            "MACD holding below its signal line",
            SignalStrength::Medium,
            -15,
        );
    }

    if latest.macd_hist > 0.0 && latest.macd_hist > previous.macd_hist {
        card.push(
            "MACD_Histogram",
            "increasing",
            "MACD histogram expanding, momentum strengthening",
            SignalStrength::Medium,
            10,
        );
    } else if latest.macd_hist < 0.0 && latest.macd_hist < previous.macd_hist {
        card.push(
            "MACD_Histogram",
            "decreasing",
            "MACD histogram deepening, momentum weakening",
            SignalStrength::Medium,
            -10,
        );
    }

    if latest.adx > ADX_TRENDING {
        let strength = if latest.adx > ADX_STRONG {
            SignalStrength::Strong
        } else {
            SignalStrength::Medium
        };
        if latest.dmi_plus > latest.dmi_minus {
            card.push(
                "ADX",
                "strong_uptrend",
                format!("ADX {:.1} with DMI+ leading, clear uptrend", latest.adx),
                strength,
                15,
            );
        } else {
            card.push(
                "ADX",
                "strong_downtrend",
                format!("ADX {:.1} with DMI- leading, clear downtrend", latest.adx),
                strength,
                -15,
            );
        }
    } else {
        card.push(
            "ADX",
            "no_trend",
            format!("ADX {:.1}, no clear trend", latest.adx),
            SignalStrength::Weak,
            0,
        );
    }

    match ma_alignment(latest) {
        Alignment::Bullish => card.push(
            "MA_Alignment",
            "bullish",
            "Bullish moving average alignment (MA5 > MA10 > MA20 > MA60)",
            SignalStrength::Medium,
            10,
        ),
        Alignment::Bearish => card.push(
            "MA_Alignment",
            "bearish",
            "Bearish moving average alignment (MA5 < MA10 < MA20 < MA60)",
            SignalStrength::Medium,
            -10,
        ),
        Alignment::Mixed => {}
    }

    if latest.close > latest.ma60 {
        card.push(
            "Price_vs_MA60",
            "above",
            "Price above MA60, long-term trend up",
            SignalStrength::Weak,
            5,
        );
    } else {
        card.push(
            "Price_vs_MA60",
            "below",
            "Price below MA60, long-term trend down",
            SignalStrength::Weak,
            -5,
        );
    }

    card.finish()
}
