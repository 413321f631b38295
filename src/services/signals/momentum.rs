//! Momentum category: RSI zones, KDJ crosses, CCI and Williams %R.

use super::{Reading, Scorecard};
use crate::types::{SignalDetail, SignalStrength};

pub(super) fn score(latest: &Reading, previous: &Reading) -> (f64, Vec<SignalDetail>) {
    let mut card = Scorecard::new();

    let rsi = latest.rsi;
    if rsi < 30.0 {
        let strength = if rsi < 20.0 {
            SignalStrength::Strong
        } else {
            SignalStrength::Medium
        };
        card.push(
            "RSI",
            "oversold",
            format!("RSI {:.1} oversold, rebound possible", rsi),
            strength,
            20,
        );
    } else if rsi > 70.0 {
        let strength = if rsi > 80.0 {
            SignalStrength::Strong
        } else {
            SignalStrength::Medium
        };
        card.push(
            "RSI",
            "overbought",
            format!("RSI {:.1} overbought, pullback possible", rsi),
            strength,
            -20,
        );
    } else if (40.0..=60.0).contains(&rsi) {
        card.push(
            "RSI",
            "neutral",
            format!("RSI {:.1} in the neutral zone", rsi),
            SignalStrength::Weak,
            0,
        );
    } else if rsi > 60.0 {
        card.push(
            "RSI",
            "strong",
            format!("RSI {:.1} in the strong zone", rsi),
            SignalStrength::Medium,
            10,
        );
    } else {
        card.push(
            "RSI",
            "weak",
            format!("RSI {:.1} in the weak zone", rsi),
            SignalStrength::Medium,
            -10,
        );
    }

    let (k, d) = (latest.kdj_k, latest.kdj_d);
    if k > d && previous.kdj_k <= previous.kdj_d {
        card.push(
            "KDJ",
            "golden_cross",
            format!("KDJ golden cross (K {:.1} > D {:.1})", k, d),
            SignalStrength::Strong,
            15,
        );
    } else if k < d && previous.kdj_k >= previous.kdj_d {
        card.push(
            "KDJ",
            "death_cross",
            format!("KDJ death cross (K {:.1} < D {:.1})", k, d),
            SignalStrength::Strong,
            -15,
        );
    }

    if latest.kdj_j < 20.0 {
        card.push(
            "KDJ_J",
            "oversold",
            format!("KDJ J {:.1} in oversold territory", latest.kdj_j),
            SignalStrength::Medium,
            10,
        );
    } else if latest.kdj_j > 80.0 {
        card.push(
            "KDJ_J",
            "overbought",
            format!("KDJ J {:.1} in overbought territory", latest.kdj_j),
            SignalStrength::Medium,
            -10,
        );
    }

    if latest.cci > 100.0 {
        card.push(
            "CCI",
            "overbought",
            format!("CCI {:.1} overbought", latest.cci),
            SignalStrength::Medium,
            -10,
        );
    } else if latest.cci < -100.0 {
        card.push(
            "CCI",
            "oversold",
            format!("CCI {:.1} oversold", latest.cci),
            SignalStrength::Medium,
            10,
        );
    }

    if latest.williams_r > -20.0 {
        card.push(
            "Williams_R",
            "overbought",
            format!("Williams %R {:.1} overbought", latest.williams_r),
            SignalStrength::Medium,
            -10,
        );
    } else if latest.williams_r < -80.0 {
        card.push(
            "Williams_R",
            "oversold",
            format!("Williams %R {:.1} oversold", latest.williams_r),
            SignalStrength::Medium,
            10,
        );
    }

    card.finish()
}
