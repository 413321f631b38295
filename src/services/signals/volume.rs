//! Volume category: volume surges against price direction, OBV and the
//! 5-day volume average.

use super::{Reading, Scorecard};
use crate::types::{SignalDetail, SignalStrength};

pub(super) fn score(latest: &Reading, previous: &Reading) -> (f64, Vec<SignalDetail>) {
    let mut card = Scorecard::new();

    // Compared as stored, a day-over-day fraction.
    let change = latest.volume_change;
    if change > 50.0 {
        if latest.close > previous.close {
            card.push(
                "Volume",
                "surge_bullish",
                format!("Volume up {:.1}% on a rising close, buyers stepping in", change),
                SignalStrength::Strong,
                20,
            );
        } else {
            card.push(
                "Volume",
                "surge_bearish",
                format!("Volume up {:.1}% on a falling close, heavy selling", change),
                SignalStrength::Strong,
                -15,
            );
        }
    } else if change > 20.0 {
        card.push(
            "Volume",
            "increasing",
            format!("Volume up {:.1}%", change),
            SignalStrength::Medium,
            10,
        );
    } else if change < -30.0 {
        card.push(
            "Volume",
            "shrinking",
            format!("Volume down {:.1}%, market waiting", change.abs()),
            SignalStrength::Medium,
            -10,
        );
    }

    // Baseline is the 20-day average volume valued at today's close.
    let obv_baseline = latest.volume_ma20 * latest.close;
    if latest.obv > obv_baseline {
        card.push(
            "OBV",
            "bullish",
            "OBV above its volume baseline, accumulation",
            SignalStrength::Medium,
            15,
        );
    } else {
        card.push(
            "OBV",
            "bearish",
            "OBV below its volume baseline, distribution",
            SignalStrength::Medium,
            -10,
        );
    }

    if latest.volume > latest.volume_ma5 * 1.5 {
        card.push(
            "Volume_vs_MA5",
            "above",
            "Volume well above its 5-day average",
            SignalStrength::Medium,
            10,
        );
    } else if latest.volume < latest.volume_ma5 * 0.7 {
        card.push(
            "Volume_vs_MA5",
            "below",
            "Volume well below its 5-day average",
            SignalStrength::Weak,
            -5,
        );
    }

    card.finish()
}
