//! Support, resistance and ATR-based exit levels.

use crate::types::{IndicatorRow, KeyLevels, SignalType};

use super::round2;

/// Sessions scanned for support and resistance.
pub const LEVEL_WINDOW: usize = 20;

/// Stop and target distances in ATR multiples for a signal direction.
fn atr_multiples(signal: SignalType) -> (f64, f64) {
    if signal.is_buy_side() {
        (-1.5, 3.0)
    } else if signal.is_sell_side() {
        (1.5, -3.0)
    } else {
        (-1.0, 2.0)
    }
}

/// Key levels for the last row of `rows`.
///
/// A missing ATR collapses stop and target onto the current price.
pub fn key_levels(rows: &[IndicatorRow], signal: SignalType) -> KeyLevels {
    let recent = &rows[rows.len().saturating_sub(LEVEL_WINDOW)..];
    let support = recent.iter().map(|r| r.bar.low).fold(f64::INFINITY, f64::min);
    let resistance = recent
        .iter()
        .map(|r| r.bar.high)
        .fold(f64::NEG_INFINITY, f64::max);

    let (current_price, atr) = rows
        .last()
        .map(|r| (r.bar.close, r.indicators.atr.unwrap_or(0.0)))
        .unwrap_or((0.0, 0.0));
    let (stop, target) = atr_multiples(signal);

    KeyLevels {
        current_price,
        support,
        resistance,
        stop_loss: current_price + atr * stop,
        take_profit: current_price + atr * target,
    }
}

/// Reward distance over risk distance, rounded to cents; 0 when there is
/// no risk distance.
pub fn risk_reward(levels: &KeyLevels) -> f64 {
    let risk = (levels.current_price - levels.stop_loss).abs();
    let reward = (levels.take_profit - levels.current_price).abs();
    if risk == 0.0 || !risk.is_finite() {
        return 0.0;
    }
    round2(reward / risk)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::indicators::compute_clean;
    use crate::services::indicators::test_support::trending_bars;

    fn rows() -> Vec<IndicatorRow> {
        compute_clean(&trending_bars(120, 100.0, 1.0))
    }

    #[test]
    fn test_support_and_resistance_use_last_twenty_sessions() {
        let rows = rows();
        let levels = key_levels(&rows, SignalType::Hold);
        let tail = &rows[rows.len() - 20..];
        assert_eq!(levels.support, tail[0].bar.low);
        assert_eq!(levels.resistance, tail[19].bar.high);
        assert_eq!(levels.current_price, tail[19].bar.close);
    }

    #[test]
    fn test_exit_levels_follow_signal_direction() {
        let rows = rows();
        let atr = rows.last().unwrap().indicators.atr.unwrap();
        let price = rows.last().unwrap().bar.close;

        let buy = key_levels(&rows, SignalType::Buy);
        assert!((buy.stop_loss - (price - 1.5 * atr)).abs() < 1e-9);
        assert!((buy.take_profit - (price + 3.0 * atr)).abs() < 1e-9);
        assert_eq!(risk_reward(&buy), 2.0);

        let sell = key_levels(&rows, SignalType::StrongSell);
        assert!((sell.stop_loss - (price + 1.5 * atr)).abs() < 1e-9);
        assert!((sell.take_profit - (price - 3.0 * atr)).abs() < 1e-9);
        assert_eq!(risk_reward(&sell), 2.0);

        let hold = key_levels(&rows, SignalType::Hold);
        assert!((hold.stop_loss - (price - atr)).abs() < 1e-9);
        assert_eq!(risk_reward(&hold), 2.0);
    }

    #[test]
    fn test_zero_risk_reports_zero_ratio() {
        let levels = KeyLevels {
            current_price: 10.0,
            support: 9.0,
            resistance: 11.0,
            stop_loss: 10.0,
            take_profit: 10.0,
        };
        assert_eq!(risk_reward(&levels), 0.0);
    }
}
