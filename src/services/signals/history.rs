//! Signal history replay.
//!
//! Nothing is stored: past signals are recomputed by running the analyzer
//! on every prefix of the trailing window, then scored against the next
//! session's close.

use super::{analyze, round2};
use crate::types::{IndicatorRow, SignalHistory, SignalHistoryEntry, SignalHistoryStats};

/// Replay the analyzer over the last `days` complete rows.
///
/// The first row of the window only serves as the previous session, so at
/// most `days - 1` entries are produced.
pub fn replay_history(ticker: &str, rows: &[IndicatorRow], days: u32) -> SignalHistory {
    let window = &rows[rows.len().saturating_sub(days as usize)..];

    let history: Vec<SignalHistoryEntry> = (1..window.len())
        .map(|i| {
            let report = analyze(ticker, &window[..=i], None);
            let row = &window[i];
            SignalHistoryEntry {
                date: row.date(),
                signal: report.signal,
                score: report.score,
                confidence: report.confidence,
                price: row.bar.close,
                volume: row.bar.volume,
            }
        })
        .collect();

    let statistics = statistics(&history);
    SignalHistory {
        ticker: ticker.to_string(),
        days,
        history,
        statistics,
    }
}

/// Next-session accuracy of buy-side and sell-side signals.
pub fn statistics(history: &[SignalHistoryEntry]) -> SignalHistoryStats {
    let mut stats = SignalHistoryStats::default();

    for pair in history.windows(2) {
        let (current, next) = (&pair[0], &pair[1]);
        if current.signal.is_buy_side() {
            stats.total_signals += 1;
            if next.price > current.price {
                stats.correct_signals += 1;
            }
        } else if current.signal.is_sell_side() {
            stats.total_signals += 1;
            if next.price < current.price {
                stats.correct_signals += 1;
            }
        }
    }

    if stats.total_signals > 0 {
        stats.accuracy =
            round2(stats.correct_signals as f64 / stats.total_signals as f64 * 100.0);
    }
    for entry in history {
        if entry.signal.is_buy_side() {
            stats.buy_signals += 1;
        } else if entry.signal.is_sell_side() {
            stats.sell_signals += 1;
        } else {
            stats.hold_signals += 1;
        }
    }
    stats
}
