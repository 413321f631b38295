//! Synthetic series shared by the integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use tickerscope::config::Config;
use tickerscope::services::forecast::{EnsembleSettings, SequenceSettings};
use tickerscope::services::{AnalysisService, ModelCatalog};
use tickerscope::sources::InMemoryProvider;
use tickerscope::{AppState, OhlcvBar};

pub fn day(offset: usize) -> NaiveDate {
    NaiveDate::from_ymd_opt(2022, 1, 3).unwrap() + chrono::Duration::days(offset as i64)
}

/// Close rising by `step` every session, constant volume.
pub fn uptrend(count: usize, start: f64, step: f64) -> Vec<OhlcvBar> {
    (0..count)
        .map(|i| {
            let close = start + step * i as f64;
            OhlcvBar {
                date: day(i),
                open: close - step / 2.0,
                high: close * 1.01,
                low: close * 0.99,
                close,
                volume: 2_000_000.0,
            }
        })
        .collect()
}

/// Identical OHLC every session.
pub fn flat(count: usize, price: f64) -> Vec<OhlcvBar> {
    (0..count)
        .map(|i| OhlcvBar {
            date: day(i),
            open: price,
            high: price,
            low: price,
            close: price,
            volume: 2_000_000.0,
        })
        .collect()
}

/// Oscillation around a slow drift.
pub fn wave(count: usize) -> Vec<OhlcvBar> {
    (0..count)
        .map(|i| {
            let t = i as f64;
            let close = 50.0 + 0.05 * t + 3.0 * (t / 6.0).sin() + (t / 2.5).cos();
            OhlcvBar {
                date: day(i),
                open: close - 0.2 * (t / 4.0).sin(),
                high: close + 0.8 + 0.3 * (t / 5.0).sin().abs(),
                low: close - 0.8 - 0.3 * (t / 7.0).cos().abs(),
                close,
                volume: 1_500_000.0 + 300_000.0 * (t / 8.0).sin(),
            }
        })
        .collect()
}

/// Small, fast models. The sequence model is switched off unless asked for.
pub fn catalog(sequence_enabled: bool) -> ModelCatalog {
    ModelCatalog::new(
        EnsembleSettings {
            n_trees: 10,
            max_depth: 6,
            ..EnsembleSettings::default()
        },
        SequenceSettings {
            lookback: 10,
            hidden_size: 4,
            epochs: 2,
            ..SequenceSettings::default()
        },
        sequence_enabled,
    )
}

pub fn provider() -> InMemoryProvider {
    InMemoryProvider::new()
        .with_series("UP", uptrend(300, 100.0, 0.5))
        .with_series("FLAT", flat(300, 25.0))
        .with_series("WAVE", wave(500))
}

pub fn service(sequence_enabled: bool) -> AnalysisService<InMemoryProvider> {
    AnalysisService::new(
        Arc::new(provider()),
        catalog(sequence_enabled),
        Duration::from_secs(5),
    )
}

pub fn state(sequence_enabled: bool) -> AppState<InMemoryProvider> {
    AppState::new(Config::default(), service(sequence_enabled))
}
