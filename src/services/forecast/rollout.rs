//! Autoregressive multi-day rollout shared by the regression models.
//!
//! Each step recomputes indicators over a rolling OHLCV buffer, predicts
//! one close, then appends a synthetic bar built from that prediction.
//! Later steps therefore inherit earlier prediction error.
//!
//! The buffer starts as the full training series. Cumulative and
//! exponentially smoothed indicators (OBV, MACD, KDJ) depend on where the
//! series starts, so a shorter seed would hand the model features it never
//! saw in training.

use chrono::Duration;
use ndarray::Array1;

use super::confidence::confidence;
use super::ForecastError;
use crate::services::features::latest_features_filled;
use crate::services::indicators::compute_indicators;
use crate::types::{ForecastPoint, OhlcvBar};

/// Roll `predict` forward `days` times from the end of `history`.
///
/// Forecast dates advance one calendar day per step.
pub fn rollout<F>(
    history: &[OhlcvBar],
    days: usize,
    multiplier: f64,
    mut predict: F,
) -> Result<Vec<ForecastPoint>, ForecastError>
where
    F: FnMut(&Array1<f64>) -> Result<f64, ForecastError>,
{
    let mut buffer = history.to_vec();
    let mut points = Vec::with_capacity(days);

    for step in 1..=days {
        let last = *buffer.last().ok_or(ForecastError::NotTrained)?;
        let rows = compute_indicators(&buffer);
        let features = latest_features_filled(&rows);

        let price = predict(&features)?;
        if !price.is_finite() {
            return Err(ForecastError::Fit(format!(
                "non-finite prediction at step {}",
                step
            )));
        }

        let date = last.date + Duration::days(1);
        points.push(ForecastPoint {
            date,
            predicted_price: price,
            confidence: confidence(step, multiplier),
        });
        buffer.push(OhlcvBar::synthetic(date, price, last.volume));
    }

    Ok(points)
}
