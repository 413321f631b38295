//! Forecast confidence curve.

const BASE: f64 = 0.85;
const DECAY_PER_DAY: f64 = 0.02;
const FLOOR: f64 = 0.3;

/// `clamp(0.85 − 0.02 × days_ahead, 0.3, 1.0)`.
pub fn base_confidence(days_ahead: usize) -> f64 {
    (BASE - DECAY_PER_DAY * days_ahead as f64).clamp(FLOOR, 1.0)
}

/// Base confidence scaled by a model's trust multiplier, capped at 1.
pub fn confidence(days_ahead: usize, multiplier: f64) -> f64 {
    (base_confidence(days_ahead) * multiplier).min(1.0)
}
