//! Volume indicators.

use super::rolling::{from_values, pct_change, rolling_mean, Series};

pub const VOLUME_SHORT: usize = 5;
pub const VOLUME_LONG: usize = 20;

/// On-balance volume. The first session contributes nothing.
pub fn obv(close: &[f64], volume: &[f64]) -> Series {
    let mut total = 0.0;
    (0..close.len())
        .map(|i| {
            if i > 0 {
                let delta = close[i] - close[i - 1];
                let sign = if delta > 0.0 {
                    1.0
                } else if delta < 0.0 {
                    -1.0
                } else {
                    0.0
                };
                total += sign * volume[i];
            }
            Some(total)
        })
        .collect()
}

/// Day-over-day fractional volume change.
pub fn volume_change(volume: &[f64]) -> Series {
    pct_change(volume, 1)
}

pub fn volume_ma(volume: &[f64], window: usize) -> Series {
    rolling_mean(&from_values(volume), window)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_obv_accumulates_signed_volume() {
        let close = vec![10.0, 11.0, 10.5, 10.5, 12.0];
        let volume = vec![100.0, 200.0, 300.0, 400.0, 500.0];
        let o = obv(&close, &volume);
        assert_eq!(
            o,
            vec![Some(0.0), Some(200.0), Some(-100.0), Some(-100.0), Some(400.0)]
        );
    }

    #[test]
    fn test_volume_change_zero_previous_is_missing() {
        let v = volume_change(&[0.0, 100.0, 150.0]);
        assert_eq!(v[1], None);
        assert_eq!(v[2], Some(0.5));
    }

    #[test]
    fn test_volume_ma() {
        let v = volume_ma(&[1.0, 2.0, 3.0, 4.0, 5.0], VOLUME_SHORT);
        assert_eq!(v[4], Some(3.0));
    }
}
