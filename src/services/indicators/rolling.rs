//! Column primitives shared by every indicator.
//!
//! A column is a `Vec<Option<f64>>` aligned with the input bars. `None`
//! marks a row without enough look-back history (or a non-finite result).
//! Windows require every value inside them to be present.

/// Division guard used wherever a range or average can collapse to zero.
pub const EPSILON: f64 = 1e-10;

pub type Series = Vec<Option<f64>>;

/// Keep finite values, drop NaN and infinities.
pub fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

pub fn from_values(values: &[f64]) -> Series {
    values.iter().map(|v| finite(*v)).collect()
}

fn rolling<F>(series: &[Option<f64>], window: usize, f: F) -> Series
where
    F: Fn(&[f64]) -> f64,
{
    let mut out = vec![None; series.len()];
    if window == 0 || series.len() < window {
        return out;
    }

    let mut buf = Vec::with_capacity(window);
    for end in window..=series.len() {
        buf.clear();
        buf.extend(series[end - window..end].iter().map_while(|v| *v));
        if buf.len() == window {
            out[end - 1] = finite(f(&buf));
        }
    }
    out
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

pub fn rolling_mean(series: &[Option<f64>], window: usize) -> Series {
    rolling(series, window, mean)
}

pub fn rolling_min(series: &[Option<f64>], window: usize) -> Series {
    rolling(series, window, |w| w.iter().copied().fold(f64::INFINITY, f64::min))
}

pub fn rolling_max(series: &[Option<f64>], window: usize) -> Series {
    rolling(series, window, |w| {
        w.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    })
}

/// Sample standard deviation (n − 1 denominator).
pub fn rolling_std(series: &[Option<f64>], window: usize) -> Series {
    if window < 2 {
        return vec![None; series.len()];
    }
    rolling(series, window, |w| {
        let m = mean(w);
        let var = w.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (w.len() - 1) as f64;
        var.sqrt()
    })
}

/// Mean absolute deviation around the window mean.
pub fn rolling_mad(series: &[Option<f64>], window: usize) -> Series {
    rolling(series, window, |w| {
        let m = mean(w);
        w.iter().map(|v| (v - m).abs()).sum::<f64>() / w.len() as f64
    })
}

/// Recursive exponential average, `y = y + alpha * (x - y)`.
///
/// Starts at the first present value and carries the last average across
/// missing rows.
pub fn ewm(series: &[Option<f64>], alpha: f64) -> Series {
    let mut state: Option<f64> = None;
    series
        .iter()
        .map(|value| {
            state = match (*value, state) {
                (Some(x), None) => Some(x),
                (Some(x), Some(y)) => Some(y + alpha * (x - y)),
                (None, prev) => prev,
            };
            state
        })
        .collect()
}

pub fn alpha_from_span(span: usize) -> f64 {
    2.0 / (span as f64 + 1.0)
}

pub fn alpha_from_com(com: f64) -> f64 {
    1.0 / (1.0 + com)
}

/// `x[i] - x[i - periods]`.
pub fn diff(values: &[f64], periods: usize) -> Series {
    (0..values.len())
        .map(|i| {
            if i < periods {
                None
            } else {
                finite(values[i] - values[i - periods])
            }
        })
        .collect()
}

/// Fractional change over `periods` rows. Changes against a zero base are
/// dropped rather than reported as infinities.
pub fn pct_change(values: &[f64], periods: usize) -> Series {
    (0..values.len())
        .map(|i| {
            if i < periods {
                None
            } else {
                let base = values[i - periods];
                finite((values[i] - base) / base)
            }
        })
        .collect()
}

/// Element-wise combination, `None` when either side is missing.
pub fn zip_with<F>(a: &[Option<f64>], b: &[Option<f64>], f: F) -> Series
where
    F: Fn(f64, f64) -> f64,
{
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| match (x, y) {
            (Some(x), Some(y)) => finite(f(*x, *y)),
            _ => None,
        })
        .collect()
}

pub fn map<F>(series: &[Option<f64>], f: F) -> Series
where
    F: Fn(f64) -> f64,
{
    series.iter().map(|v| v.and_then(|x| finite(f(x)))).collect()
}

/// Last present value at or before `index`.
pub fn last_valid(series: &[Option<f64>], index: usize) -> Option<f64> {
    series.get(..=index)?.iter().rev().find_map(|v| *v)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Option<f64>, b: f64) -> bool {
        a.map(|a| (a - b).abs() < 1e-9).unwrap_or(false)
    }

    #[test]
    fn test_rolling_mean_leading_gap() {
        let s = from_values(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        let m = rolling_mean(&s, 3);
        assert_eq!(m[0], None);
        assert_eq!(m[1], None);
        assert!(approx(m[2], 2.0));
        assert!(approx(m[4], 4.0));
    }

    #[test]
    fn test_rolling_requires_full_window() {
        let s = vec![None, Some(1.0), Some(2.0), Some(3.0)];
        let m = rolling_mean(&s, 3);
        assert_eq!(m[2], None);
        assert!(approx(m[3], 2.0));
    }

    #[test]
    fn test_rolling_min_max() {
        let s = from_values(&[3.0, 1.0, 4.0, 1.5, 5.0]);
        assert!(approx(rolling_min(&s, 3)[3], 1.0));
        assert!(approx(rolling_max(&s, 3)[4], 5.0));
    }

    #[test]
    fn test_rolling_std_is_sample_std() {
        let s = from_values(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        // Sample variance of this set is 32/7.
        let std = rolling_std(&s, 8);
        assert!(approx(std[7], (32.0f64 / 7.0).sqrt()));
    }

    #[test]
    fn test_rolling_mad() {
        let s = from_values(&[1.0, 2.0, 3.0, 4.0]);
        assert!(approx(rolling_mad(&s, 4)[3], 1.0));
    }

    #[test]
    fn test_ewm_constant_series_is_exact() {
        let s = from_values(&[7.5; 50]);
        let e = ewm(&s, alpha_from_span(12));
        assert!(e.iter().all(|v| *v == Some(7.5)));
    }

    #[test]
    fn test_ewm_starts_at_first_value() {
        let s = vec![None, None, Some(10.0), Some(13.0)];
        let e = ewm(&s, alpha_from_com(2.0));
        assert_eq!(e[0], None);
        assert_eq!(e[2], Some(10.0));
        assert!(approx(e[3], 11.0));
    }

    #[test]
    fn test_pct_change_zero_base_is_missing() {
        let p = pct_change(&[0.0, 5.0, 10.0], 1);
        assert_eq!(p[0], None);
        assert_eq!(p[1], None);
        assert!(approx(p[2], 1.0));
    }

    #[test]
    fn test_diff_periods() {
        let d = diff(&[1.0, 4.0, 9.0], 2);
        assert_eq!(d[1], None);
        assert!(approx(d[2], 8.0));
    }

    #[test]
    fn test_last_valid() {
        let s = vec![Some(1.0), None, Some(3.0), None];
        assert_eq!(last_valid(&s, 3), Some(3.0));
        assert_eq!(last_valid(&s, 1), Some(1.0));
        assert_eq!(last_valid(&[None, None], 1), None);
    }
}
