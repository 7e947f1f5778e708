//! Clamping Utilities
//!
//! Every arithmetic result leaving the pipeline passes through one of these,
//! so callers never observe NaN, Infinity or out-of-range scores.

/// Bound `value` to `[lo, hi]`. Non-finite input collapses to `lo`, and a
/// value equal to a bound returns the bound itself (so `-0.0` becomes `0.0`).
pub fn clamp(value: f64, lo: f64, hi: f64) -> f64 {
    if !value.is_finite() || value <= lo {
        return lo;
    }
    if value >= hi {
        return hi;
    }
    value
}

/// `clamp(value, 0.0, 1.0)`
pub fn clamp_unit(value: f64) -> f64 {
    clamp(value, 0.0, 1.0)
}

/// Replace NaN/Infinity with `default`, leave finite values untouched.
pub fn ensure_finite(value: f64, default: f64) -> f64 {
    if value.is_finite() { value } else { default }
}

/// Arithmetic mean, 0.0 for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population variance, 0.0 for an empty slice.
pub fn variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64
}
