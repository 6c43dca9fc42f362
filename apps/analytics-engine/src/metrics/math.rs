//! Statistical math utilities for metric calculations.

use super::constants::TOLERANCE;

/// Mean of a slice (`None` when empty).
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (N−1). Requires at least two values.
pub fn std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }

    let avg = mean(values)?;
    let variance_sum: f64 = values.iter().map(|v| (v - avg) * (v - avg)).sum();
    Some((variance_sum / (values.len() - 1) as f64).sqrt())
}

/// Downside deviation over the full sample count.
pub fn downside_deviation(values: &[f64], target: f64) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }

    let variance_sum: f64 = values
        .iter()
        .filter(|v| **v < target)
        .map(|v| (v - target) * (v - target))
        .sum();

    Some((variance_sum / values.len() as f64).sqrt())
}

/// Percentile of sorted values with linear interpolation between ranks.
///
/// `pct` is in `[0, 100]`.
pub fn percentile(sorted: &[f64], pct: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let rank = (pct / 100.0).clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let weight = rank - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * weight)
}

/// Median of unsorted values.
pub fn median(values: &[f64]) -> Option<f64> {
    let sorted = sorted_copy(values);
    percentile(&sorted, 50.0)
}

/// Sorted copy using a total order (NaN sorts last).
pub fn sorted_copy(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted
}

/// Divide, returning `None` when the denominator is within `epsilon` of zero
/// or the result is not finite.
pub fn safe_ratio(numerator: f64, denominator: f64, epsilon: f64) -> Option<f64> {
    if denominator.abs() < epsilon.max(TOLERANCE) {
        return None;
    }
    finite(numerator / denominator)
}

/// Keep only finite values.
pub fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

/// Standard normal cumulative distribution function.
pub fn normal_cdf(x: f64) -> f64 {
    0.5 * (1.0 + libm::erf(x / std::f64::consts::SQRT_2))
}

/// Two-sided p-value of a z statistic under the normal approximation.
pub fn two_sided_p_value(z: f64) -> f64 {
    (2.0 * (1.0 - normal_cdf(z.abs()))).clamp(0.0, 1.0)
}
