//! Ordinary least squares trend over a period series.

use serde::{Deserialize, Serialize};

use crate::metrics::math::two_sided_p_value;
use crate::metrics::{MetricKind, TOLERANCE};

/// Minimum observations for a trend fit.
pub const MIN_TREND_POINTS: usize = 3;

/// Fitted line `value = intercept + slope × index`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearTrend {
    /// Change per period.
    pub slope: f64,
    /// Value at index 0.
    pub intercept: f64,
    /// Coefficient of determination (`None` for a constant series).
    pub r_squared: Option<f64>,
    /// Standard error of the slope.
    pub standard_error: f64,
    /// Two-sided p-value of the slope (`None` for a perfect fit).
    pub p_value: Option<f64>,
    /// Points used in the fit.
    pub sample_size: usize,
}

impl LinearTrend {
    /// Fitted value at an index.
    #[must_use]
    pub fn fitted(&self, index: f64) -> f64 {
        self.intercept + self.slope * index
    }
}

/// Trend of one metric across periods.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricTrend {
    /// Metric.
    pub metric: MetricKind,
    /// Periods with a value.
    pub sample_size: usize,
    /// Fit, when at least [`MIN_TREND_POINTS`] values exist.
    pub trend: Option<LinearTrend>,
    /// Index of the first period with a value.
    pub first_index: Option<usize>,
    /// Index of the last period with a value.
    pub last_index: Option<usize>,
}

impl MetricTrend {
    /// Fit a metric's series, skipping missing values.
    #[must_use]
    pub fn fit(metric: MetricKind, values: &[Option<f64>]) -> Self {
        Self {
            metric,
            sample_size: values.iter().flatten().count(),
            trend: fit_trend(values),
            first_index: values.iter().position(Option::is_some),
            last_index: values.iter().rposition(Option::is_some),
        }
    }
}

/// Fit value against series index, skipping `None` entries.
///
/// Requires [`MIN_TREND_POINTS`] values and non-constant indices.
#[must_use]
pub fn fit_trend(values: &[Option<f64>]) -> Option<LinearTrend> {
    let points: Vec<(f64, f64)> = values
        .iter()
        .enumerate()
        .filter_map(|(i, v)| v.filter(|y| y.is_finite()).map(|y| (i as f64, y)))
        .collect();

    let n = points.len();
    if n < MIN_TREND_POINTS {
        return None;
    }

    let count = n as f64;
    let x_mean = points.iter().map(|(x, _)| x).sum::<f64>() / count;
    let y_mean = points.iter().map(|(_, y)| y).sum::<f64>() / count;

    let sxx: f64 = points.iter().map(|(x, _)| (x - x_mean).powi(2)).sum();
    if sxx < TOLERANCE {
        return None;
    }
    let sxy: f64 = points
        .iter()
        .map(|(x, y)| (x - x_mean) * (y - y_mean))
        .sum();

    let slope = sxy / sxx;
    let intercept = y_mean - slope * x_mean;

    let ss_res: f64 = points
        .iter()
        .map(|(x, y)| (y - (intercept + slope * x)).powi(2))
        .sum();
    let ss_tot: f64 = points.iter().map(|(_, y)| (y - y_mean).powi(2)).sum();

    let standard_error = (ss_res / (count - 2.0) / sxx).sqrt();

    Some(LinearTrend {
        slope,
        intercept,
        r_squared: (ss_tot > TOLERANCE).then(|| 1.0 - ss_res / ss_tot),
        standard_error,
        p_value: (standard_error > TOLERANCE).then(|| two_sided_p_value(slope / standard_error)),
        sample_size: n,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perfect_line() {
        let Some(trend) = fit_trend(&[Some(1.0), Some(3.0), Some(5.0), Some(7.0)]) else {
            panic!("trend should fit");
        };
        assert!((trend.slope - 2.0).abs() < 1e-12);
        assert!((trend.intercept - 1.0).abs() < 1e-12);
        assert_eq!(trend.r_squared, Some(1.0));
        assert!(trend.p_value.is_none());
        assert_eq!(trend.sample_size, 4);
    }

    #[test]
    fn test_constant_series_has_no_r_squared() {
        let Some(trend) = fit_trend(&[Some(2.0), Some(2.0), Some(2.0)]) else {
            panic!("trend should fit");
        };
        assert_eq!(trend.slope, 0.0);
        assert!(trend.r_squared.is_none());
    }

    #[test]
    fn test_requires_three_points() {
        assert!(fit_trend(&[Some(1.0), Some(2.0)]).is_none());
        assert!(fit_trend(&[Some(1.0), None, Some(2.0), None]).is_none());
    }

    #[test]
    fn test_skips_missing_values_keeping_index() {
        let Some(trend) = fit_trend(&[Some(0.0), None, Some(2.0), Some(3.0)]) else {
            panic!("trend should fit");
        };
        assert!((trend.slope - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_noisy_series_p_value() {
        let values: Vec<Option<f64>> = [1.0, 1.5, 0.8, 1.2, 1.1, 0.9]
            .iter()
            .map(|v| Some(*v))
            .collect();
        let Some(trend) = fit_trend(&values) else {
            panic!("trend should fit");
        };
        let Some(p) = trend.p_value else {
            panic!("p-value should be defined for a noisy series");
        };
        assert!(p > 0.05 && p <= 1.0);
    }

    #[test]
    fn test_metric_trend_tracks_last_index() {
        let trend = MetricTrend::fit(MetricKind::WinRate, &[Some(0.5), Some(0.6), None]);
        assert_eq!(trend.sample_size, 2);
        assert_eq!(trend.last_index, Some(1));
        assert!(trend.trend.is_none());
    }
}
