//! Analysis functions for walk-forward windows.

use std::collections::BTreeMap;

use super::types::{ParameterStability, WalkForwardSummary, WalkForwardWindow};
use crate::metrics::math::{finite, mean, std_dev};
use crate::metrics::{MetricKind, TOLERANCE};

/// Out-of-sample over in-sample value.
///
/// `None` when either side is missing, when |IS| is below `epsilon`, or when
/// the metric is a ratio and IS is negative (the quotient of two negative
/// ratios would read as efficient).
#[must_use]
pub fn efficiency(
    in_sample: Option<f64>,
    out_of_sample: Option<f64>,
    metric: MetricKind,
    epsilon: f64,
) -> Option<f64> {
    let (is, oos) = (in_sample?, out_of_sample?);
    if is.abs() < epsilon.max(TOLERANCE) {
        return None;
    }
    if metric.is_ratio() && is < 0.0 {
        return None;
    }
    finite(oos / is)
}

/// Stability of one parameter's winning values: `1 / (1 + CV)`.
///
/// CV uses the sample standard deviation over |mean|. A zero mean gives 1
/// when the values are also constant and 0 otherwise.
#[must_use]
pub fn stability_score(values: &[f64]) -> Option<f64> {
    let std = std_dev(values)?;
    let avg = mean(values)?;

    if avg.abs() < TOLERANCE {
        return Some(if std < TOLERANCE { 1.0 } else { 0.0 });
    }
    Some(1.0 / (1.0 + std / avg.abs()))
}

/// Analyze parameter stability across sufficient windows.
#[must_use]
pub fn analyze_parameter_stability(windows: &[WalkForwardWindow]) -> ParameterStability {
    let mut values: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for window in windows.iter().filter(|w| w.sufficient) {
        for (name, value) in &window.parameters {
            values.entry(name.clone()).or_default().push(*value);
        }
    }

    let per_parameter: BTreeMap<String, Option<f64>> = values
        .into_iter()
        .map(|(name, vals)| (name, stability_score(&vals)))
        .collect();

    let scores: Vec<f64> = per_parameter.values().flatten().copied().collect();

    ParameterStability {
        overall: mean(&scores),
        per_parameter,
    }
}

/// Share of sufficient windows with positive out-of-sample net P/L.
#[must_use]
pub fn consistency(windows: &[WalkForwardWindow]) -> Option<f64> {
    let sufficient: Vec<_> = windows.iter().filter(|w| w.sufficient).collect();
    if sufficient.is_empty() {
        return None;
    }
    let profitable = sufficient
        .iter()
        .filter(|w| w.out_of_sample_net_pl > 0.0)
        .count();
    Some(profitable as f64 / sufficient.len() as f64)
}

/// Mean of the available components, with efficiency clamped to [0, 1].
#[must_use]
pub fn robustness_score(
    avg_efficiency: Option<f64>,
    stability: Option<f64>,
    consistency: Option<f64>,
) -> Option<f64> {
    let components: Vec<f64> = [
        avg_efficiency.map(|e| e.clamp(0.0, 1.0)),
        stability,
        consistency,
    ]
    .into_iter()
    .flatten()
    .collect();
    mean(&components)
}

/// Aggregate completed windows.
#[must_use]
pub fn summarize(windows: &[WalkForwardWindow]) -> WalkForwardSummary {
    let sufficient: Vec<_> = windows.iter().filter(|w| w.sufficient).collect();
    let in_sample: Vec<f64> = sufficient.iter().filter_map(|w| w.in_sample_value).collect();
    let out_of_sample: Vec<f64> = sufficient
        .iter()
        .filter_map(|w| w.out_of_sample_value)
        .collect();
    let efficiencies: Vec<f64> = sufficient.iter().filter_map(|w| w.efficiency).collect();

    let avg_efficiency = mean(&efficiencies);
    let parameter_stability = analyze_parameter_stability(windows);
    let consistency = consistency(windows);

    WalkForwardSummary {
        total_windows: windows.len(),
        sufficient_windows: sufficient.len(),
        avg_in_sample_value: mean(&in_sample),
        avg_out_of_sample_value: mean(&out_of_sample),
        avg_efficiency,
        efficiency_windows: efficiencies.len(),
        robustness_score: robustness_score(
            avg_efficiency,
            parameter_stability.overall,
            consistency,
        ),
        parameter_stability,
        consistency,
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use proptest::prelude::*;
    use test_case::test_case;

    use super::*;
    use crate::walkforward::WindowBounds;

    fn window(index: usize, kelly: f64, oos_pl: f64, sufficient: bool) -> WalkForwardWindow {
        let Some(start) = NaiveDate::from_ymd_opt(2024, 1, 1) else {
            panic!("invalid test date");
        };
        WalkForwardWindow {
            bounds: WindowBounds {
                index,
                in_sample_start: start,
                in_sample_end: start,
                out_of_sample_start: start,
                out_of_sample_end: start,
            },
            in_sample_trades: 10,
            out_of_sample_trades: 5,
            parameters: [("kelly_multiplier".to_string(), kelly)].into_iter().collect(),
            in_sample_value: Some(1.0),
            out_of_sample_value: Some(0.5),
            out_of_sample_net_pl: oos_pl,
            efficiency: Some(0.5),
            sufficient,
            combinations_evaluated: 1,
            combinations_rejected: 0,
        }
    }

    #[test]
    fn test_negative_ratio_efficiency_is_undefined() {
        assert_eq!(
            efficiency(Some(-1.2), Some(-0.3), MetricKind::Sharpe, 0.01),
            None
        );
    }

    #[test]
    fn test_equal_values_are_fully_efficient() {
        assert_eq!(
            efficiency(Some(1.4), Some(1.4), MetricKind::Sharpe, 0.01),
            Some(1.0)
        );
    }

    #[test_case(Some(0.005), Some(0.5), MetricKind::Sharpe, 0.01, None ; "below epsilon")]
    #[test_case(Some(-200.0), Some(-100.0), MetricKind::NetPl, 1.0, Some(0.5) ; "dollar metric may be negative")]
    #[test_case(None, Some(1.0), MetricKind::Sharpe, 0.01, None ; "missing in-sample")]
    #[test_case(Some(2.0), Some(-1.0), MetricKind::ProfitFactor, 0.01, Some(-0.5) ; "negative out-of-sample")]
    fn test_efficiency_guards(
        is: Option<f64>,
        oos: Option<f64>,
        metric: MetricKind,
        eps: f64,
        expected: Option<f64>,
    ) {
        assert_eq!(efficiency(is, oos, metric, eps), expected);
    }

    #[test]
    fn test_stability_mapping() {
        assert_eq!(stability_score(&[1.0]), None);
        assert_eq!(stability_score(&[0.5, 0.5, 0.5]), Some(1.0));
        assert_eq!(stability_score(&[0.0, 0.0]), Some(1.0));
        assert_eq!(stability_score(&[-1.0, 1.0]), Some(0.0));

        let Some(score) = stability_score(&[1.0, 2.0, 3.0]) else {
            panic!("stability should be defined");
        };
        // CV = 1 / 2
        assert!((score - 1.0 / 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_summary() {
        let windows = vec![
            window(0, 1.0, 100.0, true),
            window(1, 1.0, -50.0, true),
            window(2, 0.5, 500.0, false),
        ];
        let summary = summarize(&windows);

        assert_eq!(summary.total_windows, 3);
        assert_eq!(summary.sufficient_windows, 2);
        assert_eq!(summary.consistency, Some(0.5));
        assert_eq!(summary.avg_efficiency, Some(0.5));
        assert_eq!(
            summary.parameter_stability.per_parameter.get("kelly_multiplier"),
            Some(&Some(1.0))
        );
        // (0.5 + 1.0 + 0.5) / 3
        let Some(robustness) = summary.robustness_score else {
            panic!("robustness should be defined");
        };
        assert!((robustness - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_empty_summary() {
        let summary = summarize(&[]);
        assert!(summary.consistency.is_none());
        assert!(summary.robustness_score.is_none());
    }

    #[test]
    fn test_robustness_clamps_efficiency() {
        assert_eq!(robustness_score(Some(3.0), None, None), Some(1.0));
        assert_eq!(robustness_score(Some(-1.0), Some(1.0), None), Some(0.5));
    }

    proptest! {
        #[test]
        fn prop_negative_ratio_in_sample_never_efficient(is in -100.0f64..-0.01, oos in -100.0f64..100.0) {
            prop_assert!(efficiency(Some(is), Some(oos), MetricKind::Sharpe, 0.01).is_none());
        }

        #[test]
        fn prop_stability_in_unit_interval(values in proptest::collection::vec(-10.0f64..10.0, 2..20)) {
            if let Some(score) = stability_score(&values) {
                prop_assert!((0.0..=1.0).contains(&score));
            }
        }
    }
}
