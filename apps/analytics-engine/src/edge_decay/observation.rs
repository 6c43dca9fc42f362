//! Historical-versus-recent observations drawn from each sub-engine.

use serde::{Deserialize, Serialize};

use crate::metrics::math::safe_ratio;
use crate::metrics::{HUNDRED, MetricType, TOLERANCE};
use crate::periods::{MetricTrend, PeriodTrends};
use crate::regime::RegimeComparison;
use crate::rolling::RecentComparison;
use crate::walkforward::{DegradationResult, WalkForwardResult};

/// Default number of top observations reported.
pub const DEFAULT_TOP_OBSERVATIONS: usize = 5;

/// Sub-engine an observation came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObservationSource {
    /// Fitted start and end of a calendar-period trend.
    PeriodTrend,
    /// Latest rolling window against all earlier trades.
    RollingComparison,
    /// Full-history against recent-window simulation.
    RegimeComparison,
    /// In-sample against out-of-sample target value.
    WalkForward,
    /// In-sample against out-of-sample metric, traded as is.
    Degradation,
}

/// One historical/recent pair of a metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Producing sub-engine.
    pub source: ObservationSource,
    /// Metric identifier, qualified by period granularity for trends.
    pub metric: String,
    /// Rate or dollar classification.
    pub metric_type: MetricType,
    /// Historical value.
    pub historical: Option<f64>,
    /// Recent value.
    pub recent: Option<f64>,
    /// `recent − historical`.
    pub delta: Option<f64>,
    /// `delta / |historical| × 100`.
    pub percent_change: Option<f64>,
    /// Trades, periods or windows behind the recent value.
    pub sample_size: usize,
}

impl Observation {
    fn new(
        source: ObservationSource,
        metric: String,
        metric_type: MetricType,
        historical: Option<f64>,
        recent: Option<f64>,
        sample_size: usize,
    ) -> Self {
        let delta = historical.zip(recent).map(|(h, r)| r - h);
        let percent_change = historical
            .zip(delta)
            .and_then(|(h, d)| safe_ratio(d, h.abs(), TOLERANCE))
            .map(|ratio| ratio * HUNDRED);
        Self {
            source,
            metric,
            metric_type,
            historical,
            recent,
            delta,
            percent_change,
            sample_size,
        }
    }

    /// Magnitude used for ranking.
    #[must_use]
    pub fn abs_percent_change(&self) -> Option<f64> {
        self.percent_change.map(f64::abs)
    }
}

/// Trend start and end values, per metric and granularity.
#[must_use]
pub fn from_period_trends(trends: &PeriodTrends) -> Vec<Observation> {
    let granularities = [
        ("yearly", &trends.yearly),
        ("quarterly", &trends.quarterly),
        ("monthly", &trends.monthly),
    ];
    granularities
        .into_iter()
        .flat_map(|(label, series)| series.iter().filter_map(move |t| trend_observation(label, t)))
        .collect()
}

fn trend_observation(granularity: &str, trend: &MetricTrend) -> Option<Observation> {
    let fit = trend.trend.as_ref()?;
    let first = trend.first_index? as f64;
    let last = trend.last_index? as f64;
    Some(Observation::new(
        ObservationSource::PeriodTrend,
        format!("{granularity}.{}", trend.metric),
        trend.metric.metric_type(),
        Some(fit.fitted(first)),
        Some(fit.fitted(last)),
        fit.sample_size,
    ))
}

/// One observation per compared metric.
#[must_use]
pub fn from_rolling(comparison: &RecentComparison) -> Vec<Observation> {
    comparison
        .deltas
        .iter()
        .map(|d| {
            Observation::new(
                ObservationSource::RollingComparison,
                d.metric.to_string(),
                d.metric.metric_type(),
                d.historical,
                d.recent,
                comparison.recent_trades,
            )
        })
        .collect()
}

/// One observation per simulated statistic.
#[must_use]
pub fn from_regime(comparison: &RegimeComparison) -> Vec<Observation> {
    comparison
        .divergence
        .metrics
        .iter()
        .map(|m| {
            Observation::new(
                ObservationSource::RegimeComparison,
                m.metric.name().to_string(),
                MetricType::Rate,
                m.full,
                m.recent,
                comparison.recent.trades,
            )
        })
        .collect()
}

/// Average in-sample against average out-of-sample target value.
#[must_use]
pub fn from_walk_forward(result: &WalkForwardResult) -> Vec<Observation> {
    let metric = result.config.target.metric();
    let summary = &result.summary;
    if summary.sufficient_windows == 0 {
        return Vec::new();
    }
    vec![Observation::new(
        ObservationSource::WalkForward,
        metric.to_string(),
        metric.metric_type(),
        summary.avg_in_sample_value,
        summary.avg_out_of_sample_value,
        summary.sufficient_windows,
    )]
}

/// Mean in-sample against mean out-of-sample value, per degradation metric.
#[must_use]
pub fn from_degradation(result: &DegradationResult) -> Vec<Observation> {
    if result.sufficient_windows == 0 {
        return Vec::new();
    }
    result
        .metrics
        .iter()
        .map(|m| {
            Observation::new(
                ObservationSource::Degradation,
                m.metric.to_string(),
                m.metric.metric_type(),
                m.avg_in_sample,
                m.avg_out_of_sample,
                result.sufficient_windows,
            )
        })
        .collect()
}

/// Rate-type observations with the largest |percent change|, descending.
#[must_use]
pub fn top_observations(observations: &[Observation], limit: usize) -> Vec<Observation> {
    let mut ranked: Vec<&Observation> = observations
        .iter()
        .filter(|o| o.metric_type == MetricType::Rate && o.percent_change.is_some())
        .collect();
    ranked.sort_by(|a, b| {
        let a = a.abs_percent_change().unwrap_or(0.0);
        let b = b.abs_percent_change().unwrap_or(0.0);
        b.total_cmp(&a)
    });
    ranked.into_iter().take(limit).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::MetricKind;
    use crate::periods::fit_trend;
    use crate::rolling::compare;

    fn observation(metric: &str, metric_type: MetricType, historical: f64, recent: f64) -> Observation {
        Observation::new(
            ObservationSource::RollingComparison,
            metric.to_string(),
            metric_type,
            Some(historical),
            Some(recent),
            10,
        )
    }

    #[test]
    fn test_percent_change_uses_magnitude() {
        let o = observation("sharpe", MetricType::Rate, -2.0, -3.0);
        assert_eq!(o.delta, Some(-1.0));
        assert_eq!(o.percent_change, Some(-50.0));
    }

    #[test]
    fn test_top_observations_are_rate_only() {
        let observations = vec![
            observation("net_pl", MetricType::Dollar, 100.0, 1000.0),
            observation("win_rate", MetricType::Rate, 0.6, 0.5),
            observation("sharpe", MetricType::Rate, 1.0, 0.2),
            observation("kelly_pct", MetricType::Rate, 10.0, 9.0),
        ];
        let top = top_observations(&observations, 2);
        let names: Vec<&str> = top.iter().map(|o| o.metric.as_str()).collect();
        assert_eq!(names, vec!["sharpe", "win_rate"]);
    }

    #[test]
    fn test_trend_observation_uses_fitted_endpoints() {
        let values = [Some(1.0), None, Some(3.0), Some(4.0)];
        let trend = MetricTrend {
            metric: MetricKind::Sharpe,
            sample_size: 3,
            trend: fit_trend(&values),
            first_index: Some(0),
            last_index: Some(3),
        };
        let trends = PeriodTrends {
            yearly: Vec::new(),
            quarterly: vec![trend],
            monthly: Vec::new(),
        };
        let observations = from_period_trends(&trends);
        assert_eq!(observations.len(), 1);
        assert_eq!(observations[0].metric, "quarterly.sharpe");
        assert_eq!(observations[0].sample_size, 3);
        let (Some(h), Some(r)) = (observations[0].historical, observations[0].recent) else {
            panic!("fitted endpoints should exist");
        };
        assert!(r > h);
    }

    #[test]
    fn test_rolling_observations_follow_deltas() {
        let comparison = compare(Default::default(), Default::default());
        let observations = from_rolling(&comparison);
        assert_eq!(observations.len(), comparison.deltas.len());
        assert!(observations.iter().all(|o| o.source == ObservationSource::RollingComparison));
        assert!(observations.iter().all(|o| o.delta.is_none()));
    }
}
