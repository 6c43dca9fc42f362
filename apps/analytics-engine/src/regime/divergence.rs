//! Signed divergence between full-history and recent-window simulations.
//!
//! Every score is oriented so that negative means the recent window projects
//! worse than the full history.

use serde::{Deserialize, Serialize};

use crate::metrics::math::mean;
use crate::monte_carlo::SimulationStatistics;

/// Multiplier applied to the probability-of-profit delta.
pub const POP_SCALE: f64 = 5.0;
/// Denominator floor for expected return.
pub const EXPECTED_RETURN_FLOOR: f64 = 0.01;
/// Denominator floor for Sharpe.
pub const SHARPE_FLOOR: f64 = 0.25;
/// Denominator floor for median max drawdown.
pub const DRAWDOWN_FLOOR: f64 = 0.01;
/// Bound applied to relative scores.
pub const SCORE_CLIP: f64 = 2.0;

/// Simulation statistic compared between the two runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegimeMetric {
    /// Share of paths ending profitable.
    ProbabilityOfProfit,
    /// Mean total return.
    ExpectedReturn,
    /// Mean path Sharpe.
    Sharpe,
    /// Median of per-path maximum drawdowns.
    MedianMaxDrawdown,
}

impl RegimeMetric {
    /// All compared metrics, in report order.
    pub const ALL: [Self; 4] = [
        Self::ProbabilityOfProfit,
        Self::ExpectedReturn,
        Self::Sharpe,
        Self::MedianMaxDrawdown,
    ];

    /// Stable identifier used in observations.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::ProbabilityOfProfit => "probability_of_profit",
            Self::ExpectedReturn => "expected_return",
            Self::Sharpe => "mean_sharpe",
            Self::MedianMaxDrawdown => "median_max_drawdown",
        }
    }

    /// Read the statistic.
    #[must_use]
    pub fn value_of(&self, stats: &SimulationStatistics) -> Option<f64> {
        match self {
            Self::ProbabilityOfProfit => Some(stats.probability_of_profit),
            Self::ExpectedReturn => Some(stats.expected_return),
            Self::Sharpe => stats.mean_sharpe,
            Self::MedianMaxDrawdown => Some(stats.median_max_drawdown()),
        }
    }

    /// Signed score for a full/recent pair.
    #[must_use]
    pub fn score(&self, full: f64, recent: f64) -> f64 {
        let delta = recent - full;
        match self {
            Self::ProbabilityOfProfit => delta * POP_SCALE,
            Self::ExpectedReturn => clip(delta / full.max(EXPECTED_RETURN_FLOOR)),
            Self::Sharpe => clip(delta / full.max(SHARPE_FLOOR)),
            // A deeper recent drawdown is a deterioration
            Self::MedianMaxDrawdown => clip(-(delta / full.max(DRAWDOWN_FLOOR))),
        }
    }
}

fn clip(score: f64) -> f64 {
    score.clamp(-SCORE_CLIP, SCORE_CLIP)
}

/// Divergence of one statistic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricDivergence {
    /// Statistic compared.
    pub metric: RegimeMetric,
    /// Full-history value.
    pub full: Option<f64>,
    /// Recent-window value.
    pub recent: Option<f64>,
    /// `recent − full`.
    pub delta: Option<f64>,
    /// Signed score; `None` when either side is undefined.
    pub score: Option<f64>,
}

/// Divergence across all compared statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Divergence {
    /// Per-statistic scores.
    pub metrics: Vec<MetricDivergence>,
    /// Mean of the available scores.
    pub composite: Option<f64>,
    /// Number of statistics that produced a score.
    pub scored_metrics: usize,
    /// Factual summary of the composite.
    pub description: String,
}

/// Score the recent run against the full run.
#[must_use]
pub fn divergence(full: &SimulationStatistics, recent: &SimulationStatistics) -> Divergence {
    let metrics: Vec<MetricDivergence> = RegimeMetric::ALL
        .iter()
        .map(|metric| {
            let full_value = metric.value_of(full);
            let recent_value = metric.value_of(recent);
            let pair = full_value.zip(recent_value);
            MetricDivergence {
                metric: *metric,
                full: full_value,
                recent: recent_value,
                delta: pair.map(|(f, r)| r - f),
                score: pair.map(|(f, r)| metric.score(f, r)),
            }
        })
        .collect();

    let scores: Vec<f64> = metrics.iter().filter_map(|m| m.score).collect();
    let composite = mean(&scores);
    let description = describe(composite, scores.len());

    Divergence {
        metrics,
        composite,
        scored_metrics: scores.len(),
        description,
    }
}

fn describe(composite: Option<f64>, scored: usize) -> String {
    match composite {
        Some(score) => format!(
            "Composite divergence {score:+.3} from {scored} of {} metrics; relative scores are clipped to ±{SCORE_CLIP}, negative values mean the recent window projects below the full history",
            RegimeMetric::ALL.len()
        ),
        None => "No divergence metric could be scored".to_string(),
    }
}
