//! Aggregate statistics over completed simulation paths.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::types::SimulationPath;
use crate::metrics::math::{mean, percentile, sorted_copy, std_dev};

/// Confidence level for the reported value at risk.
pub const VAR_CONFIDENCE: f64 = 0.95;

/// Statistical distribution summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct DistributionStats {
    /// Mean value.
    pub mean: f64,
    /// Median (50th percentile).
    pub median: f64,
    /// Sample standard deviation (`None` with fewer than two values).
    pub std_dev: Option<f64>,
    /// Minimum value.
    pub min: f64,
    /// Maximum value.
    pub max: f64,
    /// 5th percentile.
    pub percentile_5: f64,
    /// 10th percentile.
    pub percentile_10: f64,
    /// 25th percentile.
    pub percentile_25: f64,
    /// 75th percentile.
    pub percentile_75: f64,
    /// 90th percentile.
    pub percentile_90: f64,
    /// 95th percentile.
    pub percentile_95: f64,
}

/// Value at Risk (`VaR`) over simulated total returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueAtRisk {
    /// Confidence level (0.95).
    pub confidence_level: f64,
    /// Total return at the (1 − confidence) percentile.
    pub var: f64,
    /// Mean total return at or below `var`.
    pub cvar: f64,
    /// Share of paths ending below the starting capital.
    pub prob_negative: f64,
}

/// Equity percentiles across all paths at one step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PercentileBand {
    /// Step index (0 = starting capital).
    pub step: usize,
    /// 5th percentile equity.
    pub p5: f64,
    /// 25th percentile equity.
    pub p25: f64,
    /// Median equity.
    pub p50: f64,
    /// 75th percentile equity.
    pub p75: f64,
    /// 95th percentile equity.
    pub p95: f64,
}

/// Aggregate statistics of a simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationStatistics {
    /// Distribution of total return (final / initial − 1).
    pub total_return: DistributionStats,
    /// Distribution of final capital.
    pub final_value: DistributionStats,
    /// Distribution of per-path maximum drawdown (positive fraction).
    pub max_drawdown: DistributionStats,
    /// Share of paths with a positive total return.
    pub probability_of_profit: f64,
    /// Mean total return.
    pub expected_return: f64,
    /// Value at risk at 95% confidence.
    pub value_at_risk: ValueAtRisk,
    /// Mean path Sharpe over paths where it is defined.
    pub mean_sharpe: Option<f64>,
    /// Median path Sharpe over paths where it is defined.
    pub median_sharpe: Option<f64>,
    /// Paths with a defined Sharpe.
    pub sharpe_paths: usize,
}

impl SimulationStatistics {
    /// Median of per-path maximum drawdowns.
    #[must_use]
    pub const fn median_max_drawdown(&self) -> f64 {
        self.max_drawdown.median
    }
}

/// Calculate distribution statistics for a set of values.
///
/// Returns `None` for an empty set.
pub fn calculate_distribution_stats(values: &[f64]) -> Option<DistributionStats> {
    let sorted = sorted_copy(values);
    let pct = |p: f64| percentile(&sorted, p);

    Some(DistributionStats {
        mean: mean(values)?,
        median: pct(50.0)?,
        std_dev: std_dev(values),
        min: *sorted.first()?,
        max: *sorted.last()?,
        percentile_5: pct(5.0)?,
        percentile_10: pct(10.0)?,
        percentile_25: pct(25.0)?,
        percentile_75: pct(75.0)?,
        percentile_90: pct(90.0)?,
        percentile_95: pct(95.0)?,
    })
}

/// Calculate Value at Risk and Conditional `VaR` of total returns.
pub fn calculate_var(returns: &[f64]) -> Option<ValueAtRisk> {
    let sorted = sorted_copy(returns);
    let var = percentile(&sorted, (1.0 - VAR_CONFIDENCE) * 100.0)?;

    let tail: Vec<f64> = sorted.iter().copied().take_while(|r| *r <= var).collect();
    let cvar = mean(&tail).unwrap_or(var);

    let negative = returns.iter().filter(|r| **r < 0.0).count();

    Some(ValueAtRisk {
        confidence_level: VAR_CONFIDENCE,
        var,
        cvar,
        prob_negative: negative as f64 / returns.len() as f64,
    })
}

/// Aggregate statistics after every path has completed.
pub fn summarize(paths: &[SimulationPath]) -> Option<SimulationStatistics> {
    let returns: Vec<f64> = paths.iter().map(|p| p.total_return).collect();
    let finals: Vec<f64> = paths.iter().map(|p| p.final_value).collect();
    let drawdowns: Vec<f64> = paths.iter().map(|p| p.max_drawdown).collect();
    let sharpes: Vec<f64> = paths.iter().filter_map(|p| p.sharpe).collect();

    let total_return = calculate_distribution_stats(&returns)?;
    let profitable = returns.iter().filter(|r| **r > 0.0).count();

    Some(SimulationStatistics {
        expected_return: total_return.mean,
        total_return,
        final_value: calculate_distribution_stats(&finals)?,
        max_drawdown: calculate_distribution_stats(&drawdowns)?,
        probability_of_profit: profitable as f64 / returns.len() as f64,
        value_at_risk: calculate_var(&returns)?,
        mean_sharpe: mean(&sharpes),
        median_sharpe: percentile(&sorted_copy(&sharpes), 50.0),
        sharpe_paths: sharpes.len(),
    })
}

/// Equity percentile bands per step across all paths.
pub fn percentile_bands(paths: &[SimulationPath]) -> Vec<PercentileBand> {
    let steps = paths.first().map_or(0, |p| p.equity_curve.len());

    (0..steps)
        .into_par_iter()
        .filter_map(|step| {
            let values: Vec<f64> = paths
                .iter()
                .filter_map(|p| p.equity_curve.get(step).copied())
                .collect();
            let sorted = sorted_copy(&values);
            Some(PercentileBand {
                step,
                p5: percentile(&sorted, 5.0)?,
                p25: percentile(&sorted, 25.0)?,
                p50: percentile(&sorted, 50.0)?,
                p75: percentile(&sorted, 75.0)?,
                p95: percentile(&sorted, 95.0)?,
            })
        })
        .collect()
}
