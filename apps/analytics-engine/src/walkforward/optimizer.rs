//! In-sample grid search over parameter combinations.

use std::sync::atomic::{AtomicBool, Ordering};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::types::{BASELINE_RISK_PCT, ParameterKind, PerformanceConstraints, WalkForwardConfig};
use crate::error::AnalyticsError;
use crate::metrics::{HUNDRED, MetricsCalculator, TradeMetrics};
use crate::parallel::ParameterSet;
use crate::trade::TradeOutcome;

const OPERATION: &str = "walk_forward";

/// Best combination found in-sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// Index in grid order.
    pub index: usize,
    /// Parameter values.
    pub parameters: ParameterSet,
    /// Target metric value.
    pub value: f64,
}

/// Why combinations were excluded from a grid search.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rejections {
    /// In-sample drawdown or loss streak exceeded the combination's own limit.
    pub outside_limits: usize,
    /// In-sample metrics failed the configured constraints.
    pub failed_constraints: usize,
    /// Target metric undefined or not finite.
    pub undefined_target: usize,
}

impl Rejections {
    /// Total rejected combinations.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.outside_limits + self.failed_constraints + self.undefined_target
    }
}

/// Outcome of one grid search.
#[derive(Debug, Clone, PartialEq)]
pub struct Optimization {
    /// Highest-scoring eligible combination.
    pub best: Option<Candidate>,
    /// Combinations evaluated.
    pub evaluated: usize,
    /// Combinations rejected by limits, constraints or an undefined target.
    pub rejected: usize,
    /// Rejections by cause.
    pub rejections: Rejections,
}

enum Verdict {
    Eligible(Candidate),
    OutsideLimits,
    FailedConstraints,
    UndefinedTarget,
}

/// Grid search over a fixed set of combinations.
#[derive(Debug)]
pub struct GridOptimizer<'a> {
    config: &'a WalkForwardConfig,
    calculator: MetricsCalculator,
    combinations: Vec<ParameterSet>,
    cancel: Option<&'a AtomicBool>,
}

impl<'a> GridOptimizer<'a> {
    /// Expand the configured grid.
    #[must_use]
    pub fn new(config: &'a WalkForwardConfig, cancel: Option<&'a AtomicBool>) -> Self {
        Self {
            config,
            calculator: MetricsCalculator::new(config.metrics),
            combinations: config.grid().combinations(),
            cancel,
        }
    }

    /// Number of combinations per window.
    #[must_use]
    pub fn combination_count(&self) -> usize {
        self.combinations.len()
    }

    fn cancelled(&self) -> bool {
        self.cancel.is_some_and(|flag| flag.load(Ordering::Relaxed))
    }

    /// Evaluate every combination on the in-sample outcomes.
    ///
    /// Ties on the target value resolve to the lowest combination index.
    pub fn optimize(&self, in_sample: &[TradeOutcome]) -> Result<Optimization, AnalyticsError> {
        let target = self.config.target.metric();

        let verdicts = self
            .combinations
            .par_iter()
            .enumerate()
            .map(|(index, parameters)| {
                if self.cancelled() {
                    return Err(AnalyticsError::Cancelled {
                        operation: OPERATION,
                    });
                }

                let metrics = self.calculator.calculate(&apply_parameters(in_sample, parameters));
                if !passes_limits(&metrics, parameters) {
                    return Ok(Verdict::OutsideLimits);
                }
                if !meets_constraints(&metrics, &self.config.constraints) {
                    return Ok(Verdict::FailedConstraints);
                }
                Ok(target
                    .value_of(&metrics)
                    .filter(|v| v.is_finite())
                    .map_or(Verdict::UndefinedTarget, |value| {
                        Verdict::Eligible(Candidate {
                            index,
                            parameters: parameters.clone(),
                            value,
                        })
                    }))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let evaluated = verdicts.len();
        let mut rejections = Rejections::default();
        let mut best: Option<Candidate> = None;
        for verdict in verdicts {
            match verdict {
                Verdict::Eligible(candidate) => {
                    if best.as_ref().is_none_or(|current| candidate.value > current.value) {
                        best = Some(candidate);
                    }
                }
                Verdict::OutsideLimits => rejections.outside_limits += 1,
                Verdict::FailedConstraints => rejections.failed_constraints += 1,
                Verdict::UndefinedTarget => rejections.undefined_target += 1,
            }
        }

        debug!(
            evaluated,
            outside_limits = rejections.outside_limits,
            failed_constraints = rejections.failed_constraints,
            undefined_target = rejections.undefined_target,
            best = ?best.as_ref().map(|c| c.index),
            "Grid search complete"
        );

        Ok(Optimization {
            best,
            evaluated,
            rejected: rejections.total(),
            rejections,
        })
    }

    /// Metrics of a slice under a parameter set.
    #[must_use]
    pub fn evaluate(&self, outcomes: &[TradeOutcome], parameters: &ParameterSet) -> TradeMetrics {
        self.calculator
            .calculate(&apply_parameters(outcomes, parameters))
    }
}

/// Scale outcomes by the sizing parameters of a combination.
#[must_use]
pub fn apply_parameters(outcomes: &[TradeOutcome], parameters: &ParameterSet) -> Vec<TradeOutcome> {
    let kinds: Vec<(ParameterKind, f64)> = parameters
        .iter()
        .filter_map(|(name, value)| ParameterKind::parse(name).map(|kind| (kind, *value)))
        .collect();

    outcomes
        .iter()
        .map(|outcome| {
            let factor = kinds.iter().fold(1.0, |factor, (kind, value)| match kind {
                ParameterKind::KellyMultiplier => factor * value,
                ParameterKind::FixedFractionPct => factor * value / BASELINE_RISK_PCT,
                ParameterKind::StrategyWeight(label) if *label == outcome.strategy => factor * value,
                _ => factor,
            });
            if (factor - 1.0).abs() < f64::EPSILON {
                outcome.clone()
            } else {
                outcome.scaled(factor)
            }
        })
        .collect()
}

/// Whether in-sample metrics stay within the combination's limit parameters.
#[must_use]
pub fn passes_limits(metrics: &TradeMetrics, parameters: &ParameterSet) -> bool {
    parameters.iter().all(|(name, limit)| match ParameterKind::parse(name) {
        Some(ParameterKind::MaxDrawdownPct) => metrics
            .max_drawdown
            .is_none_or(|dd| dd * HUNDRED <= *limit),
        Some(ParameterKind::ConsecutiveLossLimit) => {
            metrics.max_consecutive_losses as f64 <= *limit
        }
        _ => true,
    })
}

/// Whether in-sample metrics satisfy the risk constraints.
///
/// An undefined metric fails a minimum it is checked against.
#[must_use]
pub fn meets_constraints(metrics: &TradeMetrics, constraints: &PerformanceConstraints) -> bool {
    let drawdown_ok = constraints.max_drawdown_pct.is_none_or(|limit| {
        metrics
            .max_drawdown
            .is_none_or(|dd| dd * HUNDRED <= limit)
    });
    let win_rate_ok = constraints
        .min_win_rate
        .is_none_or(|min| metrics.win_rate.is_some_and(|w| w >= min));
    let sharpe_ok = constraints
        .min_sharpe
        .is_none_or(|min| metrics.sharpe.is_some_and(|s| s >= min));
    let profit_factor_ok = constraints
        .min_profit_factor
        .is_none_or(|min| metrics.profit_factor_at_least(min) == Some(true));

    drawdown_ok && win_rate_ok && sharpe_ok && profit_factor_ok
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    use super::*;
    use crate::trade::{Trade, trade_outcomes};
    use crate::walkforward::{OptimizationTarget, ParameterRange};

    fn outcomes(pls: &[i64]) -> Vec<TradeOutcome> {
        let trades: Vec<Trade> = pls
            .iter()
            .enumerate()
            .map(|(i, pl)| {
                let Some(date) = NaiveDate::from_ymd_opt(2024, 5, i as u32 + 1) else {
                    panic!("invalid test date");
                };
                let strategy = if i % 2 == 0 { "IC" } else { "PCS" };
                Trade::new(date, Decimal::from(*pl)).with_strategy(strategy)
            })
            .collect();
        trade_outcomes(&trades, 10_000.0)
    }

    fn set(pairs: &[(&str, f64)]) -> ParameterSet {
        pairs.iter().map(|(k, v)| ((*k).to_string(), *v)).collect()
    }

    #[test]
    fn test_apply_sizing_parameters() {
        let base = outcomes(&[100, -50]);

        let scaled = apply_parameters(&base, &set(&[("kelly_multiplier", 0.5)]));
        assert_eq!(scaled[0].pl, 50.0);

        let scaled = apply_parameters(&base, &set(&[("fixed_fraction_pct", 4.0)]));
        assert_eq!(scaled[1].pl, -100.0);

        let scaled = apply_parameters(&base, &set(&[("strategy_weight:PCS", 0.0)]));
        assert_eq!(scaled[0].pl, 100.0);
        assert_eq!(scaled[1].pl, 0.0);
    }

    #[test]
    fn test_limit_parameters_reject() {
        let metrics = MetricsCalculator::default().calculate(&outcomes(&[100, -50, -50, -50]));
        assert!(!passes_limits(&metrics, &set(&[("consecutive_loss_limit", 2.0)])));
        assert!(passes_limits(&metrics, &set(&[("consecutive_loss_limit", 3.0)])));
        assert!(!passes_limits(&metrics, &set(&[("max_drawdown_pct", 1.0)])));
    }

    #[test]
    fn test_constraints() {
        let metrics = MetricsCalculator::default().calculate(&outcomes(&[100, -50, 100]));
        let strict = PerformanceConstraints {
            min_win_rate: Some(0.9),
            ..Default::default()
        };
        assert!(!meets_constraints(&metrics, &strict));
        assert!(meets_constraints(&metrics, &PerformanceConstraints::default()));

        let pf = PerformanceConstraints {
            min_profit_factor: Some(3.0),
            ..Default::default()
        };
        assert!(meets_constraints(&metrics, &pf));
    }

    #[test]
    fn test_best_combination_and_tie_break() {
        let config = WalkForwardConfig {
            target: OptimizationTarget::NetPl,
            parameters: vec![ParameterRange::new("kelly_multiplier", 0.5, 1.5, 0.5)],
            ..Default::default()
        };
        let optimizer = GridOptimizer::new(&config, None);
        let Ok(result) = optimizer.optimize(&outcomes(&[100, -20, 50])) else {
            panic!("optimization should run");
        };
        let Some(best) = result.best else {
            panic!("a combination should be eligible");
        };
        assert_eq!(best.parameters.get("kelly_multiplier"), Some(&1.5));
        assert_eq!(result.evaluated, 3);

        // Every combination scores zero P/L: lowest index wins
        let Ok(result) = optimizer.optimize(&outcomes(&[0, 0])) else {
            panic!("optimization should run");
        };
        assert_eq!(result.best.map(|c| c.index), Some(0));
    }

    #[test]
    fn test_nothing_eligible() {
        let config = WalkForwardConfig {
            target: OptimizationTarget::NetPl,
            constraints: PerformanceConstraints {
                min_sharpe: Some(100.0),
                ..Default::default()
            },
            ..Default::default()
        };
        let optimizer = GridOptimizer::new(&config, None);
        let Ok(result) = optimizer.optimize(&outcomes(&[100, -20, 50])) else {
            panic!("optimization should run");
        };
        assert!(result.best.is_none());
        assert_eq!(result.rejected, 1);
        assert_eq!(result.rejections.failed_constraints, 1);
    }

    #[test]
    fn test_rejections_by_cause() {
        let config = WalkForwardConfig {
            target: OptimizationTarget::NetPl,
            parameters: vec![ParameterRange::new("consecutive_loss_limit", 1.0, 3.0, 1.0)],
            ..Default::default()
        };
        let optimizer = GridOptimizer::new(&config, None);
        let Ok(result) = optimizer.optimize(&outcomes(&[100, -50, -50, 200])) else {
            panic!("optimization should run");
        };
        assert_eq!(result.evaluated, 3);
        assert_eq!(result.rejections.outside_limits, 1);
        assert_eq!(result.rejected, 1);
        assert_eq!(result.best.map(|c| c.index), Some(1));
    }

    #[test]
    fn test_cancellation() {
        let flag = AtomicBool::new(true);
        let config = WalkForwardConfig::default();
        let optimizer = GridOptimizer::new(&config, Some(&flag));
        let result = optimizer.optimize(&outcomes(&[100, -20]));
        assert!(matches!(result, Err(AnalyticsError::Cancelled { .. })));
    }
}
