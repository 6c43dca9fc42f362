//! Walk-forward analysis engine.

use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use tracing::{info, warn};

use super::analysis::{efficiency, summarize};
use super::optimizer::GridOptimizer;
use super::types::{WalkForwardConfig, WalkForwardResult, WalkForwardWindow};
use super::windows::{generate_windows, slice_window};
use crate::error::AnalyticsError;
use crate::trade::{Trade, prepare_history};

/// Walk-forward optimizer over rolling calendar windows.
#[derive(Debug, Clone)]
pub struct WalkForwardAnalyzer {
    config: WalkForwardConfig,
    cancel: Option<Arc<AtomicBool>>,
}

impl WalkForwardAnalyzer {
    /// Create an analyzer, rejecting invalid configuration.
    pub fn new(config: WalkForwardConfig) -> Result<Self, AnalyticsError> {
        config.validate()?;
        Ok(Self {
            config,
            cancel: None,
        })
    }

    /// Check a caller-owned flag before each combination.
    #[must_use]
    pub fn with_cancellation(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Access the engine configuration.
    #[must_use]
    pub const fn config(&self) -> &WalkForwardConfig {
        &self.config
    }

    /// Run the analysis over an unordered trade collection.
    pub fn analyze(&self, trades: &[Trade]) -> Result<WalkForwardResult, AnalyticsError> {
        let history = prepare_history(trades, self.config.initial_capital)?;
        let (Some(first), Some(last)) = (history.outcomes.first(), history.outcomes.last()) else {
            return Err(AnalyticsError::insufficient("walk_forward", "no trades"));
        };

        let bounds = generate_windows(first.date, last.date, &self.config.window);
        let optimizer = GridOptimizer::new(&self.config, self.cancel.as_deref());
        let target = self.config.target.metric();
        let epsilon = self.config.epsilons.for_metric(target);

        info!(
            trades = history.outcomes.len(),
            windows = bounds.len(),
            combinations = optimizer.combination_count(),
            target = %target,
            "Running walk-forward analysis"
        );

        let mut windows = Vec::with_capacity(bounds.len());
        for window_bounds in &bounds {
            let slices = slice_window(&history.outcomes, window_bounds);
            let mut window = WalkForwardWindow {
                bounds: *window_bounds,
                in_sample_trades: slices.in_sample.len(),
                out_of_sample_trades: slices.out_of_sample.len(),
                parameters: Default::default(),
                in_sample_value: None,
                out_of_sample_value: None,
                out_of_sample_net_pl: 0.0,
                efficiency: None,
                sufficient: slices.is_sufficient(&self.config.window),
                combinations_evaluated: 0,
                combinations_rejected: 0,
            };

            if !window.sufficient {
                windows.push(window);
                continue;
            }

            let optimization = optimizer.optimize(&slices.in_sample)?;
            window.combinations_evaluated = optimization.evaluated;
            window.combinations_rejected = optimization.rejected;

            if let Some(best) = optimization.best {
                let oos_metrics = optimizer.evaluate(&slices.out_of_sample, &best.parameters);
                window.in_sample_value = Some(best.value);
                window.out_of_sample_value = target.value_of(&oos_metrics);
                window.out_of_sample_net_pl = oos_metrics.net_pl;
                window.efficiency =
                    efficiency(window.in_sample_value, window.out_of_sample_value, target, epsilon);
                window.parameters = best.parameters;
            }

            windows.push(window);
        }

        let summary = summarize(&windows);
        if summary.sufficient_windows == 0 {
            warn!(
                windows = windows.len(),
                "No walk-forward window met the minimum trade counts"
            );
        }

        info!(
            sufficient = summary.sufficient_windows,
            avg_efficiency = ?summary.avg_efficiency,
            robustness = ?summary.robustness_score,
            "Walk-forward analysis complete"
        );

        Ok(WalkForwardResult {
            config: self.config.clone(),
            initial_capital: history.initial_capital,
            windows,
            summary,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use chrono::{Days, NaiveDate};
    use rust_decimal::Decimal;

    use super::*;
    use crate::walkforward::{OptimizationTarget, ParameterRange, WalkForwardBuilder};

    fn daily_trades(count: u64, pattern: &[i64]) -> Vec<Trade> {
        let Some(start) = NaiveDate::from_ymd_opt(2024, 1, 1) else {
            panic!("invalid test date");
        };
        (0..count)
            .map(|i| {
                let Some(date) = start.checked_add_days(Days::new(i)) else {
                    panic!("date overflow");
                };
                let pl = pattern[i as usize % pattern.len()];
                Trade::new(date, Decimal::from(pl))
            })
            .collect()
    }

    fn analyzer(target: OptimizationTarget) -> WalkForwardAnalyzer {
        let built = WalkForwardBuilder::new()
            .in_sample_days(30)
            .out_of_sample_days(10)
            .step_days(10)
            .min_trades(5, 3)
            .target(target)
            .initial_capital(100_000.0)
            .parameter(ParameterRange::new("kelly_multiplier", 0.5, 1.0, 0.5))
            .build();
        match built {
            Ok(a) => a,
            Err(e) => panic!("config should be valid: {e}"),
        }
    }

    #[test]
    fn test_steady_history_is_consistent() {
        let trades = daily_trades(120, &[200, -100, 150]);
        let Ok(result) = analyzer(OptimizationTarget::NetPl).analyze(&trades) else {
            panic!("analysis should run");
        };

        assert!(!result.windows.is_empty());
        assert!(result.windows.iter().all(|w| w.sufficient || w.out_of_sample_trades < 3));
        assert_eq!(result.summary.consistency, Some(1.0));
        // Larger size always wins on a profitable history
        for window in result.windows.iter().filter(|w| w.sufficient) {
            assert_eq!(window.parameters.get("kelly_multiplier"), Some(&1.0));
        }
        assert_eq!(
            result.summary.parameter_stability.overall,
            Some(1.0)
        );
    }

    #[test]
    fn test_insufficient_windows_are_kept() {
        // Trades only every 10th day: too few in-sample trades
        let trades: Vec<Trade> = daily_trades(100, &[100])
            .into_iter()
            .step_by(10)
            .collect();
        let Ok(result) = analyzer(OptimizationTarget::Sharpe).analyze(&trades) else {
            panic!("analysis should run");
        };
        assert!(!result.windows.is_empty());
        assert!(result.windows.iter().all(|w| !w.sufficient));
        assert!(result.windows.iter().all(|w| w.parameters.is_empty()));
        assert!(result.summary.robustness_score.is_none());
    }

    #[test]
    fn test_empty_history_is_insufficient() {
        let result = analyzer(OptimizationTarget::Sharpe).analyze(&[]);
        assert!(matches!(result, Err(AnalyticsError::InsufficientData { .. })));
    }

    #[test]
    fn test_cancellation_flag() {
        let flag = Arc::new(AtomicBool::new(false));
        let analyzer = analyzer(OptimizationTarget::NetPl).with_cancellation(Arc::clone(&flag));
        flag.store(true, Ordering::Relaxed);

        let result = analyzer.analyze(&daily_trades(60, &[100, -50]));
        assert!(matches!(result, Err(AnalyticsError::Cancelled { .. })));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let result = WalkForwardAnalyzer::new(WalkForwardConfig {
            parameters: vec![ParameterRange::new("lookback", 1.0, 2.0, 1.0)],
            ..Default::default()
        });
        assert!(matches!(result, Err(AnalyticsError::InvalidConfig(_))));
    }

    #[test]
    fn test_unbounded_grid_rejected_at_construction() {
        let result = WalkForwardAnalyzer::new(WalkForwardConfig {
            parameters: vec![ParameterRange::new("kelly_multiplier", 0.0, 1.0, 1e-300)],
            ..Default::default()
        });
        let Err(AnalyticsError::InvalidConfig(err)) = result else {
            panic!("unbounded grid should be rejected");
        };
        assert!(err.has_field("parameters"));
    }
}
