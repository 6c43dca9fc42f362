//! Rolling analysis orchestration.

use tracing::{debug, info};

use super::flags::{compare, structural_flags};
use super::seasonal::seasonal_averages;
use super::types::{RollingAnalysis, RollingConfig, RollingPoint};
use crate::error::AnalyticsError;
use crate::metrics::MetricsCalculator;
use crate::trade::{Trade, prepare_history};

/// Rolling metrics, seasonality and recent-regime flags.
#[derive(Debug, Clone)]
pub struct RollingAnalyzer {
    config: RollingConfig,
}

impl RollingAnalyzer {
    /// Create an analyzer, rejecting invalid configuration.
    pub fn new(config: RollingConfig) -> Result<Self, AnalyticsError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Run the analysis over an unordered trade collection.
    pub fn analyze(&self, trades: &[Trade]) -> Result<RollingAnalysis, AnalyticsError> {
        let history = prepare_history(trades, self.config.initial_capital)?;
        let outcomes = &history.outcomes;
        if outcomes.is_empty() {
            return Err(AnalyticsError::insufficient("rolling", "no trades"));
        }

        let calculator = MetricsCalculator::new(self.config.metrics);
        let window = self.config.resolve_window(outcomes.len());

        let points: Vec<RollingPoint> = outcomes
            .windows(window)
            .enumerate()
            .map(|(start, slice)| {
                let index = start + window - 1;
                RollingPoint::from_metrics(index, outcomes[index].date, &calculator.calculate(slice))
            })
            .collect();

        let split = outcomes.len().saturating_sub(window);
        let (earlier, recent) = outcomes.split_at(split);
        let comparison = (!earlier.is_empty())
            .then(|| compare(calculator.calculate(recent), calculator.calculate(earlier)));
        let flags = comparison.as_ref().map(structural_flags).unwrap_or_default();

        debug!(
            window,
            points = points.len(),
            historical = earlier.len(),
            "Rolling series computed"
        );
        info!(
            trades = outcomes.len(),
            window,
            flags_crossed = flags.iter().filter(|f| f.crossed).count(),
            "Rolling analysis complete"
        );

        Ok(RollingAnalysis {
            window,
            trade_count: outcomes.len(),
            initial_capital: history.initial_capital,
            seasonal: seasonal_averages(&points),
            points,
            comparison,
            flags,
        })
    }
}
