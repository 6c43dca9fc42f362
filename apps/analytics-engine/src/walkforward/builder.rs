//! Builder pattern for walk-forward analysis configuration.

use super::engine::WalkForwardAnalyzer;
use super::types::{
    EfficiencyEpsilons, OptimizationTarget, ParameterRange, PerformanceConstraints,
    WalkForwardConfig,
};
use crate::error::AnalyticsError;
use crate::metrics::MetricsSettings;

/// Builder for walk-forward analysis.
#[derive(Debug, Default)]
pub struct WalkForwardBuilder {
    config: WalkForwardConfig,
}

impl WalkForwardBuilder {
    /// Create a new builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set in-sample window size in days.
    #[must_use]
    pub const fn in_sample_days(mut self, days: u32) -> Self {
        self.config.window.in_sample_days = days;
        self
    }

    /// Set out-of-sample window size in days.
    #[must_use]
    pub const fn out_of_sample_days(mut self, days: u32) -> Self {
        self.config.window.out_of_sample_days = days;
        self
    }

    /// Set cursor advance in days.
    #[must_use]
    pub const fn step_days(mut self, days: u32) -> Self {
        self.config.window.step_days = days;
        self
    }

    /// Set minimum in-sample and out-of-sample trade counts.
    #[must_use]
    pub const fn min_trades(mut self, in_sample: usize, out_of_sample: usize) -> Self {
        self.config.window.min_in_sample_trades = in_sample;
        self.config.window.min_out_of_sample_trades = out_of_sample;
        self
    }

    /// Set optimization target.
    #[must_use]
    pub const fn target(mut self, target: OptimizationTarget) -> Self {
        self.config.target = target;
        self
    }

    /// Add a parameter sweep.
    #[must_use]
    pub fn parameter(mut self, range: ParameterRange) -> Self {
        self.config.parameters.push(range);
        self
    }

    /// Set eligibility constraints.
    #[must_use]
    pub const fn constraints(mut self, constraints: PerformanceConstraints) -> Self {
        self.config.constraints = constraints;
        self
    }

    /// Set efficiency guards.
    #[must_use]
    pub const fn epsilons(mut self, epsilons: EfficiencyEpsilons) -> Self {
        self.config.epsilons = epsilons;
        self
    }

    /// Set starting equity.
    #[must_use]
    pub const fn initial_capital(mut self, capital: f64) -> Self {
        self.config.initial_capital = Some(capital);
        self
    }

    /// Set metric annualization settings.
    #[must_use]
    pub const fn metrics(mut self, metrics: MetricsSettings) -> Self {
        self.config.metrics = metrics;
        self
    }

    /// Build the analyzer, validating the configuration.
    pub fn build(self) -> Result<WalkForwardAnalyzer, AnalyticsError> {
        WalkForwardAnalyzer::new(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_sets_fields() {
        let Ok(analyzer) = WalkForwardBuilder::new()
            .in_sample_days(60)
            .out_of_sample_days(20)
            .step_days(20)
            .target(OptimizationTarget::Calmar)
            .build()
        else {
            panic!("builder config should be valid");
        };
        assert_eq!(analyzer.config().window.in_sample_days, 60);
        assert_eq!(analyzer.config().target, OptimizationTarget::Calmar);
    }

    #[test]
    fn test_builder_validates() {
        let result = WalkForwardBuilder::new().out_of_sample_days(0).build();
        assert!(matches!(result, Err(AnalyticsError::InvalidConfig(_))));
    }
}
