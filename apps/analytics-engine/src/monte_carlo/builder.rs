//! Fluent construction of a [`MonteCarloSimulator`].

use super::config::{ResampleMethod, ResampleUnit, SimulationParams, WorstCaseConfig};
use super::simulator::MonteCarloSimulator;
use crate::error::AnalyticsError;

/// Builder for Monte Carlo simulation.
#[derive(Debug, Default)]
pub struct MonteCarloBuilder {
    params: SimulationParams,
}

impl MonteCarloBuilder {
    /// Create a new builder with default parameters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set number of paths.
    #[must_use]
    pub const fn simulations(mut self, n: usize) -> Self {
        self.params.num_simulations = n;
        self
    }

    /// Set draws per path.
    #[must_use]
    pub const fn length(mut self, n: usize) -> Self {
        self.params.simulation_length = n;
        self
    }

    /// Set resample method.
    #[must_use]
    pub const fn method(mut self, method: ResampleMethod) -> Self {
        self.params.resample_method = method;
        self
    }

    /// Set resample unit.
    #[must_use]
    pub const fn unit(mut self, unit: ResampleUnit) -> Self {
        self.params.resample_unit = unit;
        self
    }

    /// Set random seed for reproducibility.
    #[must_use]
    pub const fn seed(mut self, seed: u64) -> Self {
        self.params.random_seed = Some(seed);
        self
    }

    /// Set starting capital.
    #[must_use]
    pub const fn initial_capital(mut self, capital: f64) -> Self {
        self.params.initial_capital = capital;
        self
    }

    /// Resample only the most recent `n` pool entries.
    #[must_use]
    pub const fn resample_window(mut self, n: usize) -> Self {
        self.params.resample_window = Some(n);
        self
    }

    /// Enable worst-case injection.
    #[must_use]
    pub const fn worst_case(mut self, config: WorstCaseConfig) -> Self {
        self.params.worst_case = Some(config);
        self
    }

    /// Supply the resample pool directly.
    #[must_use]
    pub fn precomputed_returns(mut self, returns: Vec<f64>) -> Self {
        self.params.precomputed_returns = Some(returns);
        self
    }

    /// Set draws per year for Sharpe annualization.
    #[must_use]
    pub const fn trades_per_year(mut self, n: u32) -> Self {
        self.params.trades_per_year = n;
        self
    }

    /// Keep or drop per-path equity curves.
    #[must_use]
    pub const fn store_paths(mut self, store: bool) -> Self {
        self.params.store_paths = store;
        self
    }

    /// Build the simulator, validating parameters.
    pub fn build(self) -> Result<MonteCarloSimulator, AnalyticsError> {
        MonteCarloSimulator::new(self.params)
    }
}
