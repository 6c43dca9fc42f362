//! Simulation result types.

use serde::{Deserialize, Serialize};

use super::config::SimulationParams;
use super::stats::{PercentileBand, SimulationStatistics};

/// One simulated equity path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationPath {
    /// Path index.
    pub index: usize,
    /// Capital after each draw, starting with the initial capital.
    ///
    /// Empty when the simulation ran with `store_paths = false`.
    pub equity_curve: Vec<f64>,
    /// Reported capital after the last draw (never below zero).
    pub final_value: f64,
    /// `final_value / initial_capital − 1`.
    pub total_return: f64,
    /// Unclamped cumulative return of the accumulator.
    ///
    /// Percentage mode: sum of drawn returns. Dollar mode: sum of drawn P/L
    /// over the initial capital.
    pub cumulative_return: f64,
    /// Maximum peak-to-trough decline of the reported capital (fraction).
    pub max_drawdown: f64,
    /// Annualized Sharpe of per-step capital changes.
    pub sharpe: Option<f64>,
}

/// Complete Monte Carlo result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    /// Parameters used (seed resolved in `seed_used`).
    pub params: SimulationParams,
    /// Base seed every path seed is derived from.
    pub seed_used: u64,
    /// Pool size before worst-case injection.
    pub pool_size: usize,
    /// Worst-case value injected, if any.
    pub worst_case_value: Option<f64>,
    /// All simulated paths.
    pub paths: Vec<SimulationPath>,
    /// Equity percentiles per step.
    pub percentile_bands: Vec<PercentileBand>,
    /// Aggregate statistics.
    pub statistics: SimulationStatistics,
}
