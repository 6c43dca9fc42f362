//! Simulation parameters.

use serde::{Deserialize, Serialize};

use crate::config::{FieldValidator, ValidationError};

/// Upper bound on paths per simulation.
pub const MAX_SIMULATIONS: usize = 100_000;
/// Upper bound on draws per path.
pub const MAX_SIMULATION_LENGTH: usize = 100_000;

/// How resampled values are applied to capital.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ResampleMethod {
    /// Values are P/L amounts: `capital += value`.
    Dollar,
    /// Values are fractional returns accumulated additively:
    /// `capital = initial * (1 + Σ returns)`.
    #[default]
    Percentage,
}

/// Unit of the historical pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ResampleUnit {
    /// One pool entry per trade.
    #[default]
    Trade,
    /// One pool entry per settlement day (P/L summed per day).
    Daily,
}

/// Worst-case injection strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WorstCaseMode {
    /// Append copies of the worst outcome to the pool.
    #[default]
    Pool,
    /// Force a share of every path's draws to the worst outcome.
    Guarantee,
}

/// Worst-case stress injection settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorstCaseConfig {
    /// Share of the pool (pool mode) or path (guarantee mode), in percent (0, 100].
    pub percentage: f64,
    /// Injection strategy.
    #[serde(default)]
    pub mode: WorstCaseMode,
    /// Outcome to inject. Defaults to the most negative pool entry.
    #[serde(default)]
    pub loss_value: Option<f64>,
}

impl Default for WorstCaseConfig {
    fn default() -> Self {
        Self {
            percentage: 5.0,
            mode: WorstCaseMode::Pool,
            loss_value: None,
        }
    }
}

/// Parameters for a Monte Carlo projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationParams {
    /// Number of independent paths.
    pub num_simulations: usize,
    /// Draws per path (trades or days projected forward).
    pub simulation_length: usize,
    /// Dollar or percentage application.
    pub resample_method: ResampleMethod,
    /// Pool unit when derived from trades.
    pub resample_unit: ResampleUnit,
    /// Starting capital.
    pub initial_capital: f64,
    /// Base seed; drawn from OS entropy when absent and reported in the result.
    pub random_seed: Option<u64>,
    /// Only the most recent N pool entries are resampled.
    pub resample_window: Option<usize>,
    /// Optional stress injection.
    pub worst_case: Option<WorstCaseConfig>,
    /// Caller-supplied pool (e.g. margin-based returns); bypasses derivation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub precomputed_returns: Option<Vec<f64>>,
    /// Draws per year, used to annualize path Sharpe.
    pub trades_per_year: u32,
    /// Keep per-path equity curves in the result.
    pub store_paths: bool,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            num_simulations: 1000,
            simulation_length: 252,
            resample_method: ResampleMethod::Percentage,
            resample_unit: ResampleUnit::Trade,
            initial_capital: 100_000.0,
            random_seed: None,
            resample_window: None,
            worst_case: None,
            precomputed_returns: None,
            trades_per_year: 252,
            store_paths: true,
        }
    }
}

impl SimulationParams {
    /// Validate every field, reporting all violations.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut v = FieldValidator::new();
        v.in_range_usize("num_simulations", self.num_simulations, 1, MAX_SIMULATIONS)
            .in_range_usize(
                "simulation_length",
                self.simulation_length,
                1,
                MAX_SIMULATION_LENGTH,
            )
            .positive("initial_capital", self.initial_capital)
            .in_range_usize("trades_per_year", self.trades_per_year as usize, 1, 10_000);

        if let Some(window) = self.resample_window {
            v.at_least("resample_window", window, 1);
        }

        if let Some(worst) = &self.worst_case {
            v.check(
                worst.percentage.is_finite() && worst.percentage > 0.0 && worst.percentage <= 100.0,
                "worst_case.percentage",
                format!("must be in (0, 100] (got {})", worst.percentage),
            );
            if let Some(loss) = worst.loss_value {
                v.check(
                    loss.is_finite(),
                    "worst_case.loss_value",
                    "must be a finite number",
                );
            }
        }

        if let Some(returns) = &self.precomputed_returns {
            v.check(
                returns.iter().all(|r| r.is_finite()),
                "precomputed_returns",
                "must contain only finite values",
            );
        }

        v.finish()
    }
}
