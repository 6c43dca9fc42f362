//! Monte Carlo projection.
//!
//! Bootstraps forward equity paths from a pool of historical outcomes:
//! - Dollar or percentage application (percentage accumulates additively)
//! - Per-trade or per-day pools, optionally limited to the most recent entries
//! - Worst-case stress injection into the pool or into every path
//! - Reproducible runs: every path seed derives from one reported base seed
//!
//! Paths run in parallel; statistics are computed once all paths complete.

mod builder;
mod config;
mod simulator;
mod stats;
mod types;

pub use builder::MonteCarloBuilder;
pub use config::{
    MAX_SIMULATION_LENGTH, MAX_SIMULATIONS, ResampleMethod, ResampleUnit, SimulationParams,
    WorstCaseConfig, WorstCaseMode,
};
pub use simulator::{CAPITAL_FLOOR, MonteCarloSimulator};
pub use stats::{
    DistributionStats, PercentileBand, SimulationStatistics, VAR_CONFIDENCE, ValueAtRisk,
    calculate_distribution_stats, calculate_var, percentile_bands, summarize,
};
pub use types::{SimulationPath, SimulationResult};
