//! Full-versus-recent regime comparison.

use chrono::NaiveDate;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::config::{RecentWindow, RegimeConfig, ReturnBasisDecision};
use super::divergence::{Divergence, divergence};
use crate::error::AnalyticsError;
use crate::monte_carlo::{MonteCarloSimulator, ResampleMethod, SimulationStatistics};
use crate::trade::{
    ReturnBasis, Trade, aligned_capital_returns, margin_return, prepare_history,
};

const OPERATION: &str = "regime_comparison";

/// One side of the comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegimeRun {
    /// Trades in the sample.
    pub trades: usize,
    /// First trade date of the sample.
    pub start: NaiveDate,
    /// Returns in the resample pool.
    pub pool_size: usize,
    /// Simulation statistics.
    pub statistics: SimulationStatistics,
}

/// Result of a regime comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegimeComparison {
    /// Return basis used for both pools.
    pub basis: ReturnBasisDecision,
    /// Window selection that produced the recent sample.
    pub recent_window: RecentWindow,
    /// Seed shared by both runs.
    pub seed_used: u64,
    /// Full-history run.
    pub full: RegimeRun,
    /// Recent-window run.
    pub recent: RegimeRun,
    /// Signed divergence of recent against full.
    pub divergence: Divergence,
}

/// Compares Monte Carlo projections of the full history and a recent window.
#[derive(Debug, Clone)]
pub struct RegimeAnalyzer {
    config: RegimeConfig,
}

impl RegimeAnalyzer {
    /// Create an analyzer, rejecting invalid configuration.
    pub fn new(config: RegimeConfig) -> Result<Self, AnalyticsError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Access the configuration.
    #[must_use]
    pub const fn config(&self) -> &RegimeConfig {
        &self.config
    }

    /// Compare regimes, detecting the return basis from the trades.
    pub fn analyze(&self, trades: &[Trade]) -> Result<RegimeComparison, AnalyticsError> {
        let basis = ReturnBasisDecision::resolve(trades, self.config.use_margin_returns);
        self.analyze_with_basis(trades, basis)
    }

    /// Compare regimes using an already resolved return basis.
    pub fn analyze_with_basis(
        &self,
        trades: &[Trade],
        basis: ReturnBasisDecision,
    ) -> Result<RegimeComparison, AnalyticsError> {
        let history = prepare_history(trades, self.config.initial_capital)?;
        let sorted = &history.trades;

        let recent_count = self.config.recent_window.recent_count(sorted);
        if recent_count == 0 || recent_count >= sorted.len() {
            return Err(AnalyticsError::insufficient(
                OPERATION,
                format!(
                    "recent window holds {recent_count} of {} trades; it must be a strict suffix",
                    sorted.len()
                ),
            ));
        }
        let split = sorted.len() - recent_count;

        // Recent capital returns keep the full-history equity path
        let returns: Vec<Option<f64>> = match basis.basis {
            ReturnBasis::Margin => sorted.iter().map(margin_return).collect(),
            ReturnBasis::Capital | ReturnBasis::Dollar => {
                aligned_capital_returns(sorted, history.initial_capital)
            }
        };
        let full_pool: Vec<f64> = returns.iter().flatten().copied().collect();
        let recent_pool: Vec<f64> = returns[split..].iter().flatten().copied().collect();

        let seed = self
            .config
            .simulation
            .random_seed
            .unwrap_or_else(|| rand::rng().random());

        info!(
            trades = sorted.len(),
            recent = recent_count,
            basis = ?basis.basis,
            seed,
            "Running regime comparison"
        );

        let full_stats = self.simulate(&full_pool, seed, "full history")?;
        let recent_stats = self.simulate(&recent_pool, seed, "recent window")?;
        let divergence = divergence(&full_stats, &recent_stats);

        debug!(
            composite = ?divergence.composite,
            scored = divergence.scored_metrics,
            "Regime divergence computed"
        );

        Ok(RegimeComparison {
            basis,
            recent_window: self.config.recent_window,
            seed_used: seed,
            full: RegimeRun {
                trades: sorted.len(),
                start: sorted[0].date_opened,
                pool_size: full_pool.len(),
                statistics: full_stats,
            },
            recent: RegimeRun {
                trades: recent_count,
                start: sorted[split].date_opened,
                pool_size: recent_pool.len(),
                statistics: recent_stats,
            },
            divergence,
        })
    }

    fn simulate(
        &self,
        pool: &[f64],
        seed: u64,
        sample: &str,
    ) -> Result<SimulationStatistics, AnalyticsError> {
        if pool.is_empty() {
            return Err(AnalyticsError::insufficient(
                OPERATION,
                format!("{sample} has no defined returns"),
            ));
        }
        let mut params = self.config.simulation.clone();
        params.resample_method = ResampleMethod::Percentage;
        params.random_seed = Some(seed);
        params.store_paths = false;
        params.precomputed_returns = Some(pool.to_vec());

        let simulator = MonteCarloSimulator::new(params)?;
        let pool = simulator.build_pool(&[]);
        Ok(simulator.run_pool(&pool)?.statistics)
    }
}
