//! Bootstrap resampling simulator.

use rand::rngs::StdRng;
use rand::seq::index::sample;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use tracing::{debug, info, warn};

use super::config::{ResampleMethod, ResampleUnit, SimulationParams, WorstCaseMode};
use super::stats::{percentile_bands, summarize};
use super::types::{SimulationPath, SimulationResult};
use crate::error::AnalyticsError;
use crate::metrics::TOLERANCE;
use crate::metrics::math::{mean, safe_ratio, std_dev};
use crate::trade::{
    Trade, capital_returns, daily_capital_returns, daily_pl, dollar_returns, sort_chronologically,
    validate_trades,
};

/// Reported capital never drops below this value.
pub const CAPITAL_FLOOR: f64 = 0.0;

const OPERATION: &str = "monte_carlo";

/// Monte Carlo simulator.
#[derive(Debug, Clone)]
pub struct MonteCarloSimulator {
    params: SimulationParams,
}

impl MonteCarloSimulator {
    /// Create a simulator, rejecting invalid parameters.
    pub fn new(params: SimulationParams) -> Result<Self, AnalyticsError> {
        params.validate()?;
        Ok(Self { params })
    }

    /// Access the parameters.
    #[must_use]
    pub const fn params(&self) -> &SimulationParams {
        &self.params
    }

    /// Derive the resample pool from trades (or take the precomputed one).
    #[must_use]
    pub fn build_pool(&self, sorted_trades: &[Trade]) -> Vec<f64> {
        let pool = match &self.params.precomputed_returns {
            Some(returns) => returns.clone(),
            None => {
                let capital = self.params.initial_capital;
                match (self.params.resample_method, self.params.resample_unit) {
                    (ResampleMethod::Dollar, ResampleUnit::Trade) => dollar_returns(sorted_trades),
                    (ResampleMethod::Dollar, ResampleUnit::Daily) => {
                        daily_pl(sorted_trades).into_iter().map(|(_, pl)| pl).collect()
                    }
                    (ResampleMethod::Percentage, ResampleUnit::Trade) => {
                        capital_returns(sorted_trades, capital)
                    }
                    (ResampleMethod::Percentage, ResampleUnit::Daily) => {
                        daily_capital_returns(sorted_trades, capital)
                    }
                }
            }
        };

        match self.params.resample_window {
            Some(window) if pool.len() > window => pool[pool.len() - window..].to_vec(),
            _ => pool,
        }
    }

    /// Run the simulation over a trade history.
    pub fn run(&self, trades: &[Trade]) -> Result<SimulationResult, AnalyticsError> {
        validate_trades(trades)?;
        let sorted = sort_chronologically(trades);
        let pool = self.build_pool(&sorted);
        self.run_pool(&pool)
    }

    /// Run the simulation over an explicit resample pool.
    pub fn run_pool(&self, pool: &[f64]) -> Result<SimulationResult, AnalyticsError> {
        if pool.is_empty() {
            return Err(AnalyticsError::insufficient(
                OPERATION,
                "resample pool is empty",
            ));
        }

        let seed = self
            .params
            .random_seed
            .unwrap_or_else(|| rand::rng().random());

        let (pool_with_injection, worst_case_value, guaranteed) = self.inject_worst_case(pool);

        info!(
            simulations = self.params.num_simulations,
            length = self.params.simulation_length,
            pool = pool.len(),
            method = ?self.params.resample_method,
            seed,
            "Running Monte Carlo simulation"
        );

        let mut paths: Vec<SimulationPath> = (0..self.params.num_simulations)
            .into_par_iter()
            .map(|index| self.simulate_path(&pool_with_injection, guaranteed, seed, index))
            .collect();

        // Barrier: statistics need every path
        let percentile_bands = percentile_bands(&paths);
        let statistics = summarize(&paths)
            .ok_or_else(|| AnalyticsError::insufficient(OPERATION, "no paths simulated"))?;

        if !self.params.store_paths {
            for path in &mut paths {
                path.equity_curve = Vec::new();
            }
        }

        debug!(
            probability_of_profit = statistics.probability_of_profit,
            expected_return = statistics.expected_return,
            median_max_drawdown = statistics.median_max_drawdown(),
            "Monte Carlo simulation complete"
        );

        Ok(SimulationResult {
            params: self.params.clone(),
            seed_used: seed,
            pool_size: pool.len(),
            worst_case_value,
            paths,
            percentile_bands,
            statistics,
        })
    }

    /// Resolve worst-case injection: the pool to draw from, the injected
    /// value, and the per-path guaranteed value (guarantee mode only).
    fn inject_worst_case(&self, pool: &[f64]) -> (Vec<f64>, Option<f64>, Option<f64>) {
        let Some(config) = &self.params.worst_case else {
            return (pool.to_vec(), None, None);
        };

        let pool_min = pool.iter().copied().fold(f64::INFINITY, f64::min);
        let worst = config.loss_value.unwrap_or(pool_min);
        if worst >= 0.0 {
            warn!(worst, "Worst-case outcome is not a loss; skipping injection");
            return (pool.to_vec(), None, None);
        }

        match config.mode {
            WorstCaseMode::Pool => {
                let copies = injection_count(pool.len(), config.percentage);
                let mut injected = pool.to_vec();
                injected.extend(std::iter::repeat_n(worst, copies));
                debug!(copies, worst, "Injected worst-case outcomes into pool");
                (injected, Some(worst), None)
            }
            WorstCaseMode::Guarantee => (pool.to_vec(), Some(worst), Some(worst)),
        }
    }

    fn simulate_path(
        &self,
        pool: &[f64],
        guaranteed: Option<f64>,
        seed: u64,
        index: usize,
    ) -> SimulationPath {
        let mut rng = StdRng::seed_from_u64(path_seed(seed, index));
        let length = self.params.simulation_length;

        let mut draws: Vec<f64> = (0..length)
            .map(|_| pool[rng.random_range(0..pool.len())])
            .collect();

        if let (Some(worst), Some(config)) = (guaranteed, &self.params.worst_case) {
            let forced = injection_count(length, config.percentage).min(length);
            for position in sample(&mut rng, length, forced) {
                draws[position] = worst;
            }
        }

        let initial = self.params.initial_capital;
        let mut accumulator = 0.0;
        let mut previous = initial;
        let mut peak = initial;
        let mut max_drawdown: f64 = 0.0;
        let mut step_returns = Vec::with_capacity(length);
        let mut equity_curve = Vec::with_capacity(length + 1);
        equity_curve.push(initial);

        for draw in draws {
            accumulator += draw;
            let capital = match self.params.resample_method {
                ResampleMethod::Dollar => initial + accumulator,
                ResampleMethod::Percentage => initial * (1.0 + accumulator),
            }
            .max(CAPITAL_FLOOR);

            if previous > 0.0 {
                step_returns.push((capital - previous) / previous);
            }
            peak = peak.max(capital);
            if peak > 0.0 {
                max_drawdown = max_drawdown.max((peak - capital) / peak);
            }

            equity_curve.push(capital);
            previous = capital;
        }

        let cumulative_return = match self.params.resample_method {
            ResampleMethod::Dollar => accumulator / initial,
            ResampleMethod::Percentage => accumulator,
        };

        let annualizer = f64::from(self.params.trades_per_year).sqrt();
        let sharpe = mean(&step_returns).and_then(|avg| {
            std_dev(&step_returns)
                .and_then(|std| safe_ratio(avg, std, TOLERANCE))
                .map(|ratio| ratio * annualizer)
        });

        SimulationPath {
            index,
            equity_curve,
            final_value: previous,
            total_return: previous / initial - 1.0,
            cumulative_return,
            max_drawdown,
            sharpe,
        }
    }
}

/// Number of injected outcomes for a share in percent, rounded up.
fn injection_count(len: usize, percentage: f64) -> usize {
    (len as f64 * percentage / 100.0).ceil() as usize
}

/// Derive an independent per-path seed (SplitMix64 finalizer).
fn path_seed(base: u64, index: usize) -> u64 {
    let mut z = base.wrapping_add((index as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15));
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::monte_carlo::{MonteCarloBuilder, WorstCaseConfig};

    fn simulator(params: SimulationParams) -> MonteCarloSimulator {
        match MonteCarloSimulator::new(params) {
            Ok(sim) => sim,
            Err(e) => panic!("params should be valid: {e}"),
        }
    }

    fn sample_trades() -> Vec<Trade> {
        let pls = [500, -200, 300, 100, -150, 400, -100, 250, 350, -50];
        pls.iter()
            .enumerate()
            .map(|(i, pl)| {
                let Some(date) = NaiveDate::from_ymd_opt(2024, 1, i as u32 + 1) else {
                    panic!("invalid test date");
                };
                Trade::new(date, rust_decimal::Decimal::from(*pl))
            })
            .collect()
    }

    #[test]
    fn test_percentage_mode_accumulates_additively() {
        let sim = simulator(SimulationParams {
            num_simulations: 1,
            simulation_length: 4,
            initial_capital: 1000.0,
            random_seed: Some(7),
            ..Default::default()
        });

        let result = match sim.run_pool(&[-0.5]) {
            Ok(r) => r,
            Err(e) => panic!("simulation should run: {e}"),
        };
        let path = &result.paths[0];

        // 1000 * (1 + (-0.5 * 4)) floored at zero, never 1000 * 0.5^4 = 62.5
        assert_eq!(path.cumulative_return, -2.0);
        assert_eq!(path.final_value, 0.0);
        assert_eq!(path.equity_curve, vec![1000.0, 500.0, 0.0, 0.0, 0.0]);
        assert_eq!(path.max_drawdown, 1.0);
    }

    #[test]
    fn test_dollar_mode_is_additive() {
        let sim = simulator(SimulationParams {
            num_simulations: 2,
            simulation_length: 3,
            initial_capital: 1000.0,
            resample_method: ResampleMethod::Dollar,
            random_seed: Some(1),
            ..Default::default()
        });

        let Ok(result) = sim.run_pool(&[100.0]) else {
            panic!("simulation should run");
        };
        assert_eq!(result.paths[0].final_value, 1300.0);
        assert!((result.statistics.probability_of_profit - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_reproducibility_with_seed() {
        let params = SimulationParams {
            num_simulations: 200,
            simulation_length: 50,
            random_seed: Some(12345),
            ..Default::default()
        };
        let trades = sample_trades();

        let (Ok(first), Ok(second)) = (
            simulator(params.clone()).run(&trades),
            simulator(params).run(&trades),
        ) else {
            panic!("both simulations should run");
        };

        assert_eq!(first.statistics, second.statistics);
        assert_eq!(first.paths, second.paths);
        assert_eq!(first.seed_used, 12345);
    }

    #[test]
    fn test_different_seeds_differ() {
        let trades = sample_trades();
        let run = |seed| {
            simulator(SimulationParams {
                num_simulations: 100,
                simulation_length: 30,
                random_seed: Some(seed),
                ..Default::default()
            })
            .run(&trades)
        };
        let (Ok(a), Ok(b)) = (run(1), run(2)) else {
            panic!("simulations should run");
        };
        assert_ne!(a.statistics.total_return.mean, b.statistics.total_return.mean);
    }

    #[test]
    fn test_empty_pool_is_insufficient() {
        let sim = simulator(SimulationParams::default());
        let Err(err) = sim.run(&[]) else {
            panic!("empty history should not simulate");
        };
        assert!(matches!(err, AnalyticsError::InsufficientData { .. }));
    }

    #[test]
    fn test_invalid_params_rejected_before_run() {
        let result = MonteCarloSimulator::new(SimulationParams {
            num_simulations: 0,
            ..Default::default()
        });
        assert!(matches!(result, Err(AnalyticsError::InvalidConfig(_))));
    }

    #[test]
    fn test_resample_window_uses_recent_entries() {
        let sim = simulator(SimulationParams {
            resample_method: ResampleMethod::Dollar,
            resample_window: Some(3),
            ..Default::default()
        });
        let pool = sim.build_pool(&sample_trades());
        assert_eq!(pool, vec![250.0, 350.0, -50.0]);
    }

    #[test]
    fn test_precomputed_returns_bypass_derivation() {
        let sim = simulator(SimulationParams {
            precomputed_returns: Some(vec![0.02, -0.01]),
            ..Default::default()
        });
        assert_eq!(sim.build_pool(&sample_trades()), vec![0.02, -0.01]);
    }

    #[test]
    fn test_worst_case_pool_injection() {
        let sim = simulator(SimulationParams {
            num_simulations: 10,
            simulation_length: 5,
            random_seed: Some(3),
            worst_case: Some(WorstCaseConfig {
                percentage: 50.0,
                ..Default::default()
            }),
            ..Default::default()
        });
        let Ok(result) = sim.run_pool(&[0.01, -0.04, 0.02, 0.03]) else {
            panic!("simulation should run");
        };
        assert_eq!(result.worst_case_value, Some(-0.04));
        assert_eq!(result.pool_size, 4);
    }

    #[test]
    fn test_worst_case_guarantee_forces_draws() {
        let sim = simulator(SimulationParams {
            num_simulations: 5,
            simulation_length: 4,
            initial_capital: 1000.0,
            random_seed: Some(11),
            worst_case: Some(WorstCaseConfig {
                percentage: 100.0,
                mode: WorstCaseMode::Guarantee,
                loss_value: Some(-0.1),
            }),
            ..Default::default()
        });
        let Ok(result) = sim.run_pool(&[0.05]) else {
            panic!("simulation should run");
        };
        for path in &result.paths {
            assert!((path.cumulative_return + 0.4).abs() < 1e-12);
        }
    }

    #[test]
    fn test_worst_case_skipped_without_losses() {
        let sim = simulator(SimulationParams {
            num_simulations: 3,
            simulation_length: 3,
            random_seed: Some(5),
            worst_case: Some(WorstCaseConfig::default()),
            ..Default::default()
        });
        let Ok(result) = sim.run_pool(&[0.01, 0.02]) else {
            panic!("simulation should run");
        };
        assert!(result.worst_case_value.is_none());
    }

    #[test]
    fn test_store_paths_false_drops_curves() {
        let sim = simulator(SimulationParams {
            num_simulations: 20,
            simulation_length: 10,
            random_seed: Some(9),
            store_paths: false,
            ..Default::default()
        });
        let Ok(result) = sim.run_pool(&[0.01, -0.02, 0.03]) else {
            panic!("simulation should run");
        };
        assert!(result.paths.iter().all(|p| p.equity_curve.is_empty()));
        assert_eq!(result.percentile_bands.len(), 11);
    }

    #[test]
    fn test_percentile_bands_are_ordered() {
        let sim = simulator(SimulationParams {
            num_simulations: 200,
            simulation_length: 20,
            random_seed: Some(21),
            ..Default::default()
        });
        let Ok(result) = sim.run(&sample_trades()) else {
            panic!("simulation should run");
        };
        for band in &result.percentile_bands {
            assert!(band.p5 <= band.p25);
            assert!(band.p25 <= band.p50);
            assert!(band.p50 <= band.p75);
            assert!(band.p75 <= band.p95);
        }
        assert_eq!(result.percentile_bands[0].p50, 100_000.0);
    }

    #[test]
    fn test_daily_unit_groups_same_day_trades() {
        let Some(date) = NaiveDate::from_ymd_opt(2024, 6, 3) else {
            panic!("invalid test date");
        };
        let trades = vec![Trade::new(date, dec!(100)), Trade::new(date, dec!(-40))];
        let sim = simulator(SimulationParams {
            resample_method: ResampleMethod::Dollar,
            resample_unit: ResampleUnit::Daily,
            ..Default::default()
        });
        assert_eq!(sim.build_pool(&trades), vec![60.0]);
    }

    #[test]
    fn test_builder() {
        let sim = MonteCarloBuilder::new()
            .simulations(50)
            .length(20)
            .method(ResampleMethod::Dollar)
            .seed(99)
            .initial_capital(50_000.0)
            .build();

        let Ok(sim) = sim else {
            panic!("builder params should be valid");
        };
        let Ok(result) = sim.run(&sample_trades()) else {
            panic!("simulation should run");
        };
        assert_eq!(result.paths.len(), 50);
        assert_eq!(result.params.resample_method, ResampleMethod::Dollar);
    }

    #[test]
    fn test_path_seeds_are_distinct() {
        assert_ne!(path_seed(42, 0), path_seed(42, 1));
        assert_eq!(path_seed(42, 7), path_seed(42, 7));
    }
}
