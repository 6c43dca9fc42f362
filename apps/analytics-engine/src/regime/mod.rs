//! Regime comparison.
//!
//! Runs the same Monte Carlo projection on the full trade history and on a
//! recent window, then scores how far the recent projection diverges. Both
//! runs share parameters and seed, so any difference comes from the pools.

mod config;
mod divergence;
mod engine;

pub use config::{
    AUTO_RECENT_FRACTION, MIN_AUTO_RECENT_TRADES, RecentWindow, RegimeConfig, ReturnBasisDecision,
};
pub use divergence::{
    DRAWDOWN_FLOOR, Divergence, EXPECTED_RETURN_FLOOR, MetricDivergence, POP_SCALE, RegimeMetric,
    SCORE_CLIP, SHARPE_FLOOR, divergence,
};
pub use engine::{RegimeAnalyzer, RegimeComparison, RegimeRun};
