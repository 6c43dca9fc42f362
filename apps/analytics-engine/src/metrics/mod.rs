//! Trade performance metrics.
//!
//! Computes, for any slice of trade outcomes:
//! - Trade statistics: win rate, average win/loss, payoff ratio, profit factor, expectancy
//! - Kelly criterion percentage
//! - Risk-adjusted returns: Sharpe, Sortino, Calmar (daily returns, annualized)
//! - Maximum drawdown and win/loss streaks
//!
//! Ratios that cannot be computed (no losses, a single day of returns, zero
//! variance) are `None`, never zero or infinity.

mod calculator;
mod constants;
pub mod math;
mod types;

pub use calculator::MetricsCalculator;
pub use constants::{DAYS_PER_YEAR, HUNDRED, TOLERANCE, TRADING_DAYS_PER_YEAR};
pub use types::{MetricKind, MetricType, MetricsSettings, TradeMetrics};
