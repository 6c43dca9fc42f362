//! Regime comparison configuration and return-basis resolution.

use chrono::Days;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{FieldValidator, ValidationError};
use crate::monte_carlo::SimulationParams;
use crate::trade::{MARGIN_COVERAGE_THRESHOLD, ReturnBasis, Trade, margin_coverage};

/// Share of the history used as the automatic recent window.
pub const AUTO_RECENT_FRACTION: f64 = 0.2;
/// Smallest automatic recent window, in trades.
pub const MIN_AUTO_RECENT_TRADES: usize = 20;

/// How the recent window is carved out of the history.
///
/// A window covering the whole history leaves nothing to compare against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RecentWindow {
    /// 20% of the trades, at least 20, always leaving one earlier trade.
    #[default]
    Auto,
    /// The last N trades.
    Trades(usize),
    /// Trades opened within N calendar days of the last trade date.
    Days(u64),
}

impl RecentWindow {
    /// Number of trailing trades in the recent window.
    ///
    /// `sorted_trades` must be chronological. The result may be zero.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn recent_count(&self, sorted_trades: &[Trade]) -> usize {
        let n = sorted_trades.len();
        match *self {
            Self::Auto => {
                let auto = (n as f64 * AUTO_RECENT_FRACTION).round() as usize;
                auto.max(MIN_AUTO_RECENT_TRADES).min(n.saturating_sub(1))
            }
            Self::Trades(count) => count.min(n),
            Self::Days(days) => {
                let Some(last) = sorted_trades.last().map(|t| t.date_opened) else {
                    return 0;
                };
                let Some(cutoff) = last.checked_sub_days(Days::new(days)) else {
                    return n;
                };
                sorted_trades
                    .iter()
                    .rev()
                    .take_while(|t| t.date_opened > cutoff)
                    .count()
            }
        }
    }
}

/// Which return basis a regime comparison resamples, and why.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReturnBasisDecision {
    /// Margin or capital.
    pub basis: ReturnBasis,
    /// Share of trades carrying a valid margin requirement.
    pub margin_coverage: Option<f64>,
    /// Whether the basis came from coverage detection rather than the caller.
    pub auto_detected: bool,
}

impl ReturnBasisDecision {
    /// Resolve the basis once for a trade collection.
    ///
    /// `use_margin = None` detects margin data at the coverage threshold.
    #[must_use]
    pub fn resolve(trades: &[Trade], use_margin: Option<bool>) -> Self {
        let coverage = margin_coverage(trades);
        let (margin, auto_detected) = match use_margin {
            Some(requested) => (requested, false),
            None => (
                coverage.is_some_and(|c| c >= MARGIN_COVERAGE_THRESHOLD),
                true,
            ),
        };
        let basis = if margin {
            ReturnBasis::Margin
        } else {
            ReturnBasis::Capital
        };

        debug!(?basis, ?coverage, auto_detected, "Resolved return basis");

        Self {
            basis,
            margin_coverage: coverage,
            auto_detected,
        }
    }
}

/// Configuration for a full-versus-recent regime comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RegimeConfig {
    /// Simulation parameters shared by both runs.
    pub simulation: SimulationParams,
    /// Recent window selection.
    pub recent_window: RecentWindow,
    /// Force (`true`) or forbid (`false`) margin returns; detect when absent.
    pub use_margin_returns: Option<bool>,
    /// Starting equity for the capital-return reconstruction.
    pub initial_capital: Option<f64>,
}

impl RegimeConfig {
    /// Validate every field.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut v = FieldValidator::new();
        v.nested("simulation", self.simulation.validate());
        v.check(
            self.simulation.precomputed_returns.is_none(),
            "simulation.precomputed_returns",
            "is derived from the trades and must not be supplied",
        );
        match self.recent_window {
            RecentWindow::Auto => {}
            RecentWindow::Trades(count) => {
                v.at_least("recent_window.trades", count, 1);
            }
            RecentWindow::Days(days) => {
                v.check(days >= 1, "recent_window.days", format!("must be >= 1 (got {days})"));
            }
        }
        if let Some(capital) = self.initial_capital {
            v.positive("initial_capital", capital);
        }
        v.finish()
    }
}
