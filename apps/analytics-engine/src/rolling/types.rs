//! Rolling analysis types.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::{FieldValidator, ValidationError};
use crate::metrics::{MetricKind, MetricsSettings, TradeMetrics};

/// Smallest automatic window.
pub const MIN_AUTO_WINDOW: usize = 10;
/// Largest automatic window.
pub const MAX_AUTO_WINDOW: usize = 100;
/// Share of the history used for the automatic window.
pub const AUTO_WINDOW_FRACTION: f64 = 0.2;

/// Configuration for rolling analysis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RollingConfig {
    /// Trades per window; automatic when absent.
    pub window: Option<usize>,
    /// Starting equity; estimated from the trades when absent.
    pub initial_capital: Option<f64>,
    /// Metric annualization settings.
    pub metrics: MetricsSettings,
}

impl RollingConfig {
    /// Validate every field.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut v = FieldValidator::new();
        if let Some(window) = self.window {
            v.at_least("window", window, 2);
        }
        if let Some(capital) = self.initial_capital {
            v.positive("initial_capital", capital);
        }
        v.nested("metrics", self.metrics.validate());
        v.finish()
    }

    /// Window for a history of `n` trades.
    ///
    /// Automatic: 20% of `n` rounded, clamped to [10, 100] and to `n`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn resolve_window(&self, n: usize) -> usize {
        self.window.unwrap_or_else(|| {
            let auto = (n as f64 * AUTO_WINDOW_FRACTION).round() as usize;
            auto.clamp(MIN_AUTO_WINDOW, MAX_AUTO_WINDOW).min(n)
        })
    }
}

/// Metrics of the window ending at one trade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollingPoint {
    /// Index of the last trade in the window.
    pub index: usize,
    /// Open date of the last trade in the window.
    pub date: NaiveDate,
    /// Win rate.
    pub win_rate: Option<f64>,
    /// Profit factor.
    pub profit_factor: Option<f64>,
    /// Annualized Sharpe.
    pub sharpe: Option<f64>,
    /// Kelly percentage.
    pub kelly_pct: Option<f64>,
    /// Mean winning trade.
    pub avg_win: Option<f64>,
    /// Mean losing trade (magnitude).
    pub avg_loss: Option<f64>,
    /// Mean return per trade (percent).
    pub avg_return_pct: Option<f64>,
    /// Net P/L.
    pub net_pl: f64,
    /// Standard deviation of per-trade returns (percent).
    pub volatility: Option<f64>,
}

impl RollingPoint {
    /// Build a point from window metrics.
    #[must_use]
    pub fn from_metrics(index: usize, date: NaiveDate, metrics: &TradeMetrics) -> Self {
        Self {
            index,
            date,
            win_rate: metrics.win_rate,
            profit_factor: metrics.profit_factor,
            sharpe: metrics.sharpe,
            kelly_pct: metrics.kelly_pct,
            avg_win: metrics.avg_win,
            avg_loss: metrics.avg_loss,
            avg_return_pct: metrics.avg_return_pct,
            net_pl: metrics.net_pl,
            volatility: metrics.volatility,
        }
    }
}

/// Mean of rolling points falling in one calendar quarter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonalAverage {
    /// Quarter (1..=4).
    pub quarter: u32,
    /// Points averaged.
    pub points: usize,
    /// Mean win rate.
    pub win_rate: Option<f64>,
    /// Mean profit factor.
    pub profit_factor: Option<f64>,
    /// Mean Sharpe.
    pub sharpe: Option<f64>,
    /// Mean Kelly percentage.
    pub kelly_pct: Option<f64>,
    /// Mean average return (percent).
    pub avg_return_pct: Option<f64>,
    /// Mean window net P/L.
    pub net_pl: Option<f64>,
}

/// Change of one metric from historical to recent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricDelta {
    /// Metric.
    pub metric: MetricKind,
    /// Historical value.
    pub historical: Option<f64>,
    /// Recent value.
    pub recent: Option<f64>,
    /// `recent − historical`.
    pub delta: Option<f64>,
    /// Delta over |historical|, in percent.
    pub percent_change: Option<f64>,
}

/// Recent window against everything before it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentComparison {
    /// Trades in the recent window.
    pub recent_trades: usize,
    /// Trades before it.
    pub historical_trades: usize,
    /// Recent metrics.
    pub recent: TradeMetrics,
    /// Historical metrics.
    pub historical: TradeMetrics,
    /// Per-metric changes.
    pub deltas: Vec<MetricDelta>,
}

impl RecentComparison {
    /// Change for one metric.
    #[must_use]
    pub fn delta(&self, metric: MetricKind) -> Option<&MetricDelta> {
        self.deltas.iter().find(|d| d.metric == metric)
    }
}

/// A threshold the recent window crossed from the safe side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuralFlag {
    /// Metric.
    pub metric: MetricKind,
    /// Threshold (strict).
    pub threshold: f64,
    /// Historical value.
    pub historical_value: Option<f64>,
    /// Recent value.
    pub recent_value: Option<f64>,
    /// Recent is strictly past the threshold and historical was not.
    pub crossed: bool,
}

/// Complete rolling analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollingAnalysis {
    /// Window used.
    pub window: usize,
    /// Trades analyzed.
    pub trade_count: usize,
    /// Starting equity used for return bases.
    pub initial_capital: f64,
    /// One point per trade from index `window − 1`.
    pub points: Vec<RollingPoint>,
    /// Quarter-of-year averages (Q1..Q4).
    pub seasonal: Vec<SeasonalAverage>,
    /// Recent versus historical (`None` without earlier trades).
    pub comparison: Option<RecentComparison>,
    /// Structural flags (empty without a comparison).
    pub flags: Vec<StructuralFlag>,
}
