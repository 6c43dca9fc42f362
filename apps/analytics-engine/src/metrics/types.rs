//! Type definitions for trade metrics.

use serde::{Deserialize, Serialize};

use super::constants::TRADING_DAYS_PER_YEAR;
use crate::config::{FieldValidator, ValidationError};

/// Settings shared by every metric calculation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsSettings {
    /// Annual risk-free rate subtracted in Sharpe/Sortino (0.02 = 2%).
    pub risk_free_rate: f64,
    /// Trading days per year used for annualization.
    pub trading_days_per_year: u32,
}

impl Default for MetricsSettings {
    fn default() -> Self {
        Self {
            risk_free_rate: 0.0,
            trading_days_per_year: TRADING_DAYS_PER_YEAR,
        }
    }
}

impl MetricsSettings {
    /// Validate ranges.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut v = FieldValidator::new();
        v.in_range_f64("risk_free_rate", self.risk_free_rate, 0.0, 1.0)
            .in_range_usize(
                "trading_days_per_year",
                self.trading_days_per_year as usize,
                1,
                366,
            );
        v.finish()
    }
}

/// Whether a metric is scale-invariant (rate) or in currency units (dollar).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricType {
    /// Ratio, rate or percentage comparable across strategies.
    Rate,
    /// Currency-denominated or count-based.
    Dollar,
}

/// Metrics that engines can compute, optimize, or compare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    /// Net P/L.
    NetPl,
    /// Share of winning trades.
    WinRate,
    /// Gross profit over gross loss.
    ProfitFactor,
    /// Annualized Sharpe ratio of daily returns.
    Sharpe,
    /// Annualized Sortino ratio of daily returns.
    Sortino,
    /// Annualized return over max drawdown.
    Calmar,
    /// Kelly criterion percentage.
    KellyPct,
    /// Mean return per trade as percent of equity.
    AvgReturnPct,
    /// Mean P/L per trade.
    Expectancy,
    /// Mean winning trade.
    AvgWin,
    /// Mean losing trade (magnitude).
    AvgLoss,
    /// Average win over average loss.
    PayoffRatio,
    /// Number of trades.
    TradeCount,
    /// Maximum peak-to-trough equity decline (fraction).
    MaxDrawdown,
    /// Standard deviation of per-trade returns (percent).
    Volatility,
}

impl MetricKind {
    /// Stable identifier used in observations and serialized output.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::NetPl => "net_pl",
            Self::WinRate => "win_rate",
            Self::ProfitFactor => "profit_factor",
            Self::Sharpe => "sharpe",
            Self::Sortino => "sortino",
            Self::Calmar => "calmar",
            Self::KellyPct => "kelly_pct",
            Self::AvgReturnPct => "avg_return_pct",
            Self::Expectancy => "expectancy",
            Self::AvgWin => "avg_win",
            Self::AvgLoss => "avg_loss",
            Self::PayoffRatio => "payoff_ratio",
            Self::TradeCount => "trade_count",
            Self::MaxDrawdown => "max_drawdown",
            Self::Volatility => "volatility",
        }
    }

    /// Ratio metrics whose negative values make an efficiency quotient meaningless.
    #[must_use]
    pub const fn is_ratio(&self) -> bool {
        matches!(
            self,
            Self::Sharpe | Self::Sortino | Self::Calmar | Self::ProfitFactor | Self::KellyPct
        )
    }

    /// Rate-type or dollar-type classification.
    #[must_use]
    pub const fn metric_type(&self) -> MetricType {
        match self {
            Self::NetPl | Self::Expectancy | Self::AvgWin | Self::AvgLoss | Self::TradeCount => {
                MetricType::Dollar
            }
            _ => MetricType::Rate,
        }
    }

    /// Whether a larger value is worse (drawdown-type).
    #[must_use]
    pub const fn lower_is_better(&self) -> bool {
        matches!(self, Self::MaxDrawdown | Self::AvgLoss | Self::Volatility)
    }

    /// Read this metric from computed trade metrics.
    #[must_use]
    pub fn value_of(&self, metrics: &TradeMetrics) -> Option<f64> {
        match self {
            Self::NetPl => Some(metrics.net_pl),
            Self::WinRate => metrics.win_rate,
            Self::ProfitFactor => metrics.profit_factor,
            Self::Sharpe => metrics.sharpe,
            Self::Sortino => metrics.sortino,
            Self::Calmar => metrics.calmar,
            Self::KellyPct => metrics.kelly_pct,
            Self::AvgReturnPct => metrics.avg_return_pct,
            Self::Expectancy => metrics.expectancy,
            Self::AvgWin => metrics.avg_win,
            Self::AvgLoss => metrics.avg_loss,
            Self::PayoffRatio => metrics.payoff_ratio,
            Self::TradeCount => Some(metrics.trade_count as f64),
            Self::MaxDrawdown => metrics.max_drawdown,
            Self::Volatility => metrics.volatility,
        }
    }
}

impl std::fmt::Display for MetricKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Metrics over a slice of trade outcomes.
///
/// `None` means not computable for this slice, never zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct TradeMetrics {
    /// Number of trades.
    pub trade_count: usize,
    /// Trades with positive P/L.
    pub winning_trades: usize,
    /// Trades with negative P/L.
    pub losing_trades: usize,
    /// Sum of P/L.
    pub net_pl: f64,
    /// Sum of winning P/L.
    pub gross_profit: f64,
    /// Sum of losing P/L (positive magnitude).
    pub gross_loss: f64,
    /// Winning trades over all trades.
    pub win_rate: Option<f64>,
    /// Mean winning P/L.
    pub avg_win: Option<f64>,
    /// Mean losing P/L (positive magnitude).
    pub avg_loss: Option<f64>,
    /// Average win over average loss.
    pub payoff_ratio: Option<f64>,
    /// Gross profit over gross loss.
    pub profit_factor: Option<f64>,
    /// Mean P/L per trade.
    pub expectancy: Option<f64>,
    /// Kelly percentage: `(W − (1 − W) / R) × 100`.
    pub kelly_pct: Option<f64>,
    /// Annualized Sharpe of daily returns.
    pub sharpe: Option<f64>,
    /// Annualized Sortino of daily returns.
    pub sortino: Option<f64>,
    /// Annualized return over max drawdown.
    pub calmar: Option<f64>,
    /// Mean per-trade return as percent of prior equity.
    pub avg_return_pct: Option<f64>,
    /// Standard deviation of per-trade returns, in percent.
    pub volatility: Option<f64>,
    /// Maximum drawdown as a fraction of peak equity.
    pub max_drawdown: Option<f64>,
    /// Longest run of winning trades.
    pub max_consecutive_wins: usize,
    /// Longest run of losing trades.
    pub max_consecutive_losses: usize,
}

impl TradeMetrics {
    /// Profit factor treating "no losses but some profit" as above any threshold.
    ///
    /// Used for threshold tests where `None` alone is ambiguous.
    #[must_use]
    pub fn profit_factor_at_least(&self, threshold: f64) -> Option<bool> {
        match self.profit_factor {
            Some(pf) => Some(pf >= threshold),
            None if self.gross_profit > 0.0 => Some(true),
            None => None,
        }
    }

    /// Whether a metric meets a minimum.
    ///
    /// Profit factor, payoff ratio and Kelly are undefined without losses; a
    /// slice with wins and no losses meets any minimum on them.
    #[must_use]
    pub fn meets_minimum(&self, metric: MetricKind, threshold: f64) -> Option<bool> {
        match metric {
            MetricKind::ProfitFactor => self.profit_factor_at_least(threshold),
            MetricKind::PayoffRatio | MetricKind::KellyPct => match metric.value_of(self) {
                Some(value) => Some(value >= threshold),
                None if self.winning_trades > 0 && self.losing_trades == 0 => Some(true),
                None => None,
            },
            _ => metric.value_of(self).map(|value| value >= threshold),
        }
    }
}
