//! Metric calculator over trade outcomes.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use super::constants::{DAYS_PER_YEAR, HUNDRED, TOLERANCE};
use super::math::{downside_deviation, finite, mean, safe_ratio, std_dev};
use super::types::{MetricsSettings, TradeMetrics};
use crate::trade::TradeOutcome;

/// Computes [`TradeMetrics`] for any slice of outcomes.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsCalculator {
    settings: MetricsSettings,
}

impl MetricsCalculator {
    /// Create a calculator with the given settings.
    #[must_use]
    pub const fn new(settings: MetricsSettings) -> Self {
        Self { settings }
    }

    /// Access the settings.
    #[must_use]
    pub const fn settings(&self) -> &MetricsSettings {
        &self.settings
    }

    /// Calculate all metrics for the outcomes (chronological order).
    #[must_use]
    pub fn calculate(&self, outcomes: &[TradeOutcome]) -> TradeMetrics {
        if outcomes.is_empty() {
            return TradeMetrics::default();
        }

        let mut metrics = TradeMetrics {
            trade_count: outcomes.len(),
            ..Default::default()
        };

        self.calculate_trade_stats(outcomes, &mut metrics);
        self.calculate_return_stats(outcomes, &mut metrics);
        self.calculate_drawdown_metrics(outcomes, &mut metrics);
        Self::calculate_streaks(outcomes, &mut metrics);

        metrics
    }

    fn calculate_trade_stats(&self, outcomes: &[TradeOutcome], metrics: &mut TradeMetrics) {
        for outcome in outcomes {
            metrics.net_pl += outcome.pl;
            if outcome.is_win() {
                metrics.winning_trades += 1;
                metrics.gross_profit += outcome.pl;
            } else if outcome.is_loss() {
                metrics.losing_trades += 1;
                metrics.gross_loss += outcome.pl.abs();
            }
        }

        let n = metrics.trade_count as f64;
        let win_rate = metrics.winning_trades as f64 / n;
        metrics.win_rate = Some(win_rate);
        metrics.expectancy = finite(metrics.net_pl / n);

        metrics.avg_win = (metrics.winning_trades > 0)
            .then(|| metrics.gross_profit / metrics.winning_trades as f64);
        metrics.avg_loss = (metrics.losing_trades > 0)
            .then(|| metrics.gross_loss / metrics.losing_trades as f64);

        metrics.payoff_ratio = match (metrics.avg_win, metrics.avg_loss) {
            (Some(win), Some(loss)) => safe_ratio(win, loss, TOLERANCE),
            _ => None,
        };
        metrics.profit_factor = safe_ratio(metrics.gross_profit, metrics.gross_loss, TOLERANCE);

        // Kelly: W - (1 - W) / R, undefined without both wins and losses
        metrics.kelly_pct = metrics
            .payoff_ratio
            .and_then(|payoff| finite((win_rate - (1.0 - win_rate) / payoff) * HUNDRED));
    }

    fn calculate_return_stats(&self, outcomes: &[TradeOutcome], metrics: &mut TradeMetrics) {
        let returns: Vec<f64> = outcomes.iter().filter_map(|o| o.capital_return).collect();
        metrics.avg_return_pct = mean(&returns).map(|r| r * HUNDRED);
        metrics.volatility = std_dev(&returns).map(|s| s * HUNDRED);

        let daily = daily_returns(outcomes);
        let trading_days = f64::from(self.settings.trading_days_per_year);
        let daily_rf = self.settings.risk_free_rate / trading_days;
        let annualizer = trading_days.sqrt();

        let Some(avg_daily) = mean(&daily) else {
            return;
        };
        let excess = avg_daily - daily_rf;

        metrics.sharpe = std_dev(&daily)
            .and_then(|std| safe_ratio(excess, std, TOLERANCE))
            .map(|ratio| ratio * annualizer);

        metrics.sortino = downside_deviation(&daily, daily_rf)
            .and_then(|dd| safe_ratio(excess, dd, TOLERANCE))
            .map(|ratio| ratio * annualizer);
    }

    fn calculate_drawdown_metrics(&self, outcomes: &[TradeOutcome], metrics: &mut TradeMetrics) {
        let base = outcomes[0].equity_before;
        let mut equity = base;
        let mut peak = base;
        let mut max_dd: Option<f64> = (base > 0.0).then_some(0.0);

        for outcome in outcomes {
            equity += outcome.pl;
            peak = peak.max(equity);
            if peak > 0.0 {
                let dd = ((peak - equity) / peak).max(0.0);
                max_dd = Some(max_dd.map_or(dd, |m| m.max(dd)));
            }
        }
        metrics.max_drawdown = max_dd;

        if base <= 0.0 {
            return;
        }
        let first = outcomes[0].date;
        let last = outcomes
            .iter()
            .map(|o| o.settled)
            .max()
            .unwrap_or(first);
        let days = (last - first).num_days() + 1;
        let years = days as f64 / DAYS_PER_YEAR;
        let annualized_return = metrics.net_pl / base / years;

        metrics.calmar = max_dd.and_then(|dd| safe_ratio(annualized_return, dd, TOLERANCE));
    }

    fn calculate_streaks(outcomes: &[TradeOutcome], metrics: &mut TradeMetrics) {
        let mut wins = 0usize;
        let mut losses = 0usize;

        for outcome in outcomes {
            if outcome.is_win() {
                wins += 1;
                losses = 0;
            } else if outcome.is_loss() {
                losses += 1;
                wins = 0;
            } else {
                wins = 0;
                losses = 0;
            }
            metrics.max_consecutive_wins = metrics.max_consecutive_wins.max(wins);
            metrics.max_consecutive_losses = metrics.max_consecutive_losses.max(losses);
        }
    }
}

/// Sum of capital-based returns per settlement date, in date order.
fn daily_returns(outcomes: &[TradeOutcome]) -> Vec<f64> {
    let mut by_day: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for outcome in outcomes {
        if let Some(ret) = outcome.capital_return {
            *by_day.entry(outcome.settled).or_insert(0.0) += ret;
        }
    }
    by_day.into_values().collect()
}
