//! Recent-versus-historical comparison and structural flags.

use super::types::{MetricDelta, RecentComparison, StructuralFlag};
use crate::metrics::math::safe_ratio;
use crate::metrics::{HUNDRED, MetricKind, TOLERANCE, TradeMetrics};

/// Metrics compared between the recent window and history.
pub const COMPARISON_METRICS: [MetricKind; 10] = [
    MetricKind::WinRate,
    MetricKind::ProfitFactor,
    MetricKind::PayoffRatio,
    MetricKind::KellyPct,
    MetricKind::Sharpe,
    MetricKind::AvgReturnPct,
    MetricKind::Expectancy,
    MetricKind::AvgWin,
    MetricKind::AvgLoss,
    MetricKind::Volatility,
];

/// Payoff ratio below this means average losses outweigh average wins.
pub const PAYOFF_THRESHOLD: f64 = 1.0;
/// Win rate below this means most trades lose.
pub const WIN_RATE_THRESHOLD: f64 = 0.5;
/// Profit factor below this means gross losses exceed gross profits.
pub const PROFIT_FACTOR_THRESHOLD: f64 = 1.0;
/// Kelly percentage below this means no positive edge.
pub const KELLY_THRESHOLD: f64 = 0.0;

/// Change from `historical` to `recent`.
#[must_use]
pub fn metric_delta(metric: MetricKind, historical: Option<f64>, recent: Option<f64>) -> MetricDelta {
    let delta = historical.zip(recent).map(|(h, r)| r - h);
    let percent_change = historical
        .zip(delta)
        .and_then(|(h, d)| safe_ratio(d, h.abs(), TOLERANCE))
        .map(|ratio| ratio * HUNDRED);

    MetricDelta {
        metric,
        historical,
        recent,
        delta,
        percent_change,
    }
}

/// Compare recent metrics against historical ones.
#[must_use]
pub fn compare(
    recent: TradeMetrics,
    historical: TradeMetrics,
) -> RecentComparison {
    let deltas = COMPARISON_METRICS
        .iter()
        .map(|metric| metric_delta(*metric, metric.value_of(&historical), metric.value_of(&recent)))
        .collect();

    RecentComparison {
        recent_trades: recent.trade_count,
        historical_trades: historical.trade_count,
        recent,
        historical,
        deltas,
    }
}

/// Flags for thresholds crossed from the safe side.
#[must_use]
pub fn structural_flags(comparison: &RecentComparison) -> Vec<StructuralFlag> {
    let recent = &comparison.recent;
    let historical = &comparison.historical;

    // Wins without losses leave ratio metrics undefined but on the safe side
    let flag = |metric: MetricKind, threshold: f64| StructuralFlag {
        metric,
        threshold,
        historical_value: metric.value_of(historical),
        recent_value: metric.value_of(recent),
        crossed: recent.meets_minimum(metric, threshold) == Some(false)
            && historical.meets_minimum(metric, threshold) == Some(true),
    };

    vec![
        flag(MetricKind::PayoffRatio, PAYOFF_THRESHOLD),
        flag(MetricKind::WinRate, WIN_RATE_THRESHOLD),
        flag(MetricKind::ProfitFactor, PROFIT_FACTOR_THRESHOLD),
        flag(MetricKind::KellyPct, KELLY_THRESHOLD),
    ]
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    fn metrics(win_rate: f64, payoff: f64, gross_profit: f64, gross_loss: f64) -> TradeMetrics {
        TradeMetrics {
            trade_count: 20,
            win_rate: Some(win_rate),
            payoff_ratio: Some(payoff),
            gross_profit,
            gross_loss,
            profit_factor: safe_ratio(gross_profit, gross_loss, TOLERANCE),
            kelly_pct: Some((win_rate - (1.0 - win_rate) / payoff) * 100.0),
            ..Default::default()
        }
    }

    fn crossed(flags: &[StructuralFlag], metric: MetricKind) -> bool {
        flags.iter().any(|f| f.metric == metric && f.crossed)
    }

    #[test_case(0.45, 0.40, false ; "already below stays unflagged")]
    #[test_case(0.55, 0.48, true ; "crossing fires")]
    #[test_case(0.55, 0.50, false ; "exactly at threshold does not fire")]
    #[test_case(0.48, 0.55, false ; "improvement does not fire")]
    fn test_win_rate_flag(historical: f64, recent: f64, expected: bool) {
        let comparison = compare(
            metrics(recent, 1.5, 300.0, 200.0),
            metrics(historical, 1.5, 300.0, 200.0),
        );
        assert_eq!(
            crossed(&structural_flags(&comparison), MetricKind::WinRate),
            expected
        );
    }

    #[test]
    fn test_payoff_and_profit_factor_flags() {
        let comparison = compare(
            metrics(0.5, 0.8, 100.0, 150.0),
            metrics(0.5, 1.2, 200.0, 100.0),
        );
        let flags = structural_flags(&comparison);
        assert!(crossed(&flags, MetricKind::PayoffRatio));
        assert!(crossed(&flags, MetricKind::ProfitFactor));
        assert!(crossed(&flags, MetricKind::KellyPct));
    }

    #[test]
    fn test_no_loss_history_counts_as_safe() {
        let comparison = compare(
            metrics(0.5, 1.0, 100.0, 150.0),
            metrics(1.0, 1.0, 100.0, 0.0),
        );
        assert!(crossed(&structural_flags(&comparison), MetricKind::ProfitFactor));
    }

    #[test]
    fn test_no_loss_history_flags_payoff_and_kelly() {
        let historical = TradeMetrics {
            trade_count: 20,
            winning_trades: 20,
            win_rate: Some(1.0),
            gross_profit: 2000.0,
            ..Default::default()
        };
        let comparison = compare(metrics(0.5, 0.25, 250.0, 1000.0), historical);
        let flags = structural_flags(&comparison);

        assert!(crossed(&flags, MetricKind::PayoffRatio));
        assert!(crossed(&flags, MetricKind::KellyPct));
        assert!(crossed(&flags, MetricKind::ProfitFactor));
        let Some(payoff) = flags.iter().find(|f| f.metric == MetricKind::PayoffRatio) else {
            panic!("payoff flag should exist");
        };
        assert!(payoff.historical_value.is_none());
    }

    #[test]
    fn test_undefined_without_trades_never_fires() {
        let comparison = compare(metrics(0.5, 0.25, 250.0, 1000.0), TradeMetrics::default());
        let flags = structural_flags(&comparison);
        assert!(flags.iter().all(|f| !f.crossed));
    }

    #[test]
    fn test_percent_change() {
        let delta = metric_delta(MetricKind::Sharpe, Some(-2.0), Some(-1.0));
        assert_eq!(delta.delta, Some(1.0));
        assert_eq!(delta.percent_change, Some(50.0));

        let undefined = metric_delta(MetricKind::Sharpe, Some(0.0), Some(1.0));
        assert!(undefined.percent_change.is_none());
        assert_eq!(metric_delta(MetricKind::Sharpe, None, Some(1.0)).delta, None);
    }
}
