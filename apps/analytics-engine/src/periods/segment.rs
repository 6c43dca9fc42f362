//! Calendar period segmentation.

use std::collections::BTreeMap;

use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::metrics::{MetricKind, MetricsCalculator};
use crate::trade::TradeOutcome;

/// Calendar granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodKind {
    /// Calendar year.
    Year,
    /// Calendar quarter.
    Quarter,
    /// Calendar month.
    Month,
}

/// Calendar key ordering periods chronologically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
struct PeriodKey {
    year: i32,
    sub: u32,
}

impl PeriodKind {
    fn key(self, date: NaiveDate) -> PeriodKey {
        let sub = match self {
            Self::Year => 0,
            Self::Quarter => date.month0() / 3 + 1,
            Self::Month => date.month(),
        };
        PeriodKey {
            year: date.year(),
            sub,
        }
    }

    fn label(self, key: PeriodKey) -> String {
        match self {
            Self::Year => format!("{}", key.year),
            Self::Quarter => format!("{}-Q{}", key.year, key.sub),
            Self::Month => format!("{}-{:02}", key.year, key.sub),
        }
    }

    /// First and last calendar day of the period containing `date`.
    #[must_use]
    pub fn bounds(self, date: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
        let year = date.year();
        let (start, months) = match self {
            Self::Year => (NaiveDate::from_ymd_opt(year, 1, 1)?, 12),
            Self::Quarter => (NaiveDate::from_ymd_opt(year, date.month0() / 3 * 3 + 1, 1)?, 3),
            Self::Month => (NaiveDate::from_ymd_opt(year, date.month(), 1)?, 1),
        };
        let end = start
            .checked_add_months(chrono::Months::new(months))?
            .checked_sub_days(Days::new(1))?;
        Some((start, end))
    }
}

/// Metrics for one calendar period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodStats {
    /// Granularity.
    pub kind: PeriodKind,
    /// `2024`, `2024-Q1` or `2024-03`.
    pub label: String,
    /// First calendar day.
    pub start: NaiveDate,
    /// Last calendar day.
    pub end: NaiveDate,
    /// Trades opened in the period.
    pub trade_count: usize,
    /// Win rate.
    pub win_rate: Option<f64>,
    /// Profit factor.
    pub profit_factor: Option<f64>,
    /// Kelly percentage.
    pub kelly_pct: Option<f64>,
    /// Annualized Sharpe.
    pub sharpe: Option<f64>,
    /// Mean return per trade as percent of prior equity.
    pub avg_return_pct: Option<f64>,
    /// Net P/L.
    pub net_pl: f64,
    /// Mean winning trade.
    pub avg_win: Option<f64>,
    /// Mean losing trade (magnitude).
    pub avg_loss: Option<f64>,
    /// Calendar days of the period inside the data span.
    pub days_covered: i64,
    /// Whether the data span misses part of the period.
    pub partial: bool,
}

impl PeriodStats {
    /// Read a metric tracked per period.
    #[must_use]
    pub fn value(&self, metric: MetricKind) -> Option<f64> {
        match metric {
            MetricKind::WinRate => self.win_rate,
            MetricKind::ProfitFactor => self.profit_factor,
            MetricKind::KellyPct => self.kelly_pct,
            MetricKind::Sharpe => self.sharpe,
            MetricKind::AvgReturnPct => self.avg_return_pct,
            MetricKind::NetPl => Some(self.net_pl),
            MetricKind::AvgWin => self.avg_win,
            MetricKind::AvgLoss => self.avg_loss,
            MetricKind::TradeCount => Some(self.trade_count as f64),
            _ => None,
        }
    }
}

/// Group outcomes by calendar period of their open date.
///
/// Only periods containing trades are returned, in chronological order.
/// Coverage is measured against the span from the first to the last trade.
#[must_use]
pub fn segment(
    outcomes: &[TradeOutcome],
    kind: PeriodKind,
    calculator: &MetricsCalculator,
) -> Vec<PeriodStats> {
    let (Some(span_start), Some(span_end)) = (
        outcomes.iter().map(|o| o.date).min(),
        outcomes.iter().map(|o| o.date).max(),
    ) else {
        return Vec::new();
    };

    let mut groups: BTreeMap<PeriodKey, Vec<TradeOutcome>> = BTreeMap::new();
    for outcome in outcomes {
        groups
            .entry(kind.key(outcome.date))
            .or_default()
            .push(outcome.clone());
    }

    groups
        .into_iter()
        .filter_map(|(key, group)| {
            let (start, end) = kind.bounds(group.first()?.date)?;
            let covered_start = start.max(span_start);
            let covered_end = end.min(span_end);
            let days_covered = (covered_end - covered_start).num_days() + 1;
            let period_days = (end - start).num_days() + 1;

            let metrics = calculator.calculate(&group);
            Some(PeriodStats {
                kind,
                label: kind.label(key),
                start,
                end,
                trade_count: group.len(),
                win_rate: metrics.win_rate,
                profit_factor: metrics.profit_factor,
                kelly_pct: metrics.kelly_pct,
                sharpe: metrics.sharpe,
                avg_return_pct: metrics.avg_return_pct,
                net_pl: metrics.net_pl,
                avg_win: metrics.avg_win,
                avg_loss: metrics.avg_loss,
                days_covered,
                partial: days_covered < period_days,
            })
        })
        .collect()
}
