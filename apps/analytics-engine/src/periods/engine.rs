//! Period analysis orchestration.

use serde::{Deserialize, Serialize};
use tracing::info;

use super::segment::{PeriodKind, PeriodStats, segment};
use super::streaks::{LosingMonthStreaks, losing_month_streaks};
use super::trend::MetricTrend;
use crate::config::{FieldValidator, ValidationError};
use crate::error::AnalyticsError;
use crate::metrics::{MetricKind, MetricsCalculator, MetricsSettings};
use crate::trade::{Trade, prepare_history};

/// Metrics fitted for trend across periods.
pub const TREND_METRICS: [MetricKind; 8] = [
    MetricKind::WinRate,
    MetricKind::ProfitFactor,
    MetricKind::KellyPct,
    MetricKind::Sharpe,
    MetricKind::AvgReturnPct,
    MetricKind::NetPl,
    MetricKind::AvgWin,
    MetricKind::AvgLoss,
];

/// Configuration for period analysis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PeriodConfig {
    /// Starting equity; estimated from the trades when absent.
    pub initial_capital: Option<f64>,
    /// Metric annualization settings.
    pub metrics: MetricsSettings,
}

impl PeriodConfig {
    /// Validate every field.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut v = FieldValidator::new();
        if let Some(capital) = self.initial_capital {
            v.positive("initial_capital", capital);
        }
        v.nested("metrics", self.metrics.validate());
        v.finish()
    }
}

/// Trends per granularity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PeriodTrends {
    /// Across years.
    pub yearly: Vec<MetricTrend>,
    /// Across quarters.
    pub quarterly: Vec<MetricTrend>,
    /// Across months.
    pub monthly: Vec<MetricTrend>,
}

/// Complete period breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodAnalysis {
    /// Starting equity used for return bases.
    pub initial_capital: f64,
    /// Yearly stats.
    pub yearly: Vec<PeriodStats>,
    /// Quarterly stats.
    pub quarterly: Vec<PeriodStats>,
    /// Monthly stats.
    pub monthly: Vec<PeriodStats>,
    /// Losing-month runs.
    pub losing_streaks: LosingMonthStreaks,
    /// Metric trends.
    pub trends: PeriodTrends,
}

/// Segments a history into calendar periods and fits trends.
#[derive(Debug, Clone)]
pub struct PeriodAnalyzer {
    config: PeriodConfig,
}

impl PeriodAnalyzer {
    /// Create an analyzer, rejecting invalid configuration.
    pub fn new(config: PeriodConfig) -> Result<Self, AnalyticsError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Run the analysis over an unordered trade collection.
    pub fn analyze(&self, trades: &[Trade]) -> Result<PeriodAnalysis, AnalyticsError> {
        let history = prepare_history(trades, self.config.initial_capital)?;
        if history.outcomes.is_empty() {
            return Err(AnalyticsError::insufficient("periods", "no trades"));
        }

        let calculator = MetricsCalculator::new(self.config.metrics);
        let yearly = segment(&history.outcomes, PeriodKind::Year, &calculator);
        let quarterly = segment(&history.outcomes, PeriodKind::Quarter, &calculator);
        let monthly = segment(&history.outcomes, PeriodKind::Month, &calculator);

        let trends = PeriodTrends {
            yearly: fit_all(&yearly),
            quarterly: fit_all(&quarterly),
            monthly: fit_all(&monthly),
        };

        info!(
            trades = history.outcomes.len(),
            years = yearly.len(),
            quarters = quarterly.len(),
            months = monthly.len(),
            "Period analysis complete"
        );

        Ok(PeriodAnalysis {
            initial_capital: history.initial_capital,
            losing_streaks: losing_month_streaks(&monthly),
            yearly,
            quarterly,
            monthly,
            trends,
        })
    }
}

/// Fit every tracked metric over a period series.
#[must_use]
pub fn fit_all(periods: &[PeriodStats]) -> Vec<MetricTrend> {
    TREND_METRICS
        .iter()
        .map(|metric| {
            let values: Vec<Option<f64>> = periods.iter().map(|p| p.value(*metric)).collect();
            MetricTrend::fit(*metric, &values)
        })
        .collect()
}
