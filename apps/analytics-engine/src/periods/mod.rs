//! Calendar period analysis.
//!
//! Yearly, quarterly and monthly breakdowns keyed by open date, losing-month
//! runs, and least-squares trends of period metrics. Trends report slope,
//! fit quality and significance only; they carry no interpretation.

mod engine;
mod segment;
mod streaks;
mod trend;

pub use engine::{
    PeriodAnalysis, PeriodAnalyzer, PeriodConfig, PeriodTrends, TREND_METRICS, fit_all,
};
pub use segment::{PeriodKind, PeriodStats, segment};
pub use streaks::{LosingMonthStreaks, LosingStreak, losing_month_streaks};
pub use trend::{LinearTrend, MIN_TREND_POINTS, MetricTrend, fit_trend};
