//! Rolling-window metrics.
//!
//! A metric series over a sliding trade window, quarter-of-year averages of
//! that series, and a comparison of the latest window against all earlier
//! trades with structural threshold flags.

mod engine;
mod flags;
mod seasonal;
mod types;

pub use engine::RollingAnalyzer;
pub use flags::{
    COMPARISON_METRICS, KELLY_THRESHOLD, PAYOFF_THRESHOLD, PROFIT_FACTOR_THRESHOLD,
    WIN_RATE_THRESHOLD, compare, metric_delta, structural_flags,
};
pub use seasonal::seasonal_averages;
pub use types::{
    AUTO_WINDOW_FRACTION, MAX_AUTO_WINDOW, MIN_AUTO_WINDOW, MetricDelta, RecentComparison,
    RollingAnalysis, RollingConfig, RollingPoint, SeasonalAverage, StructuralFlag,
};
