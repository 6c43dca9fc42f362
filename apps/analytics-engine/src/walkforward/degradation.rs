//! In-sample versus out-of-sample degradation without optimization.
//!
//! Uses the same rolling windows and sufficiency rules as the optimizer, but
//! measures a fixed metric set on each slice as traded.

use serde::{Deserialize, Serialize};
use tracing::info;

use super::analysis::efficiency;
use super::types::{EfficiencyEpsilons, WindowBounds, WindowConfig};
use super::windows::{generate_windows, slice_window};
use crate::config::{FieldValidator, ValidationError};
use crate::error::AnalyticsError;
use crate::metrics::math::mean;
use crate::metrics::{MetricKind, MetricsCalculator, MetricsSettings};
use crate::periods::{LinearTrend, fit_trend};
use crate::trade::{Trade, normalize_per_contract, prepare_history};

/// Metrics compared between in-sample and out-of-sample slices.
pub const DEGRADATION_METRICS: [MetricKind; 7] = [
    MetricKind::WinRate,
    MetricKind::ProfitFactor,
    MetricKind::Sharpe,
    MetricKind::Sortino,
    MetricKind::KellyPct,
    MetricKind::Expectancy,
    MetricKind::AvgReturnPct,
];

/// Configuration for degradation analysis.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DegradationConfig {
    /// Window geometry.
    #[serde(flatten)]
    pub window: WindowConfig,
    /// Efficiency guards.
    pub epsilons: EfficiencyEpsilons,
    /// Divide P/L by contract count before measuring.
    pub normalize_per_contract: bool,
    /// Starting equity; estimated from the trades when absent.
    pub initial_capital: Option<f64>,
    /// Metric annualization settings.
    pub metrics: MetricsSettings,
}

impl DegradationConfig {
    /// Validate every field.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut v = FieldValidator::new();
        self.window.validate(&mut v);
        self.epsilons.validate(&mut v);
        v.nested("metrics", self.metrics.validate());
        if let Some(capital) = self.initial_capital {
            v.positive("initial_capital", capital);
        }
        v.finish()
    }
}

/// One metric on one window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricWindowValue {
    /// Metric.
    pub metric: MetricKind,
    /// In-sample value.
    pub in_sample: Option<f64>,
    /// Out-of-sample value.
    pub out_of_sample: Option<f64>,
    /// OOS / IS with the standard guards.
    pub efficiency: Option<f64>,
}

/// One degradation window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DegradationWindow {
    /// Date bounds.
    #[serde(flatten)]
    pub bounds: WindowBounds,
    /// Trades in the in-sample range.
    pub in_sample_trades: usize,
    /// Trades in the out-of-sample range.
    pub out_of_sample_trades: usize,
    /// Whether both ranges met the minimum trade counts.
    pub sufficient: bool,
    /// Per-metric values (empty when insufficient).
    pub values: Vec<MetricWindowValue>,
}

/// Aggregate of one metric across sufficient windows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricDegradation {
    /// Metric.
    pub metric: MetricKind,
    /// Mean in-sample value.
    pub avg_in_sample: Option<f64>,
    /// Mean out-of-sample value.
    pub avg_out_of_sample: Option<f64>,
    /// Mean efficiency.
    pub avg_efficiency: Option<f64>,
    /// Windows with a computable efficiency.
    pub efficiency_windows: usize,
    /// Trend of efficiency across windows.
    pub efficiency_trend: Option<LinearTrend>,
}

/// Degradation result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DegradationResult {
    /// Configuration used.
    pub config: DegradationConfig,
    /// Starting equity used for return bases.
    pub initial_capital: f64,
    /// All windows.
    pub windows: Vec<DegradationWindow>,
    /// Windows meeting the trade minimums.
    pub sufficient_windows: usize,
    /// Per-metric aggregates in [`DEGRADATION_METRICS`] order.
    pub metrics: Vec<MetricDegradation>,
}

impl DegradationResult {
    /// Aggregate for one metric.
    #[must_use]
    pub fn metric(&self, metric: MetricKind) -> Option<&MetricDegradation> {
        self.metrics.iter().find(|m| m.metric == metric)
    }

    /// Mean of the per-metric average efficiencies that are defined.
    #[must_use]
    pub fn overall_efficiency(&self) -> Option<f64> {
        let defined: Vec<f64> = self.metrics.iter().filter_map(|m| m.avg_efficiency).collect();
        mean(&defined)
    }
}

/// Measures how metrics degrade from in-sample to out-of-sample.
#[derive(Debug, Clone)]
pub struct DegradationAnalyzer {
    config: DegradationConfig,
}

impl DegradationAnalyzer {
    /// Create an analyzer, rejecting invalid configuration.
    pub fn new(config: DegradationConfig) -> Result<Self, AnalyticsError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Run the analysis over an unordered trade collection.
    pub fn analyze(&self, trades: &[Trade]) -> Result<DegradationResult, AnalyticsError> {
        let input = if self.config.normalize_per_contract {
            normalize_per_contract(trades)
        } else {
            trades.to_vec()
        };
        let history = prepare_history(&input, self.config.initial_capital)?;
        let (Some(first), Some(last)) = (history.outcomes.first(), history.outcomes.last()) else {
            return Err(AnalyticsError::insufficient("degradation", "no trades"));
        };

        let calculator = MetricsCalculator::new(self.config.metrics);
        let bounds = generate_windows(first.date, last.date, &self.config.window);

        let windows: Vec<DegradationWindow> = bounds
            .iter()
            .map(|window_bounds| {
                let slices = slice_window(&history.outcomes, window_bounds);
                let sufficient = slices.is_sufficient(&self.config.window);
                let values = if sufficient {
                    let is_metrics = calculator.calculate(&slices.in_sample);
                    let oos_metrics = calculator.calculate(&slices.out_of_sample);
                    DEGRADATION_METRICS
                        .iter()
                        .map(|metric| {
                            let in_sample = metric.value_of(&is_metrics);
                            let out_of_sample = metric.value_of(&oos_metrics);
                            MetricWindowValue {
                                metric: *metric,
                                in_sample,
                                out_of_sample,
                                efficiency: efficiency(
                                    in_sample,
                                    out_of_sample,
                                    *metric,
                                    self.config.epsilons.for_metric(*metric),
                                ),
                            }
                        })
                        .collect()
                } else {
                    Vec::new()
                };

                DegradationWindow {
                    bounds: *window_bounds,
                    in_sample_trades: slices.in_sample.len(),
                    out_of_sample_trades: slices.out_of_sample.len(),
                    sufficient,
                    values,
                }
            })
            .collect();

        let metrics = DEGRADATION_METRICS
            .iter()
            .map(|metric| aggregate_metric(*metric, &windows))
            .collect();
        let sufficient_windows = windows.iter().filter(|w| w.sufficient).count();

        info!(
            windows = windows.len(),
            sufficient = sufficient_windows,
            normalized = self.config.normalize_per_contract,
            "Degradation analysis complete"
        );

        Ok(DegradationResult {
            config: self.config.clone(),
            initial_capital: history.initial_capital,
            windows,
            sufficient_windows,
            metrics,
        })
    }
}

fn aggregate_metric(metric: MetricKind, windows: &[DegradationWindow]) -> MetricDegradation {
    let values: Vec<&MetricWindowValue> = windows
        .iter()
        .filter(|w| w.sufficient)
        .filter_map(|w| w.values.iter().find(|v| v.metric == metric))
        .collect();

    let in_sample: Vec<f64> = values.iter().filter_map(|v| v.in_sample).collect();
    let out_of_sample: Vec<f64> = values.iter().filter_map(|v| v.out_of_sample).collect();
    let efficiencies: Vec<Option<f64>> = values.iter().map(|v| v.efficiency).collect();
    let defined: Vec<f64> = efficiencies.iter().flatten().copied().collect();

    MetricDegradation {
        metric,
        avg_in_sample: mean(&in_sample),
        avg_out_of_sample: mean(&out_of_sample),
        avg_efficiency: mean(&defined),
        efficiency_windows: defined.len(),
        efficiency_trend: fit_trend(&efficiencies),
    }
}
