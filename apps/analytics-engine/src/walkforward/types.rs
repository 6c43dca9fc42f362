//! Core types for walk-forward analysis.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::{FieldValidator, ValidationError};
use crate::metrics::{MetricKind, MetricsSettings};
use crate::parallel::{ParameterGrid, range_len};

/// Upper bound on parameter combinations per optimization.
pub const MAX_COMBINATIONS: usize = 20_000;
/// Upper bound on generated windows.
pub const MAX_WINDOWS: usize = 1_000;
/// Risk per trade assumed by `fixed_fraction_pct` (percent).
pub const BASELINE_RISK_PCT: f64 = 2.0;

/// Metric maximized during in-sample optimization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OptimizationTarget {
    /// Net P/L.
    NetPl,
    /// Profit factor.
    ProfitFactor,
    /// Sharpe ratio.
    #[default]
    Sharpe,
    /// Sortino ratio.
    Sortino,
    /// Calmar ratio.
    Calmar,
    /// Win rate.
    WinRate,
    /// Kelly percentage.
    KellyPct,
    /// Average return percent.
    AvgReturnPct,
    /// Expectancy.
    Expectancy,
}

impl OptimizationTarget {
    /// Metric this target reads.
    #[must_use]
    pub const fn metric(self) -> MetricKind {
        match self {
            Self::NetPl => MetricKind::NetPl,
            Self::ProfitFactor => MetricKind::ProfitFactor,
            Self::Sharpe => MetricKind::Sharpe,
            Self::Sortino => MetricKind::Sortino,
            Self::Calmar => MetricKind::Calmar,
            Self::WinRate => MetricKind::WinRate,
            Self::KellyPct => MetricKind::KellyPct,
            Self::AvgReturnPct => MetricKind::AvgReturnPct,
            Self::Expectancy => MetricKind::Expectancy,
        }
    }
}

/// How a named parameter acts on a combination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParameterKind {
    /// Scales every outcome by the value.
    KellyMultiplier,
    /// Scales every outcome by value / 2 (relative to 2% baseline risk).
    FixedFractionPct,
    /// Scales outcomes of one strategy label.
    StrategyWeight(String),
    /// Rejects combinations whose max drawdown (percent) exceeds the value.
    MaxDrawdownPct,
    /// Rejects combinations whose longest losing streak exceeds the value.
    ConsecutiveLossLimit,
}

impl ParameterKind {
    /// Parse a parameter name; `None` for unsupported names.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "kelly_multiplier" => Some(Self::KellyMultiplier),
            "fixed_fraction_pct" => Some(Self::FixedFractionPct),
            "max_drawdown_pct" => Some(Self::MaxDrawdownPct),
            "consecutive_loss_limit" => Some(Self::ConsecutiveLossLimit),
            _ => name
                .strip_prefix("strategy_weight:")
                .filter(|label| !label.is_empty())
                .map(|label| Self::StrategyWeight(label.to_string())),
        }
    }
}

/// An inclusive parameter sweep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterRange {
    /// Parameter name (see [`ParameterKind::parse`]).
    pub name: String,
    /// First value.
    pub min: f64,
    /// Last value (inclusive).
    pub max: f64,
    /// Increment.
    pub step: f64,
}

impl ParameterRange {
    /// Create a range.
    #[must_use]
    pub fn new(name: &str, min: f64, max: f64, step: f64) -> Self {
        Self {
            name: name.to_string(),
            min,
            max,
            step,
        }
    }

    /// Number of values in the sweep (at least one).
    #[must_use]
    pub fn value_count(&self) -> usize {
        range_len(self.min, self.max, self.step)
    }
}

/// Eligibility constraints on in-sample metrics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceConstraints {
    /// Maximum drawdown in percent.
    pub max_drawdown_pct: Option<f64>,
    /// Minimum win rate (0..1).
    pub min_win_rate: Option<f64>,
    /// Minimum Sharpe ratio.
    pub min_sharpe: Option<f64>,
    /// Minimum profit factor.
    pub min_profit_factor: Option<f64>,
}

impl PerformanceConstraints {
    fn validate(&self, v: &mut FieldValidator) {
        if let Some(dd) = self.max_drawdown_pct {
            v.in_range_f64("constraints.max_drawdown_pct", dd, 0.0, 100.0);
        }
        if let Some(rate) = self.min_win_rate {
            v.in_range_f64("constraints.min_win_rate", rate, 0.0, 1.0);
        }
        if let Some(sharpe) = self.min_sharpe {
            v.check(
                sharpe.is_finite(),
                "constraints.min_sharpe",
                "must be a finite number",
            );
        }
        if let Some(pf) = self.min_profit_factor {
            v.non_negative("constraints.min_profit_factor", pf);
        }
    }
}

/// Minimum |in-sample value| for an efficiency ratio, per metric.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EfficiencyEpsilons {
    /// Net P/L (dollars).
    pub net_pl: f64,
    /// Expectancy (dollars per trade).
    pub expectancy: f64,
    /// Sharpe.
    pub sharpe: f64,
    /// Sortino.
    pub sortino: f64,
    /// Calmar.
    pub calmar: f64,
    /// Profit factor.
    pub profit_factor: f64,
    /// Win rate.
    pub win_rate: f64,
    /// Kelly percentage.
    pub kelly_pct: f64,
    /// Average return percent.
    pub avg_return_pct: f64,
}

impl Default for EfficiencyEpsilons {
    fn default() -> Self {
        Self {
            net_pl: 1.0,
            expectancy: 0.01,
            sharpe: 0.01,
            sortino: 0.01,
            calmar: 0.01,
            profit_factor: 0.01,
            win_rate: 0.001,
            kelly_pct: 0.01,
            avg_return_pct: 0.01,
        }
    }
}

impl EfficiencyEpsilons {
    /// Epsilon for a metric; metrics without a dedicated field use 0.01.
    #[must_use]
    pub const fn for_metric(&self, metric: MetricKind) -> f64 {
        match metric {
            MetricKind::NetPl => self.net_pl,
            MetricKind::Expectancy => self.expectancy,
            MetricKind::Sharpe => self.sharpe,
            MetricKind::Sortino => self.sortino,
            MetricKind::Calmar => self.calmar,
            MetricKind::ProfitFactor => self.profit_factor,
            MetricKind::WinRate => self.win_rate,
            MetricKind::KellyPct => self.kelly_pct,
            MetricKind::AvgReturnPct => self.avg_return_pct,
            _ => 0.01,
        }
    }

    pub(crate) fn validate(&self, v: &mut FieldValidator) {
        let fields = [
            ("epsilons.net_pl", self.net_pl),
            ("epsilons.expectancy", self.expectancy),
            ("epsilons.sharpe", self.sharpe),
            ("epsilons.sortino", self.sortino),
            ("epsilons.calmar", self.calmar),
            ("epsilons.profit_factor", self.profit_factor),
            ("epsilons.win_rate", self.win_rate),
            ("epsilons.kelly_pct", self.kelly_pct),
            ("epsilons.avg_return_pct", self.avg_return_pct),
        ];
        for (field, value) in fields {
            v.non_negative(field, value);
        }
    }
}

/// Rolling window geometry shared by the optimizer and degradation analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// In-sample length in calendar days.
    pub in_sample_days: u32,
    /// Out-of-sample length in calendar days.
    pub out_of_sample_days: u32,
    /// Cursor advance between windows in calendar days.
    pub step_days: u32,
    /// Minimum in-sample trades for a usable window.
    pub min_in_sample_trades: usize,
    /// Minimum out-of-sample trades for a usable window.
    pub min_out_of_sample_trades: usize,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            in_sample_days: 90,
            out_of_sample_days: 30,
            step_days: 30,
            min_in_sample_trades: 10,
            min_out_of_sample_trades: 3,
        }
    }
}

impl WindowConfig {
    pub(crate) fn validate(&self, v: &mut FieldValidator) {
        v.in_range_usize("in_sample_days", self.in_sample_days as usize, 1, 3650)
            .in_range_usize(
                "out_of_sample_days",
                self.out_of_sample_days as usize,
                1,
                3650,
            )
            .in_range_usize("step_days", self.step_days as usize, 1, 3650)
            .at_least("min_in_sample_trades", self.min_in_sample_trades, 1)
            .at_least("min_out_of_sample_trades", self.min_out_of_sample_trades, 1);
    }
}

/// Configuration for walk-forward optimization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalkForwardConfig {
    /// Window geometry.
    #[serde(flatten)]
    pub window: WindowConfig,
    /// Metric to maximize in-sample.
    pub target: OptimizationTarget,
    /// Parameter sweeps.
    pub parameters: Vec<ParameterRange>,
    /// Eligibility constraints.
    pub constraints: PerformanceConstraints,
    /// Efficiency guards.
    pub epsilons: EfficiencyEpsilons,
    /// Starting equity; estimated from the trades when absent.
    pub initial_capital: Option<f64>,
    /// Metric annualization settings.
    pub metrics: MetricsSettings,
}

impl Default for WalkForwardConfig {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            target: OptimizationTarget::Sharpe,
            parameters: Vec::new(),
            constraints: PerformanceConstraints::default(),
            epsilons: EfficiencyEpsilons::default(),
            initial_capital: None,
            metrics: MetricsSettings::default(),
        }
    }
}

impl WalkForwardConfig {
    /// Validate every field, including the combination cap.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut v = FieldValidator::new();
        self.window.validate(&mut v);
        self.constraints.validate(&mut v);
        self.epsilons.validate(&mut v);
        v.nested("metrics", self.metrics.validate());

        if let Some(capital) = self.initial_capital {
            v.positive("initial_capital", capital);
        }

        for (i, range) in self.parameters.iter().enumerate() {
            let field = format!("parameters[{i}]");
            v.check(
                ParameterKind::parse(&range.name).is_some(),
                &format!("{field}.name"),
                format!(
                    "unsupported parameter '{}' (expected kelly_multiplier, fixed_fraction_pct, \
                     strategy_weight:<label>, max_drawdown_pct or consecutive_loss_limit)",
                    range.name
                ),
            );
            v.check(
                range.min.is_finite() && range.max.is_finite() && range.min <= range.max,
                &format!("{field}.max"),
                format!("must be finite and >= min (got {}..{})", range.min, range.max),
            );
            v.check(
                range.step.is_finite() && range.step > 0.0,
                &format!("{field}.step"),
                format!("must be > 0 (got {})", range.step),
            );
            if let Some(ParameterKind::KellyMultiplier | ParameterKind::FixedFractionPct) =
                ParameterKind::parse(&range.name)
            {
                v.check(
                    range.min >= 0.0,
                    &format!("{field}.min"),
                    format!("must be >= 0 (got {})", range.min),
                );
            }
        }

        let combinations = self.combination_count();
        v.check(
            combinations <= MAX_COMBINATIONS,
            "parameters",
            format!("grid has {combinations} combinations (max {MAX_COMBINATIONS})"),
        );

        v.finish()
    }

    /// Number of grid combinations, counted without expanding any range.
    ///
    /// Saturates at `usize::MAX`.
    #[must_use]
    pub fn combination_count(&self) -> usize {
        self.parameters
            .iter()
            .try_fold(1usize, |acc, range| acc.checked_mul(range.value_count()))
            .unwrap_or(usize::MAX)
    }

    /// Expand the parameter ranges into a grid.
    #[must_use]
    pub fn grid(&self) -> ParameterGrid {
        self.parameters
            .iter()
            .fold(ParameterGrid::builder(), |builder, range| {
                builder.add_range(&range.name, range.min, range.max, range.step)
            })
            .build()
    }
}

/// Date bounds of one rolling window (inclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowBounds {
    /// Window index (0-based).
    pub index: usize,
    /// In-sample start.
    pub in_sample_start: NaiveDate,
    /// In-sample end.
    pub in_sample_end: NaiveDate,
    /// Out-of-sample start.
    pub out_of_sample_start: NaiveDate,
    /// Out-of-sample end.
    pub out_of_sample_end: NaiveDate,
}

impl WindowBounds {
    /// Whether a date falls in the in-sample range.
    #[must_use]
    pub fn in_sample_contains(&self, date: NaiveDate) -> bool {
        (self.in_sample_start..=self.in_sample_end).contains(&date)
    }

    /// Whether a date falls in the out-of-sample range.
    #[must_use]
    pub fn out_of_sample_contains(&self, date: NaiveDate) -> bool {
        (self.out_of_sample_start..=self.out_of_sample_end).contains(&date)
    }
}

/// A single optimized walk-forward window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalkForwardWindow {
    /// Date bounds.
    #[serde(flatten)]
    pub bounds: WindowBounds,
    /// Trades in the in-sample range.
    pub in_sample_trades: usize,
    /// Trades in the out-of-sample range.
    pub out_of_sample_trades: usize,
    /// Winning parameters (empty when insufficient or nothing eligible).
    pub parameters: BTreeMap<String, f64>,
    /// Target metric in-sample with the winning parameters.
    pub in_sample_value: Option<f64>,
    /// Target metric out-of-sample with the winning parameters.
    pub out_of_sample_value: Option<f64>,
    /// Out-of-sample net P/L with the winning parameters.
    pub out_of_sample_net_pl: f64,
    /// OOS / IS ratio of the target metric.
    pub efficiency: Option<f64>,
    /// Whether both ranges met the minimum trade counts.
    pub sufficient: bool,
    /// Combinations evaluated in-sample.
    pub combinations_evaluated: usize,
    /// Combinations rejected by limits or constraints.
    pub combinations_rejected: usize,
}

/// Per-parameter stability across sufficient windows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterStability {
    /// Stability per parameter in [0, 1] (`None` with fewer than two windows).
    pub per_parameter: BTreeMap<String, Option<f64>>,
    /// Mean over parameters with a value.
    pub overall: Option<f64>,
}

/// Aggregates over all windows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WalkForwardSummary {
    /// Windows generated.
    pub total_windows: usize,
    /// Windows meeting the trade minimums.
    pub sufficient_windows: usize,
    /// Mean in-sample target value.
    pub avg_in_sample_value: Option<f64>,
    /// Mean out-of-sample target value.
    pub avg_out_of_sample_value: Option<f64>,
    /// Mean efficiency over windows with a value.
    pub avg_efficiency: Option<f64>,
    /// Windows with a computable efficiency.
    pub efficiency_windows: usize,
    /// Parameter stability.
    pub parameter_stability: ParameterStability,
    /// Share of sufficient windows with positive OOS net P/L.
    pub consistency: Option<f64>,
    /// Mean of clamped efficiency, stability and consistency.
    ///
    /// Specific to this engine; not comparable with other tools' scores.
    pub robustness_score: Option<f64>,
}

/// Results of walk-forward analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalkForwardResult {
    /// Configuration used.
    pub config: WalkForwardConfig,
    /// Starting equity used for return bases.
    pub initial_capital: f64,
    /// Individual window results.
    pub windows: Vec<WalkForwardWindow>,
    /// Aggregates.
    pub summary: WalkForwardSummary,
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test_case("kelly_multiplier", Some(ParameterKind::KellyMultiplier))]
    #[test_case("fixed_fraction_pct", Some(ParameterKind::FixedFractionPct))]
    #[test_case("strategy_weight:IC", Some(ParameterKind::StrategyWeight("IC".to_string())))]
    #[test_case("strategy_weight:", None)]
    #[test_case("max_drawdown_pct", Some(ParameterKind::MaxDrawdownPct))]
    #[test_case("consecutive_loss_limit", Some(ParameterKind::ConsecutiveLossLimit))]
    #[test_case("sma_period", None)]
    fn test_parameter_kind_parse(name: &str, expected: Option<ParameterKind>) {
        assert_eq!(ParameterKind::parse(name), expected);
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(WalkForwardConfig::default().validate().is_ok());
    }

    #[test]
    fn test_unknown_parameter_rejected() {
        let config = WalkForwardConfig {
            parameters: vec![ParameterRange::new("sma_period", 10.0, 50.0, 10.0)],
            ..Default::default()
        };
        let Err(err) = config.validate() else {
            panic!("unknown parameter should fail validation");
        };
        assert!(err.has_field("parameters[0].name"));
    }

    #[test]
    fn test_combination_cap_checked_before_evaluation() {
        let config = WalkForwardConfig {
            parameters: vec![
                ParameterRange::new("kelly_multiplier", 0.0, 2.0, 0.01),
                ParameterRange::new("fixed_fraction_pct", 0.0, 2.0, 0.01),
            ],
            ..Default::default()
        };
        // 201 * 201 = 40401 > 20000
        let Err(err) = config.validate() else {
            panic!("oversized grid should fail validation");
        };
        assert!(err.has_field("parameters"));
    }

    #[test]
    fn test_tiny_step_rejected_without_expansion() {
        let config = WalkForwardConfig {
            parameters: vec![ParameterRange::new("kelly_multiplier", 0.0, 1.0, 1e-300)],
            ..Default::default()
        };
        assert_eq!(config.combination_count(), usize::MAX);
        let Err(err) = config.validate() else {
            panic!("unbounded grid should fail validation");
        };
        assert!(err.has_field("parameters"));
        assert!(!err.has_field("parameters[0].step"));
    }

    #[test]
    fn test_combination_count_matches_grid() {
        let config = WalkForwardConfig {
            parameters: vec![
                ParameterRange::new("kelly_multiplier", 0.5, 1.5, 0.25),
                ParameterRange::new("max_drawdown_pct", 10.0, 20.0, 5.0),
            ],
            ..Default::default()
        };
        assert_eq!(config.combination_count(), 15);
        assert_eq!(config.grid().total_combinations(), 15);
    }

    #[test]
    fn test_zero_window_sizes_rejected() {
        let config = WalkForwardConfig {
            window: WindowConfig {
                in_sample_days: 0,
                step_days: 0,
                ..Default::default()
            },
            ..Default::default()
        };
        let Err(err) = config.validate() else {
            panic!("zero windows should fail validation");
        };
        assert!(err.has_field("in_sample_days"));
        assert!(err.has_field("step_days"));
    }

    #[test]
    fn test_parameter_range_len() {
        assert_eq!(ParameterRange::new("kelly_multiplier", 0.5, 1.5, 0.25).value_count(), 5);
    }

    #[test]
    fn test_epsilon_lookup() {
        let eps = EfficiencyEpsilons::default();
        assert_eq!(eps.for_metric(MetricKind::NetPl), 1.0);
        assert_eq!(eps.for_metric(MetricKind::WinRate), 0.001);
    }
}
