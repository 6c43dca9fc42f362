//! Weighted composite decay score.

use serde::{Deserialize, Serialize};

use super::observation::Observation;
use crate::metrics::MetricType;
use crate::metrics::math::mean;
use crate::regime::Divergence;
use crate::rolling::StructuralFlag;
use crate::walkforward::{DegradationResult, WalkForwardSummary};

/// Weight of the mean absolute percent change.
pub const MEAN_CHANGE_WEIGHT: f64 = 0.30;
/// Weight of the regime divergence.
pub const REGIME_WEIGHT: f64 = 0.30;
/// Weight of walk-forward efficiency loss.
pub const WALK_FORWARD_WEIGHT: f64 = 0.20;
/// Weight of the structural flag share.
pub const FLAGS_WEIGHT: f64 = 0.20;

/// Input feeding one composite component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    /// Mean |percent change| over rate-type observations.
    MeanChange,
    /// Negative regime composite.
    Regime,
    /// Out-of-sample efficiency shortfall, optimized and as traded.
    WalkForward,
    /// Share of structural flags crossed.
    StructuralFlags,
}

/// One component of the composite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreComponent {
    /// Component.
    pub kind: ComponentKind,
    /// Nominal weight.
    pub weight: f64,
    /// Raw input (mean percent, regime composite, pooled efficiency, crossed share).
    pub input: Option<f64>,
    /// Contribution in [0, 1]; `None` drops the component from the mean.
    pub value: Option<f64>,
}

/// Composite decay score in [0, 1].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeScore {
    /// All four components, available or not.
    pub components: Vec<ScoreComponent>,
    /// Weighted mean of the available components.
    pub score: Option<f64>,
    /// Sum of weights that contributed.
    pub available_weight: f64,
}

/// Inputs to [`composite_score`].
#[derive(Debug, Clone, Copy, Default)]
pub struct CompositeInputs<'a> {
    /// Every observation gathered.
    pub observations: &'a [Observation],
    /// Regime divergence, when available.
    pub regime: Option<&'a Divergence>,
    /// Walk-forward summary, when available.
    pub walk_forward: Option<&'a WalkForwardSummary>,
    /// Degradation result, when available.
    pub degradation: Option<&'a DegradationResult>,
    /// Structural flags, when a rolling comparison exists.
    pub flags: Option<&'a [StructuralFlag]>,
}

/// Combine the available components into one score.
#[must_use]
pub fn composite_score(inputs: CompositeInputs<'_>) -> CompositeScore {
    let rate_changes: Vec<f64> = inputs
        .observations
        .iter()
        .filter(|o| o.metric_type == MetricType::Rate)
        .filter_map(Observation::abs_percent_change)
        .collect();
    let mean_change = mean(&rate_changes);

    let regime = inputs.regime.and_then(|d| d.composite);
    let efficiencies: Vec<f64> = [
        inputs.walk_forward.and_then(|s| s.avg_efficiency),
        inputs.degradation.and_then(DegradationResult::overall_efficiency),
    ]
    .into_iter()
    .flatten()
    .collect();
    let efficiency = mean(&efficiencies);
    let crossed_share = inputs.flags.filter(|f| !f.is_empty()).map(|flags| {
        flags.iter().filter(|f| f.crossed).count() as f64 / flags.len() as f64
    });

    let components = vec![
        ScoreComponent {
            kind: ComponentKind::MeanChange,
            weight: MEAN_CHANGE_WEIGHT,
            input: mean_change,
            value: mean_change.map(|m| (m / 100.0).min(1.0)),
        },
        ScoreComponent {
            kind: ComponentKind::Regime,
            weight: REGIME_WEIGHT,
            input: regime,
            value: regime.map(regime_component),
        },
        ScoreComponent {
            kind: ComponentKind::WalkForward,
            weight: WALK_FORWARD_WEIGHT,
            input: efficiency,
            value: efficiency.map(|e| (1.0 - e).clamp(0.0, 1.0)),
        },
        ScoreComponent {
            kind: ComponentKind::StructuralFlags,
            weight: FLAGS_WEIGHT,
            input: crossed_share,
            value: crossed_share,
        },
    ];

    let (weighted, available_weight) = components
        .iter()
        .filter_map(|c| c.value.map(|v| (v * c.weight, c.weight)))
        .fold((0.0, 0.0), |(sum, w), (v, cw)| (sum + v, w + cw));
    let score = (available_weight > 0.0).then(|| weighted / available_weight);

    CompositeScore {
        components,
        score,
        available_weight,
    }
}

/// Only a deteriorating regime contributes.
fn regime_component(composite: f64) -> f64 {
    if composite < 0.0 {
        (-composite / 2.0).min(1.0)
    } else {
        0.0
    }
}
