//! Edge decay orchestration.

use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::composite::{CompositeInputs, CompositeScore, composite_score};
use super::observation::{
    DEFAULT_TOP_OBSERVATIONS, Observation, from_degradation, from_period_trends, from_regime,
    from_rolling, from_walk_forward, top_observations,
};
use super::signal::Signal;
use crate::config::{FieldValidator, ValidationError};
use crate::error::AnalyticsError;
use crate::periods::{PeriodAnalysis, PeriodAnalyzer, PeriodConfig};
use crate::regime::{RegimeAnalyzer, RegimeComparison, RegimeConfig, ReturnBasisDecision};
use crate::rolling::{RollingAnalysis, RollingAnalyzer, RollingConfig};
use crate::trade::{Trade, validate_trades};
use crate::walkforward::{
    DegradationAnalyzer, DegradationConfig, DegradationResult, WalkForwardAnalyzer,
    WalkForwardConfig, WalkForwardResult,
};

/// Configuration for edge decay synthesis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EdgeDecayConfig {
    /// Calendar period analysis.
    pub periods: PeriodConfig,
    /// Rolling window analysis.
    pub rolling: RollingConfig,
    /// Regime comparison.
    pub regime: RegimeConfig,
    /// Walk-forward analysis.
    pub walk_forward: WalkForwardConfig,
    /// Walk-forward degradation.
    pub degradation: DegradationConfig,
    /// Number of top observations to report.
    pub top_observations: usize,
}

impl Default for EdgeDecayConfig {
    fn default() -> Self {
        Self {
            periods: PeriodConfig::default(),
            rolling: RollingConfig::default(),
            regime: RegimeConfig::default(),
            walk_forward: WalkForwardConfig::default(),
            degradation: DegradationConfig::default(),
            top_observations: DEFAULT_TOP_OBSERVATIONS,
        }
    }
}

impl EdgeDecayConfig {
    /// Validate every sub-engine configuration, reporting all violations.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut v = FieldValidator::new();
        v.nested("periods", self.periods.validate())
            .nested("rolling", self.rolling.validate())
            .nested("regime", self.regime.validate())
            .nested("walk_forward", self.walk_forward.validate())
            .nested("degradation", self.degradation.validate())
            .at_least("top_observations", self.top_observations, 1);
        v.finish()
    }
}

/// Edge decay report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeDecayReport {
    /// Trades analysed.
    pub trade_count: usize,
    /// Return basis shared with the regime comparison.
    pub basis: ReturnBasisDecision,
    /// Calendar period analysis.
    pub periods: Signal<PeriodAnalysis>,
    /// Rolling window analysis.
    pub rolling: Signal<RollingAnalysis>,
    /// Regime comparison.
    pub regime: Signal<RegimeComparison>,
    /// Walk-forward analysis.
    pub walk_forward: Signal<WalkForwardResult>,
    /// Walk-forward degradation.
    pub degradation: Signal<DegradationResult>,
    /// Every historical/recent observation.
    pub observations: Vec<Observation>,
    /// Rate-type observations with the largest |percent change|.
    pub top_observations: Vec<Observation>,
    /// Weighted composite.
    pub composite: CompositeScore,
}

/// Runs every sub-engine and combines their findings.
#[derive(Debug, Clone)]
pub struct EdgeDecayAnalyzer {
    config: EdgeDecayConfig,
    periods: PeriodAnalyzer,
    rolling: RollingAnalyzer,
    regime: RegimeAnalyzer,
    walk_forward: WalkForwardAnalyzer,
    degradation: DegradationAnalyzer,
}

impl EdgeDecayAnalyzer {
    /// Create an analyzer; any invalid sub-configuration fails the whole call.
    pub fn new(config: EdgeDecayConfig) -> Result<Self, AnalyticsError> {
        config.validate()?;
        Ok(Self {
            periods: PeriodAnalyzer::new(config.periods)?,
            rolling: RollingAnalyzer::new(config.rolling)?,
            regime: RegimeAnalyzer::new(config.regime.clone())?,
            walk_forward: WalkForwardAnalyzer::new(config.walk_forward.clone())?,
            degradation: DegradationAnalyzer::new(config.degradation.clone())?,
            config,
        })
    }

    /// Check a caller-owned flag during walk-forward optimization.
    #[must_use]
    pub fn with_cancellation(mut self, flag: Arc<AtomicBool>) -> Self {
        self.walk_forward = self.walk_forward.with_cancellation(flag);
        self
    }

    /// Access the configuration.
    #[must_use]
    pub const fn config(&self) -> &EdgeDecayConfig {
        &self.config
    }

    /// Analyse an unordered trade collection.
    pub fn analyze(&self, trades: &[Trade]) -> Result<EdgeDecayReport, AnalyticsError> {
        validate_trades(trades)?;
        let basis = ReturnBasisDecision::resolve(trades, self.config.regime.use_margin_returns);

        info!(
            trades = trades.len(),
            basis = ?basis.basis,
            "Running edge decay analysis"
        );

        let (simulated, (optimized, degraded)) = rayon::join(
            || self.regime.analyze_with_basis(trades, basis),
            || {
                rayon::join(
                    || self.walk_forward.analyze(trades),
                    || self.degradation.analyze(trades),
                )
            },
        );
        let periods = Signal::from_result(self.periods.analyze(trades))?;
        let rolling = Signal::from_result(self.rolling.analyze(trades))?;
        let regime = Signal::from_result(simulated)?;
        let walk_forward = Signal::from_result(optimized)?;
        let degradation = Signal::from_result(degraded)?;

        let mut observations = Vec::new();
        if let Some(analysis) = periods.detail() {
            observations.extend(from_period_trends(&analysis.trends));
        }
        if let Some(comparison) = rolling.detail().and_then(|r| r.comparison.as_ref()) {
            observations.extend(from_rolling(comparison));
        }
        if let Some(comparison) = regime.detail() {
            observations.extend(from_regime(comparison));
        }
        if let Some(result) = walk_forward.detail() {
            observations.extend(from_walk_forward(result));
        }
        if let Some(result) = degradation.detail() {
            observations.extend(from_degradation(result));
        }

        let top = top_observations(&observations, self.config.top_observations);
        let composite = composite_score(CompositeInputs {
            observations: &observations,
            regime: regime.detail().map(|r| &r.divergence),
            walk_forward: walk_forward.detail().map(|w| &w.summary),
            degradation: degradation.detail(),
            flags: rolling
                .detail()
                .filter(|r| r.comparison.is_some())
                .map(|r| r.flags.as_slice()),
        });

        debug!(
            observations = observations.len(),
            periods = periods.is_available(),
            rolling = rolling.is_available(),
            regime = regime.is_available(),
            walk_forward = walk_forward.is_available(),
            degradation = degradation.is_available(),
            "Edge decay inputs gathered"
        );
        info!(
            score = ?composite.score,
            available_weight = composite.available_weight,
            "Edge decay analysis complete"
        );

        Ok(EdgeDecayReport {
            trade_count: trades.len(),
            basis,
            periods,
            rolling,
            regime,
            walk_forward,
            degradation,
            observations,
            top_observations: top,
            composite,
        })
    }
}
