//! Edge decay synthesis.
//!
//! Runs period, rolling, regime, walk-forward and degradation analyses over
//! one trade history, turns their historical/recent pairs into comparable
//! observations, and folds them into a single weighted score in [0, 1]
//! where higher means more decay. A sub-analysis without enough data is
//! reported as unavailable instead of failing the call.

mod composite;
mod engine;
mod observation;
mod signal;

pub use composite::{
    CompositeInputs, CompositeScore, ComponentKind, FLAGS_WEIGHT, MEAN_CHANGE_WEIGHT,
    REGIME_WEIGHT, ScoreComponent, WALK_FORWARD_WEIGHT, composite_score,
};
pub use engine::{EdgeDecayAnalyzer, EdgeDecayConfig, EdgeDecayReport};
pub use observation::{
    DEFAULT_TOP_OBSERVATIONS, Observation, ObservationSource, from_degradation,
    from_period_trends, from_regime, from_rolling, from_walk_forward, top_observations,
};
pub use signal::Signal;
