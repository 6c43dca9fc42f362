//! Walk-forward analysis module.
//!
//! Rolling in-sample/out-of-sample validation of position-sizing choices:
//! - Calendar-day windows stepping forward from the first trade
//! - Parallel grid search of sizing and limit parameters in-sample
//! - Efficiency (OOS / IS), parameter stability, consistency and a
//!   robustness score across windows
//! - Degradation analysis of a fixed metric set without optimization
//!
//! # Example
//!
//! ```rust,ignore
//! use analytics_engine::walkforward::{OptimizationTarget, ParameterRange, WalkForwardBuilder};
//!
//! let analyzer = WalkForwardBuilder::new()
//!     .in_sample_days(90)
//!     .out_of_sample_days(30)
//!     .step_days(30)
//!     .target(OptimizationTarget::Sharpe)
//!     .parameter(ParameterRange::new("kelly_multiplier", 0.25, 1.0, 0.25))
//!     .build()?;
//!
//! let result = analyzer.analyze(&trades)?;
//! println!("Robustness: {:?}", result.summary.robustness_score);
//! ```

mod analysis;
mod builder;
mod degradation;
mod engine;
mod optimizer;
mod types;
mod windows;

pub use analysis::{
    analyze_parameter_stability, consistency, efficiency, robustness_score, stability_score,
    summarize,
};
pub use builder::WalkForwardBuilder;
pub use degradation::{
    DEGRADATION_METRICS, DegradationAnalyzer, DegradationConfig, DegradationResult,
    DegradationWindow, MetricDegradation, MetricWindowValue,
};
pub use engine::WalkForwardAnalyzer;
pub use optimizer::{
    Candidate, GridOptimizer, Optimization, Rejections, apply_parameters, meets_constraints,
    passes_limits,
};
pub use types::{
    BASELINE_RISK_PCT, EfficiencyEpsilons, MAX_COMBINATIONS, MAX_WINDOWS, OptimizationTarget,
    ParameterKind, ParameterRange, ParameterStability, PerformanceConstraints, WalkForwardConfig,
    WalkForwardResult, WalkForwardSummary, WalkForwardWindow, WindowBounds, WindowConfig,
};
pub use windows::{WindowSlices, generate_windows, slice_window};
