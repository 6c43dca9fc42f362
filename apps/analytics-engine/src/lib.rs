// Allow unwrap/expect in tests - tests should panic on unexpected errors
// Allow test-specific patterns and pedantic lints in test code
#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::float_cmp,
        clippy::too_many_lines,
        clippy::match_same_arms,
        clippy::needless_pass_by_value,
        clippy::needless_collect,
        clippy::option_if_let_else,
        clippy::default_trait_access,
        clippy::items_after_statements,
        clippy::or_fun_call
    )
)]

//! Analytics Engine - Rust Core Library
//!
//! Deterministic trade analytics for the Cream trading system.
//!
//! # Architecture
//!
//! A pure library: every engine takes a typed, validated config and an
//! unordered trade collection, and returns a serde-serializable result.
//!
//! ## Foundations
//!
//! - `trade`: Trade record, chronological ordering, dollar/capital/margin returns
//! - `metrics`: Statistical helpers and per-slice trade metrics
//! - `parallel`: Parameter grids for the walk-forward search
//! - `config`: Settings loading, field validation, logging configuration
//!
//! ## Engines
//!
//! - `monte_carlo`: Bootstrap equity projection with worst-case stress
//! - `walkforward`: Rolling-window optimization, efficiency and degradation
//! - `regime`: Full-history versus recent-window projection divergence
//! - `periods`: Calendar segmentation, losing-month streaks, trend fits
//! - `rolling`: Rolling metrics, seasonality, structural threshold flags
//! - `edge_decay`: Composite synthesis of all of the above
//!
//! Anything not computable is `None`; errors are reserved for invalid
//! configuration, malformed trades, cancellation, and inputs that support no
//! result at all.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod edge_decay;
pub mod error;
pub mod metrics;
pub mod monte_carlo;
pub mod parallel;
pub mod periods;
pub mod regime;
pub mod rolling;
pub mod telemetry;
pub mod trade;
pub mod walkforward;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::{ConfigError, EngineSettings, ValidationError, load_settings};
pub use edge_decay::{EdgeDecayAnalyzer, EdgeDecayConfig, EdgeDecayReport, Signal};
pub use error::{AnalyticsError, ErrorCode, ErrorDetail};
pub use metrics::{MetricKind, MetricsCalculator, TradeMetrics};
pub use monte_carlo::{MonteCarloBuilder, MonteCarloSimulator, SimulationParams, SimulationResult};
pub use periods::{PeriodAnalysis, PeriodAnalyzer, PeriodConfig};
pub use regime::{RegimeAnalyzer, RegimeComparison, RegimeConfig};
pub use rolling::{RollingAnalysis, RollingAnalyzer, RollingConfig};
pub use trade::Trade;
pub use walkforward::{
    DegradationAnalyzer, DegradationConfig, WalkForwardAnalyzer, WalkForwardBuilder,
    WalkForwardConfig, WalkForwardResult,
};
