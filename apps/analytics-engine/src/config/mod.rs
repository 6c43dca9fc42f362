//! Configuration for the analytics engine.
//!
//! Every engine takes its own typed config; [`EngineSettings`] bundles them
//! into one YAML document with environment variable interpolation and
//! whole-document validation.
//!
//! # Usage
//!
//! ```rust,ignore
//! use analytics_engine::config::load_settings;
//!
//! // Load from default path (analytics.yaml)
//! let settings = load_settings(None)?;
//!
//! let simulator = MonteCarloSimulator::new(settings.monte_carlo.clone())?;
//! ```

mod observability;
mod validation;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::edge_decay::EdgeDecayConfig;
use crate::metrics::MetricsSettings;
use crate::monte_carlo::SimulationParams;
use crate::periods::PeriodConfig;
use crate::regime::RegimeConfig;
use crate::rolling::RollingConfig;
use crate::walkforward::{DegradationConfig, WalkForwardConfig};

pub use observability::LoggingConfig;
pub use validation::{FieldError, FieldValidator, ValidationError};

/// Settings file used when no path is given.
pub const DEFAULT_SETTINGS_PATH: &str = "analytics.yaml";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read settings file.
    #[error("Failed to read settings file '{path}': {source}")]
    ReadError {
        /// Path to the settings file.
        path: String,
        /// The underlying IO error.
        source: std::io::Error,
    },

    /// Failed to parse YAML settings.
    #[error("Failed to parse settings YAML: {0}")]
    ParseError(#[from] serde_yaml_bw::Error),

    /// Settings validation failed.
    #[error("Settings validation failed: {0}")]
    ValidationError(#[from] ValidationError),
}

/// Root settings structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineSettings {
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Metric annualization defaults.
    #[serde(default)]
    pub metrics: MetricsSettings,
    /// Monte Carlo projection.
    #[serde(default)]
    pub monte_carlo: SimulationParams,
    /// Walk-forward optimization.
    #[serde(default)]
    pub walk_forward: WalkForwardConfig,
    /// Walk-forward degradation.
    #[serde(default)]
    pub degradation: DegradationConfig,
    /// Regime comparison.
    #[serde(default)]
    pub regime: RegimeConfig,
    /// Calendar period analysis.
    #[serde(default)]
    pub periods: PeriodConfig,
    /// Rolling window analysis.
    #[serde(default)]
    pub rolling: RollingConfig,
    /// Edge decay synthesis.
    #[serde(default)]
    pub edge_decay: EdgeDecayConfig,
}

impl EngineSettings {
    /// Validate every section, reporting all violations.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut v = FieldValidator::new();
        v.nested("logging", self.logging.validate())
            .nested("metrics", self.metrics.validate())
            .nested("monte_carlo", self.monte_carlo.validate())
            .nested("walk_forward", self.walk_forward.validate())
            .nested("degradation", self.degradation.validate())
            .nested("regime", self.regime.validate())
            .nested("periods", self.periods.validate())
            .nested("rolling", self.rolling.validate())
            .nested("edge_decay", self.edge_decay.validate());
        v.finish()
    }
}

// ============================================
// Settings Loading
// ============================================

/// Load settings from a YAML file with environment variable interpolation.
///
/// `path` defaults to [`DEFAULT_SETTINGS_PATH`].
pub fn load_settings(path: Option<&str>) -> Result<EngineSettings, ConfigError> {
    let path = path.unwrap_or(DEFAULT_SETTINGS_PATH);

    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_string(),
        source: e,
    })?;

    load_settings_from_string(&contents)
}

/// Load settings from a YAML string.
pub fn load_settings_from_string(yaml: &str) -> Result<EngineSettings, ConfigError> {
    let interpolated = interpolate_env_vars(yaml);
    let settings: EngineSettings = serde_yaml_bw::from_str(&interpolated)?;
    settings.validate()?;
    Ok(settings)
}

/// Interpolate environment variables in a string.
///
/// Supports both `${VAR}` and `${VAR:-default}` syntax.
#[allow(clippy::expect_used)] // Regex is a compile-time constant
fn interpolate_env_vars(input: &str) -> String {
    use std::sync::OnceLock;

    static ENV_VAR_REGEX: OnceLock<regex::Regex> = OnceLock::new();

    let re = ENV_VAR_REGEX.get_or_init(|| {
        regex::Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}")
            .expect("env var regex is valid")
    });

    re.replace_all(input, |cap: &regex::Captures<'_>| {
        let default_value = cap.get(2).map_or("", |m| m.as_str());
        match std::env::var(&cap[1]) {
            Ok(v) if !v.is_empty() => v,
            _ => default_value.to_string(),
        }
    })
    .into_owned()
}
