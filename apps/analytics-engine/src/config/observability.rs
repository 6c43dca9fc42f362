//! Logging configuration.

use serde::{Deserialize, Serialize};

use super::validation::{FieldValidator, ValidationError};

const LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
const FORMATS: [&str; 2] = ["json", "pretty"];

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level, used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Output format (`json` or `pretty`).
    #[serde(default = "default_log_format")]
    pub format: String,
    /// Include span information.
    #[serde(default = "default_true")]
    pub include_spans: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            include_spans: true,
        }
    }
}

impl LoggingConfig {
    /// Validate level and format names.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut v = FieldValidator::new();
        v.check(
            LEVELS.contains(&self.level.to_lowercase().as_str()),
            "level",
            format!("must be one of {LEVELS:?} (got {:?})", self.level),
        )
        .check(
            FORMATS.contains(&self.format.as_str()),
            "format",
            format!("must be one of {FORMATS:?} (got {:?})", self.format),
        );
        v.finish()
    }

    /// Whether output is JSON.
    #[must_use]
    pub fn is_json(&self) -> bool {
        self.format == "json"
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

const fn default_true() -> bool {
    true
}
