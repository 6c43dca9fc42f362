//! Error handling for the analytics engine.
//!
//! Expected conditions are not errors here: a window with too few trades or a
//! ratio with a zero denominator is reported as `None` inside the result. The
//! variants below cover what aborts a call outright.
//!
//! | Code | Usage |
//! |------|-------|
//! | `INVALID_CONFIG` | A configuration field is outside its allowed range |
//! | `INSUFFICIENT_DATA` | No result structure can be produced at all (e.g. empty resample pool) |
//! | `MALFORMED_TRADE` | A trade record violates the data model |
//! | `CANCELLED` | A caller-supplied cancellation flag was raised |

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{FieldError, ValidationError};

/// Error codes for the analytics engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Configuration rejected before computation.
    InvalidConfig,
    /// Not enough input to build any result.
    InsufficientData,
    /// Trade record violates the data model.
    MalformedTrade,
    /// Caller cancelled the computation.
    Cancelled,
}

impl ErrorCode {
    /// Get the error reason string.
    #[must_use]
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::InvalidConfig => "INVALID_CONFIG",
            Self::InsufficientData => "INSUFFICIENT_DATA",
            Self::MalformedTrade => "MALFORMED_TRADE",
            Self::Cancelled => "CANCELLED",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.reason())
    }
}

/// Errors that abort an analytics call.
#[derive(Debug, Clone, Error)]
pub enum AnalyticsError {
    /// Configuration failed validation.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(#[from] ValidationError),

    /// Input does not support any result for this operation.
    #[error("Insufficient data for {operation}: {details}")]
    InsufficientData {
        /// Operation that was attempted.
        operation: &'static str,
        /// What was missing.
        details: String,
    },

    /// A trade record is internally inconsistent.
    #[error("Malformed trade at index {index}: {reason}")]
    MalformedTrade {
        /// Index of the trade in the caller's input.
        index: usize,
        /// Description of the violation.
        reason: String,
    },

    /// The cancellation flag was set between units of work.
    #[error("Computation cancelled during {operation}")]
    Cancelled {
        /// Operation that observed the flag.
        operation: &'static str,
    },
}

impl AnalyticsError {
    /// Insufficient data for an operation.
    #[must_use]
    pub fn insufficient(operation: &'static str, details: impl Into<String>) -> Self {
        Self::InsufficientData {
            operation,
            details: details.into(),
        }
    }

    /// Get the error code.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidConfig(_) => ErrorCode::InvalidConfig,
            Self::InsufficientData { .. } => ErrorCode::InsufficientData,
            Self::MalformedTrade { .. } => ErrorCode::MalformedTrade,
            Self::Cancelled { .. } => ErrorCode::Cancelled,
        }
    }

    /// Convert to a serializable error detail for the API layer.
    #[must_use]
    pub fn to_detail(&self) -> ErrorDetail {
        let fields = match self {
            Self::InvalidConfig(validation) => validation.errors.clone(),
            _ => Vec::new(),
        };

        ErrorDetail {
            code: self.code().reason().to_string(),
            message: self.to_string(),
            fields,
        }
    }
}

/// Serializable error body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Error code string.
    pub code: String,
    /// Human-readable message.
    pub message: String,
    /// Offending configuration fields (empty unless `INVALID_CONFIG`).
    pub fields: Vec<FieldError>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_reason() {
        assert_eq!(ErrorCode::InvalidConfig.reason(), "INVALID_CONFIG");
        assert_eq!(ErrorCode::Cancelled.to_string(), "CANCELLED");
    }

    #[test]
    fn test_invalid_config_response_lists_fields() {
        let validation = ValidationError {
            errors: vec![FieldError::new("num_simulations", "must be between 1 and 100000")],
        };
        let err = AnalyticsError::from(validation);

        assert_eq!(err.code(), ErrorCode::InvalidConfig);
        let response = err.to_detail();
        assert_eq!(response.code, "INVALID_CONFIG");
        assert_eq!(response.fields.len(), 1);
        assert!(response.message.contains("num_simulations"));
    }

    #[test]
    fn test_insufficient_data_message() {
        let err = AnalyticsError::insufficient("monte_carlo", "resample pool is empty");
        assert_eq!(err.code(), ErrorCode::InsufficientData);
        assert_eq!(
            err.to_string(),
            "Insufficient data for monte_carlo: resample pool is empty"
        );
        assert!(err.to_detail().fields.is_empty());
    }
}
