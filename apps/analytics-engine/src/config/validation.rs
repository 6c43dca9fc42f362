//! Structured configuration validation.
//!
//! Every operation config exposes `validate()`, which collects all offending
//! fields before returning. Values are never clamped into range silently.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A single invalid configuration field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Dotted path of the field (e.g. `monte_carlo.num_simulations`).
    pub field: String,
    /// Allowed range or constraint that was violated.
    pub message: String,
}

impl FieldError {
    /// Create a new field error.
    #[must_use]
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.field, self.message)
    }
}

/// Validation failure enumerating every invalid field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub struct ValidationError {
    /// Offending fields, in the order they were checked.
    pub errors: Vec<FieldError>,
}

impl ValidationError {
    /// Check whether a field path is among the errors.
    #[must_use]
    pub fn has_field(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.errors.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{error}")?;
        }
        Ok(())
    }
}

/// Collects field errors while a config is checked.
#[derive(Debug, Default)]
pub struct FieldValidator {
    prefix: Option<String>,
    errors: Vec<FieldError>,
}

impl FieldValidator {
    /// Create an empty validator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a validator whose field paths are prefixed (e.g. `regime.`).
    #[must_use]
    pub fn with_prefix(prefix: &str) -> Self {
        Self {
            prefix: Some(prefix.to_string()),
            errors: Vec::new(),
        }
    }

    fn path(&self, field: &str) -> String {
        match &self.prefix {
            Some(prefix) => format!("{prefix}.{field}"),
            None => field.to_string(),
        }
    }

    /// Record an error when `ok` is false.
    pub fn check(&mut self, ok: bool, field: &str, message: impl Into<String>) -> &mut Self {
        if !ok {
            let path = self.path(field);
            self.errors.push(FieldError::new(path, message));
        }
        self
    }

    /// Require an integer within `[min, max]`.
    pub fn in_range_usize(&mut self, field: &str, value: usize, min: usize, max: usize) -> &mut Self {
        self.check(
            (min..=max).contains(&value),
            field,
            format!("must be between {min} and {max} (got {value})"),
        )
    }

    /// Require an integer of at least `min`.
    pub fn at_least(&mut self, field: &str, value: usize, min: usize) -> &mut Self {
        self.check(value >= min, field, format!("must be >= {min} (got {value})"))
    }

    /// Require a finite float strictly greater than zero.
    pub fn positive(&mut self, field: &str, value: f64) -> &mut Self {
        self.check(
            value.is_finite() && value > 0.0,
            field,
            format!("must be a finite number > 0 (got {value})"),
        )
    }

    /// Require a finite float within `[min, max]`.
    pub fn in_range_f64(&mut self, field: &str, value: f64, min: f64, max: f64) -> &mut Self {
        self.check(
            value.is_finite() && (min..=max).contains(&value),
            field,
            format!("must be between {min} and {max} (got {value})"),
        )
    }

    /// Require a finite, non-negative float.
    pub fn non_negative(&mut self, field: &str, value: f64) -> &mut Self {
        self.check(
            value.is_finite() && value >= 0.0,
            field,
            format!("must be a finite number >= 0 (got {value})"),
        )
    }

    /// Merge errors from a nested config, prefixing their field paths.
    pub fn nested(&mut self, prefix: &str, result: Result<(), ValidationError>) -> &mut Self {
        if let Err(nested) = result {
            for error in nested.errors {
                let field = self.path(&format!("{prefix}.{}", error.field));
                self.errors.push(FieldError::new(field, error.message));
            }
        }
        self
    }

    /// Finish validation.
    pub fn finish(self) -> Result<(), ValidationError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationError {
                errors: self.errors,
            })
        }
    }
}
