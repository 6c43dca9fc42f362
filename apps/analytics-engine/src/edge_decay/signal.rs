//! Availability wrapper for sub-engine results.

use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

use crate::error::AnalyticsError;

/// A sub-result that is either computed or explains why it is missing.
///
/// Serializes as `{"available": true, "detail": …}` or
/// `{"available": false, "reason": "…"}`.
#[derive(Debug, Clone, PartialEq)]
pub enum Signal<T> {
    /// Computed result.
    Available(T),
    /// Not computable from the input.
    Unavailable {
        /// Why the result is missing.
        reason: String,
    },
}

impl<T> Signal<T> {
    /// Wrap a sub-engine result.
    ///
    /// Insufficient data becomes [`Signal::Unavailable`]; every other error
    /// aborts the caller.
    pub fn from_result(result: Result<T, AnalyticsError>) -> Result<Self, AnalyticsError> {
        match result {
            Ok(value) => Ok(Self::Available(value)),
            Err(err @ AnalyticsError::InsufficientData { .. }) => Ok(Self::Unavailable {
                reason: err.to_string(),
            }),
            Err(err) => Err(err),
        }
    }

    /// Whether a result is present.
    #[must_use]
    pub const fn is_available(&self) -> bool {
        matches!(self, Self::Available(_))
    }

    /// Borrow the result, if present.
    #[must_use]
    pub const fn detail(&self) -> Option<&T> {
        match self {
            Self::Available(value) => Some(value),
            Self::Unavailable { .. } => None,
        }
    }

    /// Reason the result is missing, if it is.
    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Available(_) => None,
            Self::Unavailable { reason } => Some(reason),
        }
    }
}

#[derive(Serialize, Deserialize)]
struct SignalRepr<T> {
    available: bool,
    #[serde(default = "Option::default", skip_serializing_if = "Option::is_none")]
    detail: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
}

impl<T: Serialize> Serialize for Signal<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let repr = SignalRepr {
            available: self.is_available(),
            detail: self.detail(),
            reason: self.reason().map(str::to_string),
        };
        repr.serialize(serializer)
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Signal<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let repr = SignalRepr::<T>::deserialize(deserializer)?;
        match (repr.available, repr.detail) {
            (true, Some(detail)) => Ok(Self::Available(detail)),
            (true, None) => Err(de::Error::missing_field("detail")),
            (false, _) => Ok(Self::Unavailable {
                reason: repr.reason.unwrap_or_default(),
            }),
        }
    }
}
