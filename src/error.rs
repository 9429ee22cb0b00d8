//! Error types for parameter validation.
//!
//! Degenerate but finite inputs (zero budget, radius <= 0, no platforms) are
//! legitimate terminal states and never surface here.

use std::fmt;

/// Errors that can occur when configuring a bridge session.
#[derive(Debug, Clone, PartialEq)]
pub enum BridgeError {
    /// A parameter must be a finite number.
    NonFinite { name: &'static str, value: f32 },
    /// A percentage parameter must lie in [0, 100].
    PercentOutOfRange { name: &'static str, value: f32 },
    /// Growth speed must lie in [1, 10].
    GrowthSpeedOutOfRange { value: u32 },
    /// The parameter bag coming from the host could not be decoded.
    InvalidParams(String),
}

impl fmt::Display for BridgeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BridgeError::NonFinite { name, value } => {
                write!(f, "{} must be finite (got {})", name, value)
            }
            BridgeError::PercentOutOfRange { name, value } => {
                write!(f, "{} must be in [0, 100] (got {})", name, value)
            }
            BridgeError::GrowthSpeedOutOfRange { value } => {
                write!(f, "growth speed must be in [1, 10] (got {})", value)
            }
            BridgeError::InvalidParams(message) => write!(f, "invalid parameters: {}", message),
        }
    }
}

impl std::error::Error for BridgeError {}

/// Reject NaN and infinities.
pub(crate) fn ensure_finite(name: &'static str, value: f32) -> Result<(), BridgeError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(BridgeError::NonFinite { name, value })
    }
}

/// Reject values outside [0, 100] (NaN included).
pub(crate) fn ensure_percent(name: &'static str, value: f32) -> Result<(), BridgeError> {
    if (0.0..=100.0).contains(&value) {
        Ok(())
    } else {
        Err(BridgeError::PercentOutOfRange { name, value })
    }
}
