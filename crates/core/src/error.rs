//! Error types for exposure aggregation and level classification.
//!
//! Only misuse is an error here. A snapshot that yields no usable strikes is
//! reported as an empty table or an empty level record, never as an error.

use thiserror::Error;

/// Errors raised by the GEX core.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GexError {
    /// Input that can never produce a meaningful result (non-positive spot,
    /// non-positive multiplier, malformed contract rows).
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl GexError {
    /// Creates an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Returns true if the error was caused by bad caller input.
    #[must_use]
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Self::InvalidInput(_))
    }
}

/// Result type alias for GEX core operations.
pub type Result<T> = std::result::Result<T, GexError>;
