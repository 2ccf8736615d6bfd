//! Error types for the maxdiff library.
//!
//! Fatal conditions are variants of [`Error`]. Non-fatal findings (balance
//! warnings, optimizer fallback notes) never surface here; they travel on
//! the returned result instead.

use thiserror::Error;

/// The main error type for the maxdiff library.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    // ============ Configuration Errors ============
    /// Settings are out of range or inconsistent with the item set.
    #[error("configuration error: {message}")]
    Configuration {
        /// Description of what is invalid.
        message: String,
    },

    /// The item list itself is malformed.
    #[error("invalid item list: {message}")]
    InvalidItems {
        /// Description of what is invalid.
        message: String,
    },

    // ============ Generation Errors ============
    /// No candidate design could be produced at all.
    #[error("design generation failed: {message}")]
    GenerationFailed {
        /// Description of why generation failed.
        message: String,
    },

    /// The exchange optimizer is not available.
    #[error("optimizer unavailable: {reason}")]
    OptimizerUnavailable {
        /// Why the optimizer could not be used.
        reason: String,
    },

    /// The exchange optimizer ran but did not produce a usable selection.
    #[error("optimizer failed: {message}")]
    OptimizerFailed {
        /// Description of the failure.
        message: String,
    },

    // ============ Validation Errors ============
    /// The design is structurally unusable (missing values, duplicates,
    /// unknown item ids, broken task numbering).
    #[error("structural validation failed: {message}")]
    StructuralValidation {
        /// One line per violated invariant.
        message: String,
    },

    /// Item frequencies are too unequal to analyse.
    #[error(
        "balance refusal: item '{most_shown}' shown {max} times vs '{least_shown}' shown {min} times \
         (ratio {ratio:.2} exceeds 3:1)"
    )]
    BalanceRefusal {
        /// Most frequently shown item.
        most_shown: String,
        /// Its frequency.
        max: usize,
        /// Least frequently shown included item; `min` is 0 if it never appears.
        least_shown: String,
        /// Its frequency.
        min: usize,
        /// `max / min`, infinite when `min` is 0.
        ratio: f64,
    },
}

/// A specialized `Result` type for maxdiff operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    /// Create a new `Configuration` error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a new `InvalidItems` error.
    #[must_use]
    pub fn invalid_items(message: impl Into<String>) -> Self {
        Self::InvalidItems {
            message: message.into(),
        }
    }

    /// Create a new `GenerationFailed` error.
    #[must_use]
    pub fn generation_failed(message: impl Into<String>) -> Self {
        Self::GenerationFailed {
            message: message.into(),
        }
    }

    /// Create a new `OptimizerUnavailable` error.
    #[must_use]
    pub fn optimizer_unavailable(reason: impl Into<String>) -> Self {
        Self::OptimizerUnavailable {
            reason: reason.into(),
        }
    }

    /// Create a new `OptimizerFailed` error.
    #[must_use]
    pub fn optimizer_failed(message: impl Into<String>) -> Self {
        Self::OptimizerFailed {
            message: message.into(),
        }
    }

    /// Create a new `StructuralValidation` error.
    #[must_use]
    pub fn structural(message: impl Into<String>) -> Self {
        Self::StructuralValidation {
            message: message.into(),
        }
    }

    /// Whether the caller may recover by switching strategy.
    ///
    /// Only optimizer problems are recoverable; the Optimal strategy handles
    /// them itself by falling back to the Balanced search.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::OptimizerUnavailable { .. } | Self::OptimizerFailed { .. }
        )
    }
}
