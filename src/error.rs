//! Error types for binosim.
//!
//! All fallible operations return `Result<T, SimError>` instead of panicking.
//! Rejected parameter input is a recoverable condition: the store keeps its
//! last valid value and reports the rejection through this type.

use thiserror::Error;

/// Result type alias for binosim operations.
pub type SimResult<T> = Result<T, SimError>;

/// Unified error type for all binosim operations.
#[derive(Debug, Error)]
pub enum SimError {
    // ===== Parameter Errors =====
    /// Parameter input rejected by the parameter store.
    #[error("Invalid parameter '{field}': {reason}")]
    InvalidParameter {
        /// Name of the rejected parameter.
        field: &'static str,
        /// Why the input was rejected.
        reason: String,
    },

    // ===== Run Errors =====
    /// An emitted experiment failed the run-loop guard.
    #[error("Run guard: experiment {experiment} rejected: {reason}")]
    GuardViolation {
        /// Experiment number that failed the guard.
        experiment: u64,
        /// Description of the violated check.
        reason: String,
    },

    // ===== Configuration Errors =====
    /// Invalid configuration parameter.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    /// YAML parsing error.
    #[error("YAML parsing error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    /// Validation error.
    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    // ===== I/O Errors =====
    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl SimError {
    /// Create a configuration error with a message.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an invalid parameter error.
    #[must_use]
    pub fn invalid_parameter(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            field,
            reason: reason.into(),
        }
    }

    /// Create a serialization error.
    #[must_use]
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization(message.into())
    }

    /// Create an I/O error with a message (wraps in `std::io::Error`).
    #[must_use]
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io(std::io::Error::other(message.into()))
    }

    /// Check if this error aborted a run (forces the run back to idle).
    #[must_use]
    pub const fn is_run_fault(&self) -> bool {
        matches!(self, Self::GuardViolation { .. })
    }
}
