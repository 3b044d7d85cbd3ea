//! Error types for the dose_core library.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for dose_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// A numeric input was non-finite, negative, or zero where positivity is required
    #[error("Invalid input for {field}: {reason}")]
    InvalidInput { field: &'static str, reason: String },

    /// Time-until query on a score the logarithm is undefined for
    #[error("Undefined decay query: {0}")]
    UndefinedDecayQuery(String),

    /// State management error
    #[error("State error: {0}")]
    State(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Error::InvalidInput {
            field,
            reason: reason.into(),
        }
    }
}

/// Require a finite, strictly positive value
pub(crate) fn require_positive(field: &'static str, value: f64) -> Result<f64> {
    if !value.is_finite() {
        return Err(Error::invalid(field, format!("{} is not finite", value)));
    }
    if value <= 0.0 {
        return Err(Error::invalid(field, format!("{} must be positive", value)));
    }
    Ok(value)
}
