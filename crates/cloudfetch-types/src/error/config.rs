//! Configuration-related errors.

use thiserror::Error;

/// Errors raised while assembling the runtime configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Config validation error (invalid values)
    #[error("Config validation error for {field}: {message}")]
    ValidationError {
        /// Name of the field that failed validation
        field: String,
        /// Description of the validation failure
        message: String,
    },

    /// The outbound HTTP client could not be constructed
    #[error("HTTP client error: {message}")]
    ClientBuild {
        /// Description of the builder failure
        message: String,
    },
}
