//! Error types for the Fieldmap core library
//!
//! This module defines the error handling system for the mapping engine,
//! using thiserror for ergonomic error definitions and anyhow for flexible error contexts.
//!
//! Most engine failures are not errors: a missing transformation is
//! an `Incompatible` classification and a failing transformation leaves the value
//! untouched. The variants here cover boundary validation, registration and
//! configuration mistakes, and benchmark control flow.

use crate::transformer::TransformationError;
use thiserror::Error;

/// Main error type for Fieldmap operations
#[derive(Error, Debug)]
pub enum Error {
    /// A field kind name that is not part of the closed kind set
    #[error("Unknown field kind: '{name}'")]
    UnknownFieldKind { name: String },

    /// Two fields with the same id in one field set
    #[error("Duplicate field id '{id}' in {set} field set")]
    DuplicateField { id: String, set: String },

    /// Transformation registration rejected
    #[error("Cannot register transformation '{id}': {message}")]
    Registration { id: String, message: String },

    /// No transformation registered under this id
    #[error("Transformation not found: {id}")]
    TransformationNotFound { id: String },

    /// A transformation function failed
    #[error("Transformation '{id}' failed: {source}")]
    Transformation {
        id: String,
        #[source]
        source: TransformationError,
    },

    /// Invalid cache or engine configuration
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Invalid benchmark parameters
    #[error("Invalid benchmark for '{transformation_id}': {message}")]
    InvalidBenchmark {
        transformation_id: String,
        message: String,
    },

    /// A background benchmark was cancelled before completing
    #[error("Benchmark cancelled after {completed} of {total} runs")]
    Cancelled { completed: usize, total: usize },

    /// JSON parsing and serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: serde_json::Error,
    },

    /// CSV writing errors
    #[error("CSV error: {message}")]
    Csv {
        message: String,
        #[source]
        source: csv::Error,
    },

    /// IO errors
    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Generic internal error with context
    #[error("Internal error: {message}")]
    Internal {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

/// Convenience type alias for Results using our Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Error::Configuration {
            message: message.into(),
        }
    }

    /// Create a registration error for the given transformation id
    pub fn registration(id: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Registration {
            id: id.into(),
            message: message.into(),
        }
    }
}

// Conversion implementations
impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<csv::Error> for Error {
    fn from(err: csv::Error) -> Self {
        Error::Csv {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Internal {
            message: err.to_string(),
            source: err,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::UnknownFieldKind {
            name: "hologram".to_string(),
        };
        assert_eq!(err.to_string(), "Unknown field kind: 'hologram'");
    }

    #[test]
    fn test_registration_error() {
        let err = Error::registration("text_to_title", "pair is directly compatible");
        assert!(err.to_string().contains("text_to_title"));
        assert!(err.to_string().contains("directly compatible"));
    }

    #[test]
    fn test_transformation_error_source() {
        use std::error::Error as _;

        let err = Error::Transformation {
            id: "text_to_multi_select".to_string(),
            source: TransformationError::InvalidOption {
                option: "separator".to_string(),
                expected: "string".to_string(),
            },
        };
        assert!(err.source().is_some());
        assert!(err.to_string().contains("text_to_multi_select"));
    }

    #[test]
    fn test_cancelled_display() {
        let err = Error::Cancelled { completed: 2, total: 5 };
        assert_eq!(err.to_string(), "Benchmark cancelled after 2 of 5 runs");
    }
}
