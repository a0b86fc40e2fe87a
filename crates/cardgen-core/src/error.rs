//! Error types for card generator core operations.
//!
//! This module defines the error hierarchy for all core operations.
//! Errors are descriptive at the core level; the CLI layer maps these
//! to user-facing messages and exit codes.
//!
//! Wrapping variants (`Service`, `Downstream`) keep the inner error as their
//! `source()`, so a chain prints from the outermost operation down to the
//! root cause.

use thiserror::Error;

/// Result type alias for card generator operations.
pub type Result<T> = std::result::Result<T, CardgenError>;

/// Core error type for card generator operations.
#[derive(Debug, Error)]
pub enum CardgenError {
    /// The structured configuration document could not be read or parsed
    #[error("Invalid config file {path}: {reason}")]
    ConfigFileInvalid { path: String, reason: String },

    /// The merged configuration failed validation
    #[error("Invalid configuration for {field}: {reason}")]
    ConfigInvalid { field: String, reason: String },

    /// A registration was attempted with a malformed recipe
    #[error("Invalid recipe for service {name}: {reason}")]
    InvalidRecipe { name: String, reason: String },

    /// Resolution requested a name that is not registered
    #[error("Service {0} not registered")]
    Unregistered(String),

    /// The resolved product cannot be assigned to the requested type
    #[error("Service {name} produced {actual}, which is not assignable to {expected}")]
    TypeMismatch {
        name: String,
        expected: &'static str,
        actual: &'static str,
    },

    /// A recipe failed while constructing its product
    #[error("Failed to create instance of {name}")]
    Service {
        name: String,
        #[source]
        source: Box<CardgenError>,
    },

    /// The configured storage type has no store implementation
    #[error("Unsupported storage type: {0}")]
    UnsupportedStorageType(String),

    /// The header row lacks a column every card type needs
    #[error("Missing required column: {0}")]
    MissingRequiredColumn(String),

    /// A required field was empty on a data row
    #[error("Line {line}: {field} is required")]
    FieldRequired { field: String, line: u64 },

    /// A field could not be parsed into its expected type
    #[error("Line {line}: invalid {field} '{value}'")]
    FieldMalformed {
        field: String,
        value: String,
        line: u64,
    },

    /// The requested card type is not one of the five variants
    #[error("Line {line}: unsupported card type: {card_type}")]
    UnsupportedCardType { card_type: String, line: u64 },

    /// The delimited input could not be read
    #[error("Input error: {0}")]
    Input(String),

    /// Entity self-validation failed
    #[error("Validation error: {message} (field: {field})")]
    Validation { field: String, message: String },

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Storage backend error
    #[error("Storage error: {0}")]
    Storage(String),

    /// Image generation error
    #[error("Generator error: {0}")]
    Generator(String),

    /// A failure wrapped with the operation that raised it
    #[error("{context}")]
    Downstream {
        context: String,
        #[source]
        source: Box<CardgenError>,
    },

    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CardgenError {
    /// Build a validation error for an entity field.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        CardgenError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Build a configuration validation error.
    pub fn config_invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        CardgenError::ConfigInvalid {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Wrap an error raised by an external collaborator.
    pub fn downstream(context: impl Into<String>, source: CardgenError) -> Self {
        CardgenError::Downstream {
            context: context.into(),
            source: Box::new(source),
        }
    }

    /// Return the 1-based input line this error refers to, if any.
    pub fn line(&self) -> Option<u64> {
        match self {
            CardgenError::FieldRequired { line, .. }
            | CardgenError::FieldMalformed { line, .. }
            | CardgenError::UnsupportedCardType { line, .. } => Some(*line),
            _ => None,
        }
    }

    /// Walk wrapping variants down to the innermost error.
    pub fn root_cause(&self) -> &CardgenError {
        match self {
            CardgenError::Service { source, .. } | CardgenError::Downstream { source, .. } => {
                source.root_cause()
            }
            other => other,
        }
    }
}

impl From<csv::Error> for CardgenError {
    fn from(err: csv::Error) -> Self {
        CardgenError::Input(err.to_string())
    }
}

impl From<serde_json::Error> for CardgenError {
    fn from(err: serde_json::Error) -> Self {
        CardgenError::Storage(err.to_string())
    }
}

impl From<png::EncodingError> for CardgenError {
    fn from(err: png::EncodingError) -> Self {
        CardgenError::Generator(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_service_error_chains_to_root_cause() {
        let err = CardgenError::Service {
            name: "cardStore".to_string(),
            source: Box::new(CardgenError::Storage("disk full".to_string())),
        };

        assert_eq!(err.to_string(), "Failed to create instance of cardStore");
        let source = err.source().expect("service error has a source");
        assert_eq!(source.to_string(), "Storage error: disk full");
        assert!(matches!(err.root_cause(), CardgenError::Storage(_)));
    }

    #[test]
    fn test_line_is_reported_for_row_errors() {
        let err = CardgenError::FieldRequired {
            field: "Name".to_string(),
            line: 4,
        };
        assert_eq!(err.line(), Some(4));
        assert_eq!(err.to_string(), "Line 4: Name is required");
        assert_eq!(CardgenError::NotFound("x".into()).line(), None);
    }
}
