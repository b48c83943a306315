//! Custom error types for Keepsake
//!
//! This module defines the error hierarchy for the document core using
//! thiserror. Every failure is surfaced to the caller as a structured value.

use std::path::Path;

use thiserror::Error;

/// The main error type for Keepsake operations
#[derive(Error, Debug)]
pub enum KeepsakeError {
    /// Underlying filesystem failure
    #[error("I/O error on {path}: {message}")]
    Io { path: String, message: String },

    /// The document text could not be parsed
    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    /// A required root field is absent
    #[error("Missing field: {0}")]
    MissingField(String),

    /// A field exists but has the wrong shape
    #[error("Field '{name}' has the wrong type, expected {expected}")]
    TypeMismatch { name: String, expected: &'static str },

    /// The addressed node does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Add or rename would collide with an existing key
    #[error("Key '{key}' already exists under '{parent}'")]
    DuplicateKey { parent: String, key: String },

    /// Remove would leave too few siblings behind
    #[error("Cannot remove from '{parent}': at least {floor} entries must remain")]
    UnderMin { parent: String, floor: usize },

    /// Text could not be coerced into the target leaf type
    #[error("Cannot store '{text}' at '{path}' as {kind}")]
    TypeCoercion {
        path: String,
        kind: &'static str,
        text: String,
    },

    /// Encryption key is empty
    #[error("Encryption key is missing")]
    MissingKey,

    /// Encryption salt is empty
    #[error("Encryption salt is missing")]
    MissingSalt,

    /// Decryption or tag verification failed
    #[error("Decryption failed: invalid key or corrupted data")]
    BadKeyOrCorrupt,

    /// The container holds a bootstrapped document with nothing to decrypt
    #[error("Container has no stored content")]
    EmptyContainer,

    /// Validation errors for names and inputs
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),
}

impl KeepsakeError {
    /// Wrap an I/O error with the path it concerns
    pub fn io(path: impl AsRef<Path>, err: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().display().to_string(),
            message: err.to_string(),
        }
    }

    /// Create a "duplicate key" error
    pub fn duplicate(parent: impl Into<String>, key: impl Into<String>) -> Self {
        Self::DuplicateKey {
            parent: parent.into(),
            key: key.into(),
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Check if this is a duplicate key error
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::DuplicateKey { .. })
    }
}

impl From<serde_json::Error> for KeepsakeError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidDocument(err.to_string())
    }
}

/// Result type alias for Keepsake operations
pub type KeepsakeResult<T> = Result<T, KeepsakeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = KeepsakeError::Config("test error".into());
        assert_eq!(err.to_string(), "Configuration error: test error");
    }

    #[test]
    fn test_duplicate_error() {
        let err = KeepsakeError::duplicate("UserA.notes", "note");
        assert_eq!(err.to_string(), "Key 'note' already exists under 'UserA.notes'");
        assert!(err.is_duplicate());
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_under_min_error() {
        let err = KeepsakeError::UnderMin {
            parent: String::new(),
            floor: 1,
        };
        assert_eq!(
            err.to_string(),
            "Cannot remove from '': at least 1 entries must remain"
        );
    }

    #[test]
    fn test_io_error_keeps_path() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = KeepsakeError::io("/tmp/secrets.json", io_err);
        match err {
            KeepsakeError::Io { path, message } => {
                assert_eq!(path, "/tmp/secrets.json");
                assert_eq!(message, "file not found");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: KeepsakeError = json_err.into();
        assert!(matches!(err, KeepsakeError::InvalidDocument(_)));
    }
}
