//! Unified error type for the entire application.
//!
//! All fallible operations in FormFold return [`FormFoldError`], which
//! centralizes the error taxonomy: per-field validation failures (collected,
//! never fail-fast), missing records, storage faults, and identifier
//! conflicts. Conversions from the underlying sled/serde/io errors are
//! provided so `?` works throughout the stores.

use std::io;
use thiserror::Error;

/// A single field-level validation failure.
///
/// Validation runs over every field independently and collects all failures
/// before reporting, so a submitter sees every problem at once.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FieldError {
    /// Id of the field definition that failed validation
    pub field_id: String,
    /// Human-readable description of the failure
    pub message: String,
}

impl FieldError {
    pub fn new(field_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field_id: field_id.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field_id, self.message)
    }
}

/// Unified error type for FormFold operations.
#[derive(Debug, Error)]
pub enum FormFoldError {
    /// One or more fields failed validation. Recoverable; surfaced to the
    /// submitter as a list.
    #[error("Validation failed for {} field(s)", .0.len())]
    Validation(Vec<FieldError>),

    /// A schema, submission, attachment or export was not found (or, for
    /// exports, has expired and is treated as absent).
    #[error("Not found: {0}")]
    NotFound(String),

    /// Underlying datastore or filesystem failure. Logged with detail;
    /// messages here never carry internal paths or credentials.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Identifier collision that survived bounded retries (e.g. share
    /// token generation).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Errors related to serialization/deserialization
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Errors related to IO operations
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl FormFoldError {
    /// Convenience constructor for a single-field validation failure.
    pub fn invalid_field(field_id: impl Into<String>, message: impl Into<String>) -> Self {
        FormFoldError::Validation(vec![FieldError::new(field_id, message)])
    }

    /// The collected field errors, if this is a validation failure.
    pub fn field_errors(&self) -> Option<&[FieldError]> {
        match self {
            FormFoldError::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}

impl From<sled::Error> for FormFoldError {
    fn from(error: sled::Error) -> Self {
        FormFoldError::Storage(error.to_string())
    }
}

impl From<serde_json::Error> for FormFoldError {
    fn from(error: serde_json::Error) -> Self {
        FormFoldError::Serialization(error.to_string())
    }
}

impl From<Vec<FieldError>> for FormFoldError {
    fn from(errors: Vec<FieldError>) -> Self {
        FormFoldError::Validation(errors)
    }
}

/// Result type alias for operations that can result in a FormFoldError
pub type FormFoldResult<T> = Result<T, FormFoldError>;
