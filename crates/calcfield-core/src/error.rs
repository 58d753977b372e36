//! Error types for calcfield-core

use thiserror::Error;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while validating a field set
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Two fields share the same name
    #[error("Duplicate field name: {0}")]
    DuplicateField(String),

    /// Field name is empty, padded with whitespace or contains braces
    #[error("Invalid field name: {0:?}")]
    InvalidFieldName(String),

    /// Field does not exist in the field set
    #[error("Field not found: {0}")]
    FieldNotFound(String),

    /// Operation requires a calculated field
    #[error("Field is not a calculated field: {0}")]
    NotCalculated(String),
}
