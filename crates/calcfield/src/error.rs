//! Error types for the calcfield engine

use calcfield_formula::FormulaError;
use thiserror::Error;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that stop an engine from being built for a field set
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Invalid field set (duplicate or malformed names)
    #[error(transparent)]
    Field(#[from] calcfield_core::Error),

    /// Formula-level failure, e.g. a circular dependency
    #[error(transparent)]
    Formula(#[from] FormulaError),
}

impl Error {
    /// Whether this is a circular dependency between calculated fields
    pub fn is_circular_dependency(&self) -> bool {
        matches!(self, Error::Formula(FormulaError::CircularDependency { .. }))
    }
}
