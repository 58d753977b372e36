//! Formula error types

use thiserror::Error;

/// Result type for formula operations
pub type FormulaResult<T> = std::result::Result<T, FormulaError>;

/// Errors that can occur while rewriting, parsing, evaluating or scheduling formulas
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormulaError {
    /// Expression could not be parsed
    #[error("Parse error: {0}")]
    Parse(String),

    /// Expression failed the parenthesis-balance or character check
    #[error("Malformed expression: {0}")]
    MalformedExpression(String),

    /// Unknown function or identifier
    #[error("Unknown function: {0}")]
    UnknownFunction(String),

    /// Wrong number of arguments
    #[error("Wrong number of arguments for {function}: expected {expected}, got {actual}")]
    ArgumentCount {
        function: String,
        expected: String,
        actual: usize,
    },

    /// Evaluation produced NaN or an infinity (e.g. division by zero)
    #[error("Result is not a finite number: {0}")]
    NonFiniteResult(f64),

    /// Formula references a field that is not in the field set
    #[error("Unresolved field reference: {{{0}}}")]
    UnresolvedReference(String),

    /// Calculated fields reference each other in a cycle
    #[error("Circular dependency detected at field {field}")]
    CircularDependency { field: String },

    /// Expression nests deeper than the parser or evaluator allows
    #[error("Expression nesting depth exceeds maximum of {0}")]
    MaxDepthExceeded(usize),

    /// Expression has more tokens than the parser accepts
    #[error("Expression exceeds maximum of {0} tokens")]
    MaxTokensExceeded(usize),
}
