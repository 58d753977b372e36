//! # calcfield-formula
//!
//! Formula language for calculated fields.
//!
//! This crate provides:
//! - Field reference extraction (`{name}`)
//! - Formula rewriting (references → numeric literals)
//! - Expression parsing (text → AST) and safe evaluation (AST → number)
//! - The built-in numeric function library
//! - Dependency tracking and calculation order
//! - Editor-time formula validation
//!
//! ## Example
//!
//! ```rust
//! use calcfield_formula::{evaluate, rewrite_formula};
//!
//! let rewritten = rewrite_formula("{quantidade} * {preco_unitario}", |name| match name {
//!     "quantidade" => Some(3.0),
//!     "preco_unitario" => Some(12.5),
//!     _ => None,
//! });
//! assert_eq!(evaluate(&rewritten.expression), 37.5);
//! ```

pub mod ast;
pub mod dependency;
pub mod error;
pub mod evaluator;
pub mod functions;
pub mod parser;
pub mod reference;
pub mod rewrite;
pub mod validate;

pub use ast::{BinaryOperator, Expr, UnaryOperator};
pub use dependency::DependencyGraph;
pub use error::{FormulaError, FormulaResult};
pub use evaluator::{check_expression, evaluate, evaluate_ast, try_evaluate, MAX_EXPRESSION_DEPTH};
pub use parser::{parse_expression, MAX_NESTING_DEPTH, MAX_TOKENS};
pub use reference::{extract_dependencies, extract_dependencies_with, extract_references};
pub use rewrite::{rewrite_formula, Rewritten};
pub use validate::{validate_formula, FormulaValidation};
