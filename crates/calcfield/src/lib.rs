//! # calcfield
//!
//! Calculated fields for dynamic forms.
//!
//! A calculated field's value comes from an arithmetic formula over other
//! fields, written with `{field_name}` placeholders. The engine orders the
//! calculated fields by their dependencies, rejects cycles, caches computed
//! values and recomputes only what an input change affects.
//!
//! ## Features
//!
//! - Formula language: `+ - * / %`, comparisons, `cond ? a : b`, and a math
//!   function library (`ABS`, `ROUND`, `SQRT`, `MIN`, `MAX`, `IF`, ...)
//! - Expressions are parsed into an AST and evaluated; nothing is executed
//! - Dependency graph with topological calculation order and cycle detection
//! - Incremental recalculation on value updates
//! - Locale-aware formatting of results (number, currency, percentage, custom)
//!
//! ## Example
//!
//! ```rust
//! use calcfield::prelude::*;
//!
//! let fields = vec![
//!     Field::input("price", FieldType::Currency),
//!     Field::input("quantity", FieldType::Number),
//!     Field::calculated("total", "{price} * {quantity}").with_format(FormatSpec::currency()),
//! ];
//! let values: ValueMap = [("price", 12.5), ("quantity", 4.0)].into_iter().collect();
//!
//! let mut engine = CalculationEngine::new(fields, values).unwrap();
//! assert_eq!(engine.calculated_value("total"), Some(50.0));
//! assert_eq!(engine.format_field("total").unwrap(), "R$\u{a0}50,00");
//! ```

pub mod engine;
pub mod error;
pub mod prelude;

pub use engine::{CalculationEngine, CalculationStats, EngineOptions};
pub use error::{Error, Result};

// Re-export core types
pub use calcfield_core::{
    check_field_names, Field, FieldKind, FieldType, FormatSpec, FormatType, RawValue, ValueMap,
};

// Re-export formula types
pub use calcfield_formula::{
    evaluate, extract_dependencies, extract_references, parse_expression, rewrite_formula,
    try_evaluate, validate_formula, DependencyGraph, Expr, FormulaError, FormulaValidation,
};

// Re-export formatting
pub use calcfield_format::{
    format_number, format_value, format_value_with_locale, get_locale, Locale,
};
