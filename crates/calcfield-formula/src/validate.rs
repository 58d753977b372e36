//! Editor-time formula validation

use crate::evaluator::{check_expression, evaluate_ast};
use crate::parser::parse_expression;
use crate::reference::extract_dependencies_with;
use crate::rewrite::rewrite_formula;
use calcfield_core::Field;

/// Outcome of [`validate_formula`]
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FormulaValidation {
    /// No errors were found
    pub is_valid: bool,
    /// Problems, in the order found
    pub errors: Vec<String>,
    /// Field names the formula reads
    pub dependencies: Vec<String>,
}

/// Check a formula against the fields it may reference
///
/// Every reference must name a numeric field in `available_fields`, and the
/// expression must parse and evaluate with `1` substituted for every
/// dependency. Non-finite smoke-test results are accepted, since they depend
/// on the placeholder values.
///
/// # Example
/// ```rust
/// use calcfield_core::{Field, FieldType};
/// use calcfield_formula::validate_formula;
///
/// let fields = vec![
///     Field::input("qty", FieldType::Number),
///     Field::input("notes", FieldType::Text),
/// ];
/// assert!(validate_formula("{qty} * 2", &fields).is_valid);
/// assert!(!validate_formula("{notes} * 2", &fields).is_valid);
/// ```
pub fn validate_formula(formula: &str, available_fields: &[Field]) -> FormulaValidation {
    let mut errors = Vec::new();
    let dependencies =
        extract_dependencies_with(formula, |n| available_fields.iter().any(|f| f.name == n));

    if formula.trim().is_empty() {
        errors.push("Formula is empty".to_string());
    }

    for name in &dependencies {
        match available_fields.iter().find(|f| &f.name == name) {
            None => errors.push(format!("Field '{}' not found", name)),
            Some(field) if !field.field_type.is_numeric() => errors.push(format!(
                "Field '{}' is of type {} and cannot be used in calculations",
                name,
                field.field_type.as_str()
            )),
            Some(_) => {}
        }
    }

    if errors.is_empty() {
        let rewritten = rewrite_formula(formula, |name| {
            dependencies.iter().any(|d| d == name).then_some(1.0)
        });
        let smoke_test = check_expression(&rewritten.expression)
            .and_then(|_| parse_expression(&rewritten.expression))
            .and_then(|ast| evaluate_ast(&ast));
        if let Err(e) = smoke_test {
            errors.push(format!("Invalid formula: {}", e));
        }
    }

    FormulaValidation {
        is_valid: errors.is_empty(),
        errors,
        dependencies,
    }
}
