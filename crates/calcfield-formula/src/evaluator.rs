//! Safe evaluator
//!
//! Evaluates rewritten expressions. Input is checked for balanced
//! parentheses and a narrow character set, then parsed into an [`Expr`] and
//! walked directly; nothing is ever executed as code.

use crate::ast::{BinaryOperator, Expr, UnaryOperator};
use crate::error::{FormulaError, FormulaResult};
use crate::functions::{self, sugar::SugarFunction};
use crate::parser::parse_expression;

/// Evaluate a rewritten expression, returning `0` on any failure
///
/// Failures (malformed input, unknown functions, NaN or infinite results)
/// are logged and never propagated.
///
/// # Example
/// ```rust
/// use calcfield_formula::evaluate;
///
/// assert_eq!(evaluate("2 + 3 * 4"), 14.0);
/// assert_eq!(evaluate("IF(10 > 5, 1, 2)"), 1.0);
/// assert_eq!(evaluate("10 / 0"), 0.0);
/// ```
pub fn evaluate(expression: &str) -> f64 {
    match try_evaluate(expression) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(%expression, error = %e, "formula evaluation failed, using 0");
            0.0
        }
    }
}

/// Evaluate a rewritten expression, reporting why it failed
pub fn try_evaluate(expression: &str) -> FormulaResult<f64> {
    check_expression(expression)?;
    let ast = parse_expression(expression)?;
    let value = evaluate_ast(&ast)?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(FormulaError::NonFiniteResult(value))
    }
}

/// Reject expressions with unbalanced parentheses or characters outside the whitelist
pub fn check_expression(expression: &str) -> FormulaResult<()> {
    let mut depth: i64 = 0;
    for (pos, c) in expression.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth < 0 {
                    return Err(FormulaError::MalformedExpression(format!(
                        "Unmatched ')' at position {}",
                        pos
                    )));
                }
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(FormulaError::MalformedExpression(format!(
            "{} unclosed '('",
            depth
        )));
    }

    if !lazy_regex::regex_is_match!(r"^[0-9+\-*/%.,()?:<>=\sA-Za-z_]*$", expression) {
        return Err(FormulaError::MalformedExpression(format!(
            "Disallowed characters in '{}'",
            expression
        )));
    }

    Ok(())
}

/// Deepest tree [`evaluate_ast`] will walk
pub const MAX_EXPRESSION_DEPTH: usize = 1_000;

/// Evaluate a parsed expression
///
/// Intermediate and final values may be NaN or infinite; only
/// [`try_evaluate`] rejects non-finite results. Trees deeper than
/// [`MAX_EXPRESSION_DEPTH`] are rejected before evaluation.
pub fn evaluate_ast(expr: &Expr) -> FormulaResult<f64> {
    if expr.depth() > MAX_EXPRESSION_DEPTH {
        return Err(FormulaError::MaxDepthExceeded(MAX_EXPRESSION_DEPTH));
    }
    eval_node(expr)
}

fn eval_node(expr: &Expr) -> FormulaResult<f64> {
    match expr {
        Expr::Number(n) => Ok(*n),

        Expr::UnaryOp { op, operand } => {
            let value = eval_node(operand)?;
            Ok(match op {
                UnaryOperator::Negate => -value,
                UnaryOperator::Plus => value,
            })
        }

        Expr::BinaryOp { op, left, right } => {
            let left = eval_node(left)?;
            let right = eval_node(right)?;
            Ok(apply_binary(*op, left, right))
        }

        Expr::Conditional {
            condition,
            then_branch,
            else_branch,
        } => {
            if is_truthy(eval_node(condition)?) {
                eval_node(then_branch)
            } else {
                eval_node(else_branch)
            }
        }

        Expr::Function { name, args } => evaluate_function(name, args),
    }
}

fn apply_binary(op: BinaryOperator, left: f64, right: f64) -> f64 {
    match op {
        BinaryOperator::Add => left + right,
        BinaryOperator::Subtract => left - right,
        BinaryOperator::Multiply => left * right,
        BinaryOperator::Divide => left / right,
        BinaryOperator::Modulo => left % right,
        BinaryOperator::Equal => bool_to_number(left == right),
        BinaryOperator::LessThan => bool_to_number(left < right),
        BinaryOperator::LessEqual => bool_to_number(left <= right),
        BinaryOperator::GreaterThan => bool_to_number(left > right),
        BinaryOperator::GreaterEqual => bool_to_number(left >= right),
    }
}

fn evaluate_function(name: &str, args: &[Expr]) -> FormulaResult<f64> {
    let values = args
        .iter()
        .map(eval_node)
        .collect::<FormulaResult<Vec<f64>>>()?;

    if let Some(def) = functions::lookup(name) {
        if !def.accepts(values.len()) {
            return Err(FormulaError::ArgumentCount {
                function: def.name.to_string(),
                expected: def.arity_description(),
                actual: values.len(),
            });
        }
        return Ok((def.implementation)(&values));
    }

    let sugar = SugarFunction::from_name(name)
        .ok_or_else(|| FormulaError::UnknownFunction(name.to_string()))?;
    match (sugar.apply(values.first().copied().unwrap_or(0.0)), values.len()) {
        (Some(value), 1) => Ok(value),
        _ => Err(FormulaError::ArgumentCount {
            function: sugar.name().to_string(),
            expected: sugar.arity().to_string(),
            actual: values.len(),
        }),
    }
}

fn is_truthy(value: f64) -> bool {
    value != 0.0 && !value.is_nan()
}

fn bool_to_number(b: bool) -> f64 {
    if b {
        1.0
    } else {
        0.0
    }
}
