//! Formula rewriting
//!
//! Turns formula source into a field-free expression: each `{name}` is
//! replaced with the field's numeric value and function names are
//! canonicalised to uppercase. Sugar functions are left in place for the
//! parser to expand.

use crate::functions;
use crate::reference::reference_pattern;
use regex::Captures;

/// Result of rewriting a formula
#[derive(Debug, Clone, PartialEq)]
pub struct Rewritten {
    /// Field-free expression ready for [`crate::evaluate`]
    pub expression: String,
    /// Field names substituted, in order of first appearance
    pub references: Vec<String>,
    /// References the resolver could not find (substituted as `0`)
    pub unresolved: Vec<String>,
}

impl Rewritten {
    /// Whether every reference resolved
    pub fn is_fully_resolved(&self) -> bool {
        self.unresolved.is_empty()
    }
}

/// Rewrite a formula, resolving references through `resolve`
///
/// `resolve` returns `None` for names that are not fields. Unresolved names
/// are logged and read as `0`, except library names such as `{PI}`, which
/// become the bare function name.
///
/// # Example
/// ```rust
/// use calcfield_formula::rewrite_formula;
///
/// let out = rewrite_formula("round({a} / {b})", |name| match name {
///     "a" => Some(7.0),
///     "b" => Some(-2.0),
///     _ => None,
/// });
/// assert_eq!(out.expression, "ROUND(7 / (-2))");
/// ```
pub fn rewrite_formula<F>(formula: &str, mut resolve: F) -> Rewritten
where
    F: FnMut(&str) -> Option<f64>,
{
    let mut references: Vec<String> = Vec::new();
    let mut unresolved: Vec<String> = Vec::new();

    let substituted = reference_pattern().replace_all(formula, |caps: &Captures| {
        let name = caps[1].trim();
        if !references.iter().any(|r| r == name) {
            references.push(name.to_string());
        }
        match resolve(name) {
            Some(value) => format_literal(value),
            None if functions::is_function_name(name) => name.to_string(),
            None => {
                if !unresolved.iter().any(|r| r == name) {
                    tracing::warn!(field = %name, "unresolved field reference, using 0");
                    unresolved.push(name.to_string());
                }
                "0".to_string()
            }
        }
    });

    let expression = canonicalize_function_names(&substituted);

    Rewritten {
        expression,
        references,
        unresolved,
    }
}

/// Uppercase every whole-word function name, leaving other words untouched
pub fn canonicalize_function_names(expression: &str) -> String {
    lazy_regex::regex!(r"\b[A-Za-z_][A-Za-z0-9_]*")
        .replace_all(expression, |caps: &Captures| {
            let word = &caps[0];
            if functions::is_function_name(word) {
                word.to_ascii_uppercase()
            } else {
                word.to_string()
            }
        })
        .into_owned()
}

/// Render a value as a literal the parser reads back exactly
fn format_literal(value: f64) -> String {
    if !value.is_finite() {
        "0".to_string()
    } else if value < 0.0 {
        format!("({})", value)
    } else {
        format!("{}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn values(pairs: &[(&str, f64)]) -> HashMap<String, f64> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_substitutes_references() {
        let vals = values(&[("quantidade", 3.0), ("preco_unitario", 12.5)]);
        let out = rewrite_formula("{quantidade} * {preco_unitario}", |n| vals.get(n).copied());
        assert_eq!(out.expression, "3 * 12.5");
        assert_eq!(out.references, vec!["quantidade", "preco_unitario"]);
        assert!(out.is_fully_resolved());
    }

    #[test]
    fn test_unresolved_reads_as_zero() {
        let out = rewrite_formula("{nonexistent} + 1", |_| None);
        assert_eq!(out.expression, "0 + 1");
        assert_eq!(out.unresolved, vec!["nonexistent"]);
    }

    #[test]
    fn test_negative_values_are_parenthesized() {
        let vals = values(&[("a", -4.0)]);
        let out = rewrite_formula("-{a}", |n| vals.get(n).copied());
        assert_eq!(out.expression, "-(-4)");
    }

    #[test]
    fn test_function_names_canonicalized_whole_word() {
        let vals = values(&[("sqrt_area", 9.0)]);
        let out = rewrite_formula("sqrt({sqrt_area}) + if(1, pi, e) + Mod(5, 2)", |n| {
            vals.get(n).copied()
        });
        assert_eq!(out.expression, "SQRT(9) + IF(1, PI, E) + MOD(5, 2)");
    }

    #[test]
    fn test_exponent_literals_untouched() {
        assert_eq!(canonicalize_function_names("1e3 + e"), "1e3 + E");
    }

    #[test]
    fn test_library_name_reference() {
        let out = rewrite_formula("{pi} * 2", |_| None);
        assert_eq!(out.expression, "PI * 2");
        assert!(out.is_fully_resolved());
    }
}
