//! Field reference extraction
//!
//! Formulas reference other fields as `{name}`. Surrounding whitespace inside
//! the braces is ignored.

use crate::functions;
use regex::Regex;

pub(crate) fn reference_pattern() -> &'static Regex {
    lazy_regex::regex!(r"\{([^{}]+)\}")
}

/// Every `{name}` reference in a formula, in order of first appearance, without duplicates
pub fn extract_references(formula: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for caps in reference_pattern().captures_iter(formula) {
        let name = caps[1].trim();
        if !name.is_empty() && !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }
    names
}

/// The references that count as graph edges when no fields are known
///
/// Library names such as `{PI}` are skipped.
pub fn extract_dependencies(formula: &str) -> Vec<String> {
    extract_dependencies_with(formula, |_| false)
}

/// The references that count as graph edges for a field set
///
/// A library name is skipped only when `is_field` says no field of that name
/// exists, so a field called `pi` or `max` is still a dependency.
pub fn extract_dependencies_with<F>(formula: &str, is_field: F) -> Vec<String>
where
    F: Fn(&str) -> bool,
{
    extract_references(formula)
        .into_iter()
        .filter(|name| is_field(name) || !functions::is_function_name(name))
        .collect()
}
