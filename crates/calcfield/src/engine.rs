//! Calculation engine
//!
//! One [`CalculationEngine`] per form session. It owns the working copy of
//! the form's values, the dependency graph and calculation order of its
//! calculated fields, and a cache of computed values.
//!
//! # Example
//!
//! ```rust
//! use calcfield::prelude::*;
//!
//! let fields = vec![
//!     Field::input("a", FieldType::Number),
//!     Field::calculated("b", "{a} * 2"),
//!     Field::calculated("c", "{b} + 1"),
//! ];
//! let values: ValueMap = [("a", 2.0)].into_iter().collect();
//!
//! let mut engine = CalculationEngine::new(fields, values).unwrap();
//! assert_eq!(engine.calculated_value("c"), Some(5.0));
//!
//! engine.update_value("a", 10.0);
//! assert_eq!(engine.calculated_value("b"), Some(20.0));
//! assert_eq!(engine.calculated_value("c"), Some(21.0));
//! ```

use crate::error::Result;
use ahash::{AHashMap, AHashSet};
use calcfield_core::{check_field_names, Error as FieldError, Field, FormatSpec, RawValue, ValueMap};
use calcfield_format::{format_value_with_locale, get_locale, Locale, PT_BR};
use calcfield_formula::{
    extract_references, rewrite_formula, try_evaluate, validate_formula, DependencyGraph,
    FormulaError, FormulaValidation,
};

/// Options for a calculation engine
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Locale tag used by [`CalculationEngine::format_field`] (default: `pt-BR`)
    pub locale: String,
    /// Add references found in formula text to the declared dependencies (default: true)
    pub derive_dependencies: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            locale: PT_BR.id.to_string(),
            derive_dependencies: true,
        }
    }
}

/// Statistics from the most recent recalculation pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CalculationStats {
    /// Total number of calculated fields
    pub formula_count: usize,
    /// Number of fields evaluated (cache misses) during the pass
    pub fields_calculated: usize,
    /// Number of calculated fields currently holding an error
    pub errors: usize,
    /// Number of cache entries dropped by the update that triggered the pass
    pub invalidated: usize,
}

/// The calculation engine
#[derive(Debug)]
pub struct CalculationEngine {
    options: EngineOptions,
    locale: &'static Locale,
    fields: Vec<Field>,
    /// Field name → position in `fields`
    index: AHashMap<String, usize>,
    dependency_graph: DependencyGraph,
    calculation_order: Vec<String>,
    values: ValueMap,
    /// Calculated field name → last computed value
    cache: AHashMap<String, f64>,
    /// Calculated field name → most recent recovered failure
    field_errors: AHashMap<String, FormulaError>,
    /// Fields being computed, to stop runaway recursion through undeclared references
    in_progress: AHashSet<String>,
    /// Fields re-entered while in progress
    reentered: AHashSet<String>,
    stats: CalculationStats,
}

impl CalculationEngine {
    /// Build an engine for a field set and compute every calculated field
    ///
    /// Fails if field names are duplicated or calculated fields form a cycle.
    pub fn new(fields: Vec<Field>, values: ValueMap) -> Result<Self> {
        Self::with_options(fields, values, EngineOptions::default())
    }

    /// Build an engine with custom options
    pub fn with_options(fields: Vec<Field>, values: ValueMap, options: EngineOptions) -> Result<Self> {
        let locale = get_locale(&options.locale).unwrap_or_else(|| {
            tracing::warn!(locale = %options.locale, "unknown locale, using pt-BR");
            &PT_BR
        });

        let (index, dependency_graph, calculation_order) =
            Self::build_structure(&fields, options.derive_dependencies)?;

        let mut engine = Self {
            options,
            locale,
            fields,
            index,
            dependency_graph,
            calculation_order,
            values,
            cache: AHashMap::new(),
            field_errors: AHashMap::new(),
            in_progress: AHashSet::new(),
            reentered: AHashSet::new(),
            stats: CalculationStats::default(),
        };
        engine.recalculate_all();
        Ok(engine)
    }

    /// Validate names, build the dependency graph and compute the calculation order
    fn build_structure(
        fields: &[Field],
        derive: bool,
    ) -> Result<(AHashMap<String, usize>, DependencyGraph, Vec<String>)> {
        check_field_names(fields)?;

        let index = fields
            .iter()
            .enumerate()
            .map(|(i, f)| (f.name.clone(), i))
            .collect();
        let graph = DependencyGraph::build(fields, derive);
        let order = graph.calculation_order().map_err(|e| {
            tracing::error!(error = %e, "cannot compute calculation order");
            e
        })?;

        tracing::debug!(
            fields = fields.len(),
            calculated = order.len(),
            "field set initialized"
        );
        Ok((index, graph, order))
    }

    /// Replace the field set, rebuilding the graph and order
    ///
    /// On error the engine keeps its previous field set. Values are kept;
    /// the cache is cleared and everything is recalculated.
    pub fn set_fields(&mut self, fields: Vec<Field>) -> Result<&ValueMap> {
        let (index, graph, order) = Self::build_structure(&fields, self.options.derive_dependencies)?;

        // Drop values of calculated fields that no longer exist
        for old in self.fields.iter().filter(|f| f.is_calculated()) {
            if !index.contains_key(&old.name) {
                self.values.remove(&old.name);
            }
        }

        let invalidated = self.cache.len();
        self.fields = fields;
        self.index = index;
        self.dependency_graph = graph;
        self.calculation_order = order;
        self.cache.clear();
        self.field_errors.clear();
        Ok(self.recalculate(invalidated))
    }

    // === Value updates ===

    /// Set a raw value and recalculate everything that depends on it
    pub fn update_value<V: Into<RawValue>>(&mut self, name: &str, value: V) -> &ValueMap {
        if !self.index.contains_key(name) {
            tracing::debug!(field = %name, "value set for a field outside the field set");
        }
        self.values.set(name, value);
        let invalidated = self.invalidate(name);
        self.recalculate(invalidated)
    }

    /// Drop the cached value of `name` and of every field that transitively depends on it
    ///
    /// Returns the number of cache entries removed.
    pub fn invalidate(&mut self, name: &str) -> usize {
        let mut removed = usize::from(self.cache.remove(name).is_some());
        let dependents = self.dependency_graph.transitive_dependents(name);
        for dependent in &dependents {
            if self.cache.remove(dependent).is_some() {
                removed += 1;
            }
        }
        tracing::debug!(field = %name, dependents = dependents.len(), removed, "cache invalidated");
        removed
    }

    /// Compute every calculated field missing from the cache, in calculation order
    ///
    /// Computed values are written into the value map so later fields read them.
    pub fn recalculate_all(&mut self) -> &ValueMap {
        self.recalculate(0)
    }

    /// Recalculation pass following the removal of `invalidated` cache entries
    fn recalculate(&mut self, invalidated: usize) -> &ValueMap {
        let mut calculated = 0;
        for i in 0..self.calculation_order.len() {
            let name = self.calculation_order[i].clone();
            if !self.cache.contains_key(&name) {
                self.resolve_calculated(&name);
                calculated += 1;
            }
        }

        self.stats.formula_count = self.calculation_order.len();
        self.stats.fields_calculated = calculated;
        self.stats.errors = self.field_errors.len();
        self.stats.invalidated = invalidated;
        &self.values
    }

    // === Reading values ===

    /// Value of a calculated field, computing it if it is not cached
    ///
    /// Returns `None` if `name` is not a calculated field.
    pub fn calculated_value(&mut self, name: &str) -> Option<f64> {
        if !self.field(name)?.is_calculated() {
            return None;
        }
        Some(self.resolve_calculated(name))
    }

    /// Cached value of a calculated field, without computing
    pub fn cached_value(&self, name: &str) -> Option<f64> {
        self.cache.get(name).copied()
    }

    /// Whether a calculated field currently has a cached value
    pub fn is_cached(&self, name: &str) -> bool {
        self.cache.contains_key(name)
    }

    /// Current working values (inputs and computed fields)
    pub fn values(&self) -> &ValueMap {
        &self.values
    }

    /// Numeric value of any field, `0` when absent
    pub fn value(&self, name: &str) -> f64 {
        self.values.get_number(name)
    }

    fn resolve_calculated(&mut self, name: &str) -> f64 {
        if let Some(&value) = self.cache.get(name) {
            return value;
        }

        if !self.in_progress.insert(name.to_string()) {
            tracing::warn!(field = %name, "circular reference through undeclared dependency, using 0");
            self.reentered.insert(name.to_string());
            return 0.0;
        }

        let value = self.compute(name);
        self.in_progress.remove(name);
        if self.reentered.remove(name) {
            self.field_errors.insert(
                name.to_string(),
                FormulaError::CircularDependency {
                    field: name.to_string(),
                },
            );
        }

        self.cache.insert(name.to_string(), value);
        self.values.set(name, value);
        value
    }

    /// Evaluate one calculated field's formula
    fn compute(&mut self, name: &str) -> f64 {
        let formula = match self.field(name) {
            Some(field) => field.formula_text().to_string(),
            None => return 0.0,
        };

        let mut resolved: AHashMap<String, f64> = AHashMap::new();
        for reference in extract_references(&formula) {
            if let Some(value) = self.resolve_reference(&reference) {
                resolved.insert(reference, value);
            }
        }

        let rewritten = rewrite_formula(&formula, |n| resolved.get(n).copied());
        let (value, error) = match try_evaluate(&rewritten.expression) {
            Ok(value) => (value, None),
            Err(e) => {
                tracing::warn!(
                    field = %name,
                    expression = %rewritten.expression,
                    error = %e,
                    "calculated field failed, using 0"
                );
                (0.0, Some(e))
            }
        };

        let error = error.or_else(|| {
            rewritten
                .unresolved
                .first()
                .map(|r| FormulaError::UnresolvedReference(r.clone()))
        });
        match error {
            Some(e) => {
                self.field_errors.insert(name.to_string(), e);
            }
            None => {
                self.field_errors.remove(name);
            }
        }

        tracing::trace!(field = %name, value, "calculated");
        value
    }

    fn resolve_reference(&mut self, name: &str) -> Option<f64> {
        let is_calculated = self.field(name)?.is_calculated();
        if is_calculated {
            Some(self.resolve_calculated(name))
        } else {
            Some(self.values.get_number(name))
        }
    }

    // === Introspection ===

    /// Field definition by name
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.index.get(name).map(|&i| &self.fields[i])
    }

    /// All field definitions
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Calculated fields in evaluation order
    pub fn calculation_order(&self) -> &[String] {
        &self.calculation_order
    }

    /// The dependency graph of the calculated fields
    pub fn dependency_graph(&self) -> &DependencyGraph {
        &self.dependency_graph
    }

    /// Fields a calculated field reads directly
    pub fn dependencies_of(&self, name: &str) -> &[String] {
        self.dependency_graph.get_precedents(name)
    }

    /// Calculated fields that read `name` directly or indirectly
    pub fn dependents_of(&self, name: &str) -> Vec<String> {
        self.dependency_graph.transitive_dependents(name)
    }

    /// Most recent recovered failure of a calculated field
    ///
    /// A field whose formula failed holds the value `0`; this tells that
    /// apart from a genuine zero.
    pub fn field_error(&self, name: &str) -> Option<&FormulaError> {
        self.field_errors.get(name)
    }

    /// All fields currently holding an error
    pub fn field_errors(&self) -> impl Iterator<Item = (&str, &FormulaError)> + '_ {
        self.field_errors.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Statistics from the most recent recalculation
    pub fn stats(&self) -> &CalculationStats {
        &self.stats
    }

    /// Engine options
    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Locale used for formatting
    pub fn locale(&self) -> &'static Locale {
        self.locale
    }

    // === Validation and formatting ===

    /// Check a formula against this engine's fields without changing any state
    pub fn validate_formula(&self, formula: &str) -> FormulaValidation {
        validate_formula(formula, &self.fields)
    }

    /// Format a value in the engine's locale
    pub fn format(&self, value: f64, spec: &FormatSpec) -> String {
        format_value_with_locale(value, spec, self.locale)
    }

    /// Format the current value of a calculated field with its own format spec
    pub fn format_field(&mut self, name: &str) -> Result<String> {
        let field = self
            .field(name)
            .ok_or_else(|| FieldError::FieldNotFound(name.to_string()))?;
        if !field.is_calculated() {
            return Err(FieldError::NotCalculated(name.to_string()).into());
        }
        let spec = field.format_spec.clone().unwrap_or_default();
        let value = self.resolve_calculated(name);
        Ok(self.format(value, &spec))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calcfield_core::FieldType;
    use pretty_assertions::assert_eq;

    fn chain() -> Vec<Field> {
        vec![
            Field::input("a", FieldType::Number),
            Field::calculated("b", "{a} * 2"),
            Field::calculated("c", "{b} + 1"),
        ]
    }

    #[test]
    fn test_initial_calculation() {
        let values: ValueMap = [("a", 2.0)].into_iter().collect();
        let engine = CalculationEngine::new(chain(), values).unwrap();

        assert_eq!(engine.cached_value("b"), Some(4.0));
        assert_eq!(engine.cached_value("c"), Some(5.0));
        assert_eq!(engine.value("c"), 5.0);
        assert_eq!(engine.calculation_order(), ["b".to_string(), "c".to_string()]);
        assert_eq!(engine.stats().fields_calculated, 2);
    }

    #[test]
    fn test_invalidate_is_transitive() {
        let values: ValueMap = [("a", 2.0)].into_iter().collect();
        let mut engine = CalculationEngine::new(chain(), values).unwrap();

        assert_eq!(engine.invalidate("a"), 2);
        assert!(!engine.is_cached("b"));
        assert!(!engine.is_cached("c"));

        engine.recalculate_all();
        assert!(engine.is_cached("b"));
        assert!(engine.is_cached("c"));
    }

    #[test]
    fn test_update_only_recomputes_affected_fields() {
        let fields = vec![
            Field::input("a", FieldType::Number),
            Field::input("x", FieldType::Number),
            Field::calculated("b", "{a} + 1"),
            Field::calculated("y", "{x} + 1"),
        ];
        let mut engine = CalculationEngine::new(fields, ValueMap::new()).unwrap();

        engine.update_value("a", 5.0);
        assert_eq!(engine.stats().invalidated, 1);
        assert_eq!(engine.stats().fields_calculated, 1);
        assert_eq!(engine.cached_value("b"), Some(6.0));
        assert_eq!(engine.cached_value("y"), Some(1.0));
    }

    #[test]
    fn test_invalidated_count_belongs_to_the_latest_pass() {
        let values: ValueMap = [("a", 2.0)].into_iter().collect();
        let mut engine = CalculationEngine::new(chain(), values).unwrap();
        assert_eq!(engine.stats().invalidated, 0);

        engine.update_value("a", 3.0);
        assert_eq!(engine.stats().invalidated, 2);

        engine.recalculate_all();
        assert_eq!(engine.stats().invalidated, 0);
        assert_eq!(engine.stats().fields_calculated, 0);

        engine.set_fields(chain()).unwrap();
        assert_eq!(engine.stats().invalidated, 2);
        assert_eq!(engine.stats().fields_calculated, 2);
    }

    #[test]
    fn test_calculated_value_of_input_is_none() {
        let mut engine = CalculationEngine::new(chain(), ValueMap::new()).unwrap();
        assert_eq!(engine.calculated_value("a"), None);
        assert_eq!(engine.calculated_value("missing"), None);
        assert_eq!(engine.calculated_value("b"), Some(0.0));
    }

    #[test]
    fn test_field_errors_are_recorded_and_cleared() {
        let fields = vec![
            Field::input("a", FieldType::Number),
            Field::input("b", FieldType::Number),
            Field::calculated("ratio", "{a} / {b}"),
        ];
        let values: ValueMap = [("a", 10.0), ("b", 0.0)].into_iter().collect();
        let mut engine = CalculationEngine::new(fields, values).unwrap();

        assert_eq!(engine.cached_value("ratio"), Some(0.0));
        assert!(matches!(
            engine.field_error("ratio"),
            Some(FormulaError::NonFiniteResult(_))
        ));
        assert_eq!(engine.stats().errors, 1);

        engine.update_value("b", 4.0);
        assert_eq!(engine.cached_value("ratio"), Some(2.5));
        assert_eq!(engine.field_error("ratio"), None);
        assert_eq!(engine.stats().errors, 0);
    }

    #[test]
    fn test_undeclared_cycle_does_not_recurse_forever() {
        let fields = vec![
            Field::calculated("x", "{y} + 1").with_dependencies(Vec::<String>::new()),
            Field::calculated("y", "{x} + 1"),
        ];
        let options = EngineOptions {
            derive_dependencies: false,
            ..Default::default()
        };
        let engine = CalculationEngine::with_options(fields, ValueMap::new(), options).unwrap();
        assert!(matches!(
            engine.field_error("x"),
            Some(FormulaError::CircularDependency { .. })
        ));
        assert_eq!(engine.cached_value("y"), Some(1.0));
        assert_eq!(engine.cached_value("x"), Some(2.0));
    }

    #[test]
    fn test_format_field() {
        let fields = vec![
            Field::input("a", FieldType::Number),
            Field::calculated("b", "{a} / 4").with_format(FormatSpec::currency()),
            Field::calculated("c", "{a} * 1000"),
        ];
        let values: ValueMap = [("a", 5.0)].into_iter().collect();
        let mut engine = CalculationEngine::new(fields, values).unwrap();

        assert_eq!(engine.format_field("b").unwrap(), "R$\u{a0}1,25");
        assert_eq!(engine.format_field("c").unwrap(), "5.000");
        assert!(engine.format_field("a").is_err());
        assert!(engine.format_field("zzz").is_err());
    }

    #[test]
    fn test_unknown_locale_falls_back() {
        let options = EngineOptions {
            locale: "tlh".into(),
            ..Default::default()
        };
        let engine = CalculationEngine::with_options(chain(), ValueMap::new(), options).unwrap();
        assert_eq!(engine.locale().id, "pt-BR");
    }
}
