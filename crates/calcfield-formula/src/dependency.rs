//! Dependency tracking and calculation order for calculated fields

use crate::error::{FormulaError, FormulaResult};
use crate::reference::extract_dependencies_with;
use ahash::{AHashMap, AHashSet};
use calcfield_core::Field;
use std::collections::VecDeque;

/// Dependency graph for calculated fields
///
/// Tracks which fields each calculated field reads (precedents) and which
/// fields read it (dependents), enabling targeted invalidation.
#[derive(Debug, Default, Clone)]
pub struct DependencyGraph {
    /// Calculated fields, in declaration order
    nodes: Vec<String>,
    /// Field → fields it reads, in formula order
    precedents: AHashMap<String, Vec<String>>,
    /// Field → fields that read it
    dependents: AHashMap<String, AHashSet<String>>,
}

/// DFS state of a field during ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VisitState {
    Visiting,
    Visited,
}

impl DependencyGraph {
    /// Create a new empty dependency graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the graph for a field set
    ///
    /// With `derive` set, each calculated field depends on its declared
    /// dependencies plus every reference found in its formula. Without it the
    /// declared set is used as-is and references it misses are logged.
    pub fn build(fields: &[Field], derive: bool) -> Self {
        let mut graph = Self::new();
        let names: AHashSet<&str> = fields.iter().map(|f| f.name.as_str()).collect();

        for field in fields.iter().filter(|f| f.is_calculated()) {
            graph.add_node(&field.name);

            let referenced = extract_dependencies_with(field.formula_text(), |n| names.contains(n));
            let mut deps: Vec<&str> = field.dependencies.iter().map(String::as_str).collect();
            for name in &referenced {
                if deps.contains(&name.as_str()) {
                    continue;
                }
                if derive {
                    tracing::debug!(field = %field.name, dependency = %name, "dependency derived from formula");
                    deps.push(name);
                } else {
                    tracing::warn!(
                        field = %field.name,
                        dependency = %name,
                        "formula references a field missing from its declared dependencies"
                    );
                }
            }

            for dep in deps {
                graph.add_dependency(dep, &field.name);
            }
        }

        tracing::debug!(nodes = graph.nodes.len(), "dependency graph built");
        graph
    }

    /// Register a calculated field
    pub fn add_node(&mut self, name: &str) {
        if !self.precedents.contains_key(name) {
            self.nodes.push(name.to_string());
            self.precedents.insert(name.to_string(), Vec::new());
        }
    }

    /// Add a dependency: dependent reads precedent
    pub fn add_dependency(&mut self, precedent: &str, dependent: &str) {
        self.add_node(dependent);
        let precs = self.precedents.entry(dependent.to_string()).or_default();
        if !precs.iter().any(|p| p == precedent) {
            precs.push(precedent.to_string());
        }
        self.dependents
            .entry(precedent.to_string())
            .or_default()
            .insert(dependent.to_string());
    }

    /// Whether `name` is a calculated field in this graph
    pub fn contains(&self, name: &str) -> bool {
        self.precedents.contains_key(name)
    }

    /// Calculated fields in declaration order
    pub fn nodes(&self) -> &[String] {
        &self.nodes
    }

    /// Number of calculated fields
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the graph has no calculated fields
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Fields that `name` reads directly
    pub fn get_precedents(&self, name: &str) -> &[String] {
        self.precedents.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Fields that read `name` directly
    pub fn get_dependents(&self, name: &str) -> impl Iterator<Item = &str> + '_ {
        self.dependents
            .get(name)
            .into_iter()
            .flat_map(|set| set.iter().map(String::as_str))
    }

    /// Every calculated field that reads `name` directly or indirectly
    ///
    /// Breadth-first, nearest dependents first; `name` itself is not included.
    pub fn transitive_dependents(&self, name: &str) -> Vec<String> {
        let mut result = Vec::new();
        let mut seen: AHashSet<&str> = AHashSet::new();
        let mut queue: VecDeque<&str> = VecDeque::new();
        seen.insert(name);
        queue.push_back(name);

        while let Some(current) = queue.pop_front() {
            let mut next: Vec<&str> = self.get_dependents(current).collect();
            next.sort_unstable();
            for dependent in next {
                if seen.insert(dependent) {
                    result.push(dependent.to_string());
                    queue.push_back(dependent);
                }
            }
        }

        result
    }

    /// Order calculated fields so each comes after every calculated field it reads
    ///
    /// Fails with [`FormulaError::CircularDependency`] naming the field at
    /// which the cycle was found; no partial order is returned.
    pub fn calculation_order(&self) -> FormulaResult<Vec<String>> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut state: AHashMap<&str, VisitState> = AHashMap::with_capacity(self.nodes.len());

        for node in &self.nodes {
            self.visit(node, &mut state, &mut order)?;
        }

        tracing::debug!(?order, "calculation order computed");
        Ok(order)
    }

    /// Topological sort helper (DFS)
    fn visit<'a>(
        &'a self,
        name: &'a str,
        state: &mut AHashMap<&'a str, VisitState>,
        order: &mut Vec<String>,
    ) -> FormulaResult<()> {
        match state.get(name) {
            Some(VisitState::Visited) => return Ok(()),
            Some(VisitState::Visiting) => {
                tracing::debug!(field = %name, "circular dependency");
                return Err(FormulaError::CircularDependency {
                    field: name.to_string(),
                });
            }
            None => {}
        }

        state.insert(name, VisitState::Visiting);

        // Input fields are leaves and never appear in the order
        for precedent in self.get_precedents(name) {
            if self.contains(precedent) {
                self.visit(precedent, state, order)?;
            }
        }

        state.insert(name, VisitState::Visited);
        order.push(name.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calcfield_core::FieldType;
    use pretty_assertions::assert_eq;

    fn position(order: &[String], name: &str) -> usize {
        order.iter().position(|n| n == name).unwrap()
    }

    #[test]
    fn test_add_dependency() {
        let mut graph = DependencyGraph::new();
        graph.add_dependency("a", "b");

        assert!(graph.get_dependents("a").any(|c| c == "b"));
        assert_eq!(graph.get_precedents("b"), ["a".to_string()]);
        assert!(graph.contains("b"));
        assert!(!graph.contains("a"));
    }

    #[test]
    fn test_build_derives_dependencies() {
        let fields = vec![
            Field::input("qty", FieldType::Number),
            Field::input("price", FieldType::Currency),
            Field::calculated("total", "{qty} * {price}").with_dependencies(["qty"]),
        ];
        let graph = DependencyGraph::build(&fields, true);
        assert_eq!(graph.get_precedents("total"), ["qty".to_string(), "price".to_string()]);

        let strict = DependencyGraph::build(&fields, false);
        assert_eq!(strict.get_precedents("total"), ["qty".to_string()]);
    }

    #[test]
    fn test_calculation_order_respects_dependencies() {
        // Declared out of order on purpose
        let fields = vec![
            Field::calculated("c", "{b} + 1"),
            Field::calculated("b", "{a} * 2"),
            Field::input("a", FieldType::Number),
            Field::calculated("d", "{c} + {b}"),
        ];
        let graph = DependencyGraph::build(&fields, true);
        let order = graph.calculation_order().unwrap();

        assert_eq!(order.len(), 3);
        assert!(position(&order, "b") < position(&order, "c"));
        assert!(position(&order, "c") < position(&order, "d"));
    }

    #[test]
    fn test_circular_reference() {
        let fields = vec![
            Field::calculated("x", "{y} + 1"),
            Field::calculated("y", "{x} + 1"),
        ];
        let graph = DependencyGraph::build(&fields, true);

        assert_eq!(
            graph.calculation_order(),
            Err(FormulaError::CircularDependency { field: "x".into() })
        );
    }

    #[test]
    fn test_self_reference_is_circular() {
        let fields = vec![Field::calculated("x", "{x} + 1")];
        let graph = DependencyGraph::build(&fields, true);
        assert!(graph.calculation_order().is_err());
    }

    #[test]
    fn test_transitive_dependents() {
        let mut graph = DependencyGraph::new();
        // a -> b -> c, a -> d
        graph.add_dependency("a", "b");
        graph.add_dependency("b", "c");
        graph.add_dependency("a", "d");
        graph.add_node("e");

        assert_eq!(graph.transitive_dependents("a"), vec!["b", "d", "c"]);
        assert_eq!(graph.transitive_dependents("c"), Vec::<String>::new());
    }

    #[test]
    fn test_field_named_like_a_function_is_an_edge() {
        let fields = vec![
            Field::input("pi", FieldType::Number),
            Field::input("radius", FieldType::Number),
            Field::calculated("max", "{pi} * {radius}"),
            Field::calculated("area", "{max} * {PI} + {e}"),
        ];
        let graph = DependencyGraph::build(&fields, true);

        assert_eq!(graph.get_precedents("max"), ["pi".to_string(), "radius".to_string()]);
        assert_eq!(graph.get_precedents("area"), ["max".to_string()]);
        assert_eq!(graph.transitive_dependents("pi"), vec!["max", "area"]);
        assert_eq!(graph.calculation_order().unwrap(), vec!["max", "area"]);
    }
}
