//! Form field definitions

use crate::error::{Error, Result};
use crate::format_spec::FormatSpec;
use std::collections::HashSet;

/// The type of a form field as declared by the form editor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum FieldType {
    /// Free text
    #[default]
    Text,
    /// Plain number
    Number,
    /// Monetary amount
    Currency,
    /// Percentage
    Percentage,
    /// Date
    Date,
    /// Checkbox (true/false)
    Checkbox,
    /// Choice from a list
    Select,
    /// Value derived from a formula
    Calculated,
}

impl FieldType {
    /// Whether values of this type can be read by a formula
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            FieldType::Number | FieldType::Currency | FieldType::Percentage | FieldType::Calculated
        )
    }

    /// Get the type name for messages
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Number => "number",
            FieldType::Currency => "currency",
            FieldType::Percentage => "percentage",
            FieldType::Date => "date",
            FieldType::Checkbox => "checkbox",
            FieldType::Select => "select",
            FieldType::Calculated => "calculated",
        }
    }
}

/// Whether a field's value is supplied externally or derived from a formula
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// Value supplied by the user or host application
    Input,
    /// Value computed from a formula
    Calculated,
}

/// A form field definition
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct Field {
    /// Unique identifier, the only key formulas can reference
    pub name: String,
    /// Declared field type
    #[cfg_attr(feature = "serde", serde(rename = "type", default))]
    pub field_type: FieldType,
    /// Formula source (calculated fields only)
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub formula: Option<String>,
    /// Declared dependency set (calculated fields only)
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Vec::is_empty"))]
    pub dependencies: Vec<String>,
    /// Display configuration (calculated fields only)
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub format_spec: Option<FormatSpec>,
}

impl Field {
    /// Create an input field
    pub fn input<S: Into<String>>(name: S, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            ..Default::default()
        }
    }

    /// Create a calculated field with no declared dependencies
    ///
    /// The engine derives the dependency set from the formula text.
    pub fn calculated<S: Into<String>, F: Into<String>>(name: S, formula: F) -> Self {
        Self {
            name: name.into(),
            field_type: FieldType::Calculated,
            formula: Some(formula.into()),
            ..Default::default()
        }
    }

    /// Set the declared dependency set
    pub fn with_dependencies<I, S>(mut self, dependencies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies = dependencies.into_iter().map(Into::into).collect();
        self
    }

    /// Set the display configuration
    pub fn with_format(mut self, spec: FormatSpec) -> Self {
        self.format_spec = Some(spec);
        self
    }

    /// Input or calculated
    pub fn kind(&self) -> FieldKind {
        match self.field_type {
            FieldType::Calculated => FieldKind::Calculated,
            _ => FieldKind::Input,
        }
    }

    /// Check if this is a calculated field
    pub fn is_calculated(&self) -> bool {
        self.kind() == FieldKind::Calculated
    }

    /// Formula text, empty for input fields
    pub fn formula_text(&self) -> &str {
        self.formula.as_deref().unwrap_or("")
    }
}

/// Check a field set for empty, padded, brace-containing or duplicate names
///
/// References are trimmed inside their braces, so a name with leading or
/// trailing whitespace could never be referenced.
pub fn check_field_names(fields: &[Field]) -> Result<()> {
    let mut seen = HashSet::with_capacity(fields.len());
    for field in fields {
        let name = field.name.trim();
        if name.is_empty() || name.len() != field.name.len() || name.contains(['{', '}']) {
            return Err(Error::InvalidFieldName(field.name.clone()));
        }
        if !seen.insert(field.name.as_str()) {
            return Err(Error::DuplicateField(field.name.clone()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_kind() {
        assert_eq!(Field::input("a", FieldType::Number).kind(), FieldKind::Input);
        assert_eq!(Field::input("t", FieldType::Text).kind(), FieldKind::Input);
        assert_eq!(Field::calculated("b", "{a}*2").kind(), FieldKind::Calculated);
    }

    #[test]
    fn test_numeric_types() {
        assert!(FieldType::Number.is_numeric());
        assert!(FieldType::Currency.is_numeric());
        assert!(FieldType::Calculated.is_numeric());
        assert!(!FieldType::Text.is_numeric());
        assert!(!FieldType::Date.is_numeric());
    }

    #[test]
    fn test_check_field_names() {
        let fields = vec![
            Field::input("a", FieldType::Number),
            Field::calculated("b", "{a}"),
        ];
        assert!(check_field_names(&fields).is_ok());

        let dup = vec![
            Field::input("a", FieldType::Number),
            Field::input("a", FieldType::Text),
        ];
        assert_eq!(
            check_field_names(&dup),
            Err(Error::DuplicateField("a".into()))
        );

        let bad = vec![Field::input("{x}", FieldType::Number)];
        assert!(matches!(
            check_field_names(&bad),
            Err(Error::InvalidFieldName(_))
        ));
    }

    #[test]
    fn test_padded_field_names_are_rejected() {
        for name in [" a", "a ", " a ", "\tqty", "   "] {
            let fields = vec![Field::input(name, FieldType::Number)];
            assert_eq!(
                check_field_names(&fields),
                Err(Error::InvalidFieldName(name.into())),
                "{:?}",
                name
            );
        }

        let inner = vec![Field::input("unit price", FieldType::Number)];
        assert!(check_field_names(&inner).is_ok());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_field_json() {
        let json = r#"{
            "name": "total",
            "type": "calculated",
            "formula": "{qty} * {price}",
            "dependencies": ["qty", "price"],
            "formatSpec": { "formatType": "currency", "decimalPlaces": 2 }
        }"#;
        let field: Field = serde_json::from_str(json).unwrap();
        assert!(field.is_calculated());
        assert_eq!(field.dependencies, vec!["qty", "price"]);
        assert_eq!(field.format_spec.unwrap().decimal_places, Some(2));
    }
}
