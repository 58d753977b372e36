//! Field values

use std::collections::BTreeMap;
use std::fmt;

/// A raw field value as supplied by the host form
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum RawValue {
    /// Boolean value (checkboxes)
    Boolean(bool),

    /// Numeric value
    Number(f64),

    /// Text as typed by the user
    Text(String),

    /// No value
    #[default]
    Empty,
}

impl RawValue {
    /// Create a new text value
    pub fn text<S: Into<String>>(s: S) -> Self {
        RawValue::Text(s.into())
    }

    /// Check if the value is empty
    pub fn is_empty(&self) -> bool {
        match self {
            RawValue::Empty => true,
            RawValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Try to interpret the value as a finite number
    ///
    /// Text is trimmed and parsed as a decimal; a single `,` is accepted as
    /// the decimal separator when the text has no `.`.
    pub fn as_number(&self) -> Option<f64> {
        let n = match self {
            RawValue::Number(n) => *n,
            RawValue::Boolean(true) => 1.0,
            RawValue::Boolean(false) => 0.0,
            RawValue::Text(s) => parse_decimal(s)?,
            RawValue::Empty => return None,
        };
        n.is_finite().then_some(n)
    }

    /// Coerce to a number, defaulting to `0`
    pub fn to_number(&self) -> f64 {
        self.as_number().unwrap_or(0.0)
    }

    /// Get the type name for messages
    pub fn type_name(&self) -> &'static str {
        match self {
            RawValue::Boolean(_) => "boolean",
            RawValue::Number(_) => "number",
            RawValue::Text(_) => "text",
            RawValue::Empty => "empty",
        }
    }
}

fn parse_decimal(s: &str) -> Option<f64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(n) = s.parse::<f64>() {
        return Some(n);
    }
    if !s.contains('.') && s.matches(',').count() == 1 {
        return s.replace(',', ".").parse().ok();
    }
    None
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawValue::Boolean(b) => write!(f, "{}", b),
            RawValue::Number(n) => write!(f, "{}", n),
            RawValue::Text(s) => write!(f, "{}", s),
            RawValue::Empty => Ok(()),
        }
    }
}

impl From<bool> for RawValue {
    fn from(b: bool) -> Self {
        RawValue::Boolean(b)
    }
}

impl From<i32> for RawValue {
    fn from(n: i32) -> Self {
        RawValue::Number(n as f64)
    }
}

impl From<i64> for RawValue {
    fn from(n: i64) -> Self {
        RawValue::Number(n as f64)
    }
}

impl From<f64> for RawValue {
    fn from(n: f64) -> Self {
        RawValue::Number(n)
    }
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        RawValue::text(s)
    }
}

impl From<String> for RawValue {
    fn from(s: String) -> Self {
        RawValue::Text(s)
    }
}

impl<T: Into<RawValue>> From<Option<T>> for RawValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(RawValue::Empty, Into::into)
    }
}

/// Field name → raw value
///
/// Missing keys read as `0` through [`ValueMap::get_number`].
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct ValueMap {
    values: BTreeMap<String, RawValue>,
}

impl ValueMap {
    /// Create an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the raw value of a field
    pub fn get(&self, name: &str) -> Option<&RawValue> {
        self.values.get(name)
    }

    /// Get the numeric value of a field, `0` when absent or non-numeric
    pub fn get_number(&self, name: &str) -> f64 {
        self.values.get(name).map_or(0.0, RawValue::to_number)
    }

    /// Set the value of a field, returning the previous value
    pub fn set<S: Into<String>, V: Into<RawValue>>(&mut self, name: S, value: V) -> Option<RawValue> {
        self.values.insert(name.into(), value.into())
    }

    /// Remove a field's value
    pub fn remove(&mut self, name: &str) -> Option<RawValue> {
        self.values.remove(name)
    }

    /// Check if a field has a value
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Iterate over values in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &RawValue)> + '_ {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if the map is empty
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<S: Into<String>, V: Into<RawValue>> FromIterator<(S, V)> for ValueMap {
    fn from_iter<I: IntoIterator<Item = (S, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl<S: Into<String>, V: Into<RawValue>> Extend<(S, V)> for ValueMap {
    fn extend<I: IntoIterator<Item = (S, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.set(k, v);
        }
    }
}
