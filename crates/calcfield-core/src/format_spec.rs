//! Display configuration for calculated values

/// How a calculated value is rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum FormatType {
    /// Grouped decimal number (e.g. `1.234,5`)
    #[default]
    Number,
    /// Monetary amount in the locale's currency (e.g. `R$ 1.234,50`)
    Currency,
    /// Value times 100 with a `%` sign
    Percentage,
    /// User template with a `{value}` placeholder
    Custom,
}

/// Formatting configuration of a calculated field
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase", default))]
pub struct FormatSpec {
    /// Fixed number of fraction digits
    pub decimal_places: Option<u32>,
    /// Rendering style
    pub format_type: FormatType,
    /// Template for [`FormatType::Custom`]
    pub custom_format: Option<String>,
    /// Text placed before the rendered value
    pub prefix: Option<String>,
    /// Text placed after the rendered value
    pub suffix: Option<String>,
}

impl FormatSpec {
    /// Create a spec of the given type
    pub fn new(format_type: FormatType) -> Self {
        Self {
            format_type,
            ..Default::default()
        }
    }

    /// Grouped number
    pub fn number() -> Self {
        Self::new(FormatType::Number)
    }

    /// Currency
    pub fn currency() -> Self {
        Self::new(FormatType::Currency)
    }

    /// Percentage
    pub fn percentage() -> Self {
        Self::new(FormatType::Percentage)
    }

    /// Custom template containing `{value}`
    pub fn custom<S: Into<String>>(template: S) -> Self {
        Self {
            format_type: FormatType::Custom,
            custom_format: Some(template.into()),
            ..Default::default()
        }
    }

    /// Set the number of fraction digits
    pub fn decimals(mut self, places: u32) -> Self {
        self.decimal_places = Some(places);
        self
    }

    /// Set the prefix
    pub fn prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Set the suffix
    pub fn suffix<S: Into<String>>(mut self, suffix: S) -> Self {
        self.suffix = Some(suffix.into());
        self
    }
}
