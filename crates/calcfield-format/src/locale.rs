//! Locale table for display formatting

/// Where the currency symbol goes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurrencyPosition {
    /// `R$ 10,00`, `$10.00`
    Before,
    /// `10,00 €`
    After,
}

/// Number and currency conventions of a locale
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Locale {
    pub id: &'static str,
    pub decimal_separator: char,
    pub thousands_separator: char,
    pub currency_symbol: &'static str,
    pub currency_position: CurrencyPosition,
    /// Separator between symbol and amount; `None` means adjacent
    pub currency_spacing: Option<char>,
    /// Fraction digits used for currency when no decimal places are set
    pub currency_decimals: u32,
}

/// Brazilian Portuguese, the default locale.
pub static PT_BR: Locale = Locale {
    id: "pt-BR",
    decimal_separator: ',',
    thousands_separator: '.',
    currency_symbol: "R$",
    currency_position: CurrencyPosition::Before,
    currency_spacing: Some('\u{a0}'),
    currency_decimals: 2,
};

pub static EN_US: Locale = Locale {
    id: "en-US",
    decimal_separator: '.',
    thousands_separator: ',',
    currency_symbol: "$",
    currency_position: CurrencyPosition::Before,
    currency_spacing: None,
    currency_decimals: 2,
};

pub static EN_GB: Locale = Locale {
    id: "en-GB",
    decimal_separator: '.',
    thousands_separator: ',',
    currency_symbol: "£",
    currency_position: CurrencyPosition::Before,
    currency_spacing: None,
    currency_decimals: 2,
};

pub static DE_DE: Locale = Locale {
    id: "de-DE",
    decimal_separator: ',',
    thousands_separator: '.',
    currency_symbol: "€",
    currency_position: CurrencyPosition::After,
    currency_spacing: Some('\u{a0}'),
    currency_decimals: 2,
};

/// French (France) groups with U+202F NARROW NO-BREAK SPACE.
pub static FR_FR: Locale = Locale {
    id: "fr-FR",
    decimal_separator: ',',
    thousands_separator: '\u{202f}',
    currency_symbol: "€",
    currency_position: CurrencyPosition::After,
    currency_spacing: Some('\u{a0}'),
    currency_decimals: 2,
};

pub static ES_ES: Locale = Locale {
    id: "es-ES",
    decimal_separator: ',',
    thousands_separator: '.',
    currency_symbol: "€",
    currency_position: CurrencyPosition::After,
    currency_spacing: Some('\u{a0}'),
    currency_decimals: 2,
};

static ALL: [&Locale; 6] = [&PT_BR, &EN_US, &EN_GB, &DE_DE, &FR_FR, &ES_ES];

impl Default for Locale {
    fn default() -> Self {
        PT_BR
    }
}

/// Look up a locale by tag
///
/// Accepts `pt-BR`, `pt_BR`, `pt-br`, `pt_BR.UTF-8` and bare languages
/// (`pt`, `en`, `de`, `fr`, `es`).
pub fn get_locale(id: &str) -> Option<&'static Locale> {
    let mut key = id.trim().replace('_', "-").to_ascii_lowercase();
    if let Some(idx) = key.find(['.', '@']) {
        key.truncate(idx);
    }
    if key.is_empty() {
        return None;
    }

    if let Some(locale) = ALL.iter().find(|l| l.id.to_ascii_lowercase() == key) {
        return Some(*locale);
    }

    // Fall back to the language part (`pt-PT` → pt-BR, `en-AU` → en-US)
    match key.split('-').next().unwrap_or("") {
        "pt" => Some(&PT_BR),
        "en" => Some(&EN_US),
        "de" => Some(&DE_DE),
        "fr" => Some(&FR_FR),
        "es" => Some(&ES_ES),
        _ => None,
    }
}
